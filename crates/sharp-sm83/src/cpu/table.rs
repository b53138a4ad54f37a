//! The two 256-entry dispatch tables and the rules they are built from.

use std::sync::OnceLock;

use emu_core::Bus;

use super::{Sm83, arith, bits, control, load, misc};
use crate::dispatch::{self, DispatchError, Fields, Rule};

pub(crate) type Handler = Box<dyn Fn(&mut Sm83, &mut dyn Bus, u16) + Send + Sync>;

/// One decoded opcode.
///
/// `mnemonic` is a template: `d8`, `d16`, `a8`, `a16`, `r8` and `e8` stand
/// for the immediate operand and are filled in by the disassembler.
pub(crate) struct Instruction {
    pub(crate) mnemonic: String,
    pub(crate) length: u8,
    /// Runs the instruction. Receives the address of its first byte.
    pub(crate) exec: Handler,
}

impl Instruction {
    pub(crate) fn new(
        mnemonic: impl Into<String>,
        length: u8,
        exec: impl Fn(&mut Sm83, &mut dyn Bus, u16) + Send + Sync + 'static,
    ) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            length,
            exec: Box::new(exec),
        }
    }
}

struct Tables {
    primary: Vec<Instruction>,
    prefixed: Vec<Instruction>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn tables() -> &'static Tables {
    TABLES.get_or_init(|| match build() {
        Ok(tables) => tables,
        Err(err) => panic!("SM83 dispatch tables failed to compile: {err}"),
    })
}

type Generator = Box<dyn Fn(&Fields) -> Instruction>;

/// One exact-match rule per hole in the primary table.
fn illegal_rules() -> Vec<(String, Generator)> {
    misc::ILLEGAL_OPCODES
        .iter()
        .map(|&opcode| {
            let generate: Generator = Box::new(move |_: &Fields| misc::illegal(opcode));
            (format!("{opcode:08b}"), generate)
        })
        .collect()
}

fn build() -> Result<Tables, DispatchError> {
    let holes = illegal_rules();
    let mut rules = primary_rules();
    rules.extend(
        holes
            .iter()
            .map(|(pattern, generate)| Rule::new(pattern, &**generate)),
    );
    let primary = dispatch::compile(256, &rules)?;

    let prefixed = dispatch::compile(
        256,
        &[
            Rule::new("00ooorrr", &bits::shift),
            Rule::new("01nnnrrr", &bits::bit),
            Rule::new("10nnnrrr", &bits::res),
            Rule::new("11nnnrrr", &bits::set),
        ],
    )?;

    Ok(Tables { primary, prefixed })
}

/// Rules for every defined primary opcode. The holes are left out.
fn primary_rules<'a>() -> Vec<Rule<'a, Instruction>> {
    vec![
        Rule::new("00000000", &misc::nop),
        Rule::new("00001000", &load::ld_a16_sp),
        Rule::new("00010000", &misc::stop),
        Rule::new("00011000", &control::jr),
        Rule::new("001cc000", &control::jr_cc),
        // bc, de, hl, sp
        Rule::new("00rr0001", &load::ld_rr_d16),
        Rule::new("00rr1001", &arith::add_hl_rr),
        Rule::new("00rr0011", &arith::inc_rr),
        Rule::new("00rr1011", &arith::dec_rr),
        // bc, de, hl+, hl-
        Rule::new("00rr0010", &load::ld_ind_a),
        Rule::new("00rr1010", &load::ld_a_ind),
        Rule::new("00rrr100", &arith::inc_r),
        Rule::new("00rrr101", &arith::dec_r),
        Rule::new("00rrr110", &load::ld_r_d8),
        Rule::new("000oo111", &arith::rotate_a),
        Rule::new("001oo111", &arith::adjust_a),
        Rule::new("01dddsss", &load::ld_r_r),
        // ld (hl), (hl) does not exist
        Rule::new("01110110", &misc::halt),
        Rule::new("10ooorrr", &arith::alu_r),
        Rule::new("110cc000", &control::ret_cc),
        Rule::new("110cc010", &control::jp_cc),
        Rule::new("110cc100", &control::call_cc),
        Rule::new("11000011", &control::jp),
        Rule::new("11001001", &control::ret),
        Rule::new("11011001", &control::reti),
        Rule::new("11001011", &misc::prefix),
        Rule::new("11001101", &control::call),
        // bc, de, hl, af
        Rule::new("11rr0001", &load::pop),
        Rule::new("11rr0101", &load::push),
        Rule::new("11ooo110", &arith::alu_d8),
        Rule::new("11nnn111", &control::rst),
        Rule::new("11100000", &load::ldh_a8_a),
        Rule::new("11110000", &load::ldh_a_a8),
        Rule::new("11100010", &load::ld_c_a),
        Rule::new("11110010", &load::ld_a_c),
        Rule::new("11101000", &arith::add_sp_e8),
        Rule::new("11111000", &load::ld_hl_sp_e8),
        Rule::new("11101001", &control::jp_hl),
        Rule::new("11111001", &load::ld_sp_hl),
        Rule::new("11101010", &load::ld_a16_a),
        Rule::new("11111010", &load::ld_a_a16),
        Rule::new("11110011", &misc::di),
        Rule::new("11111011", &misc::ei),
    ]
}

pub(crate) fn primary(opcode: u8) -> &'static Instruction {
    &tables().primary[usize::from(opcode)]
}

pub(crate) fn prefixed(opcode: u8) -> &'static Instruction {
    &tables().prefixed[usize::from(opcode)]
}

/// Compile both tables from scratch, reporting the first problem found.
///
/// The CPU builds its tables on first use and panics if this would fail.
/// Call this at start-up to surface the error as a value instead.
pub fn validate_tables() -> Result<(), DispatchError> {
    build().map(|_| ())
}

/// Mnemonic template of a primary opcode, e.g. `"ld a, d8"`.
#[must_use]
pub fn mnemonic(opcode: u8) -> &'static str {
    &primary(opcode).mnemonic
}

/// Mnemonic of a 0xCB-prefixed opcode, e.g. `"bit 7, h"`.
#[must_use]
pub fn prefixed_mnemonic(opcode: u8) -> &'static str {
    &prefixed(opcode).mnemonic
}

/// Length in bytes of the instruction starting with `opcode`.
#[must_use]
pub fn instruction_length(opcode: u8) -> u8 {
    primary(opcode).length
}

/// Disassemble the instruction at `address` without side effects.
///
/// Returns the text and the instruction length.
pub fn disassemble_at<B: Bus + ?Sized>(bus: &B, address: u16) -> (String, u8) {
    let opcode = bus.peek(address);
    (
        disassemble(bus, address, opcode),
        primary(opcode).length,
    )
}

pub(crate) fn disassemble<B: Bus + ?Sized>(bus: &B, pc: u16, opcode: u8) -> String {
    if opcode == 0xCB {
        return prefixed(bus.peek(pc.wrapping_add(1))).mnemonic.clone();
    }

    let template = primary(opcode).mnemonic.as_str();
    let byte = bus.peek(pc.wrapping_add(1));
    let word = u16::from_le_bytes([byte, bus.peek(pc.wrapping_add(2))]);
    let offset = byte as i8;
    let signed = if offset < 0 {
        format!("-${:02x}", offset.unsigned_abs())
    } else {
        format!("${offset:02x}")
    };

    if template.contains("d16") {
        template.replace("d16", &format!("${word:04x}"))
    } else if template.contains("a16") {
        template.replace("a16", &format!("${word:04x}"))
    } else if template.contains("d8") {
        template.replace("d8", &format!("${byte:02x}"))
    } else if template.contains("a8") {
        template.replace("a8", &format!("$ff{byte:02x}"))
    } else if template.contains("r8") {
        let target = pc.wrapping_add(2).wrapping_add_signed(i16::from(offset));
        template.replace("r8", &format!("${target:04x}"))
    } else if template.contains("+e8") {
        let sign = if offset < 0 { "" } else { "+" };
        template.replace("+e8", &format!("{sign}{signed}"))
    } else if template.contains("e8") {
        template.replace("e8", &signed)
    } else {
        template.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_primary(rules: &[Rule<'_, Instruction>]) -> Option<DispatchError> {
        dispatch::compile(256, rules).err()
    }

    #[test]
    fn primary_rules_leave_exactly_the_holes() {
        let rules = primary_rules();
        assert_eq!(compile_primary(&rules), Some(DispatchError::Unmapped(0xD3)));

        let holes = illegal_rules();
        let mut rules = primary_rules();
        rules.extend(holes.iter().map(|(pattern, generate)| Rule::new(pattern, &**generate)));
        assert_eq!(compile_primary(&rules), None);
    }

    #[test]
    fn dropped_rule_is_reported() {
        let holes = illegal_rules();
        let mut rules = primary_rules();
        rules.retain(|rule| rule.pattern != "11000011");
        rules.extend(holes.iter().map(|(pattern, generate)| Rule::new(pattern, &**generate)));
        assert_eq!(compile_primary(&rules), Some(DispatchError::Unmapped(0xC3)));
    }

    #[test]
    fn holes_decode_as_one_byte_illegal() {
        for opcode in misc::ILLEGAL_OPCODES {
            let entry = primary(opcode);
            assert_eq!(entry.mnemonic, format!("illegal ${opcode:02x}"));
            assert_eq!(entry.length, 1);
        }
    }
}
