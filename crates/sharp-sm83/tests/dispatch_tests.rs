//! Opcode table construction and disassembly.

use emu_core::SimpleBus;
use sharp_sm83::dispatch::{DispatchError, Fields, Rule, compile};
use sharp_sm83::{disassemble_at, instruction_length, mnemonic, prefixed_mnemonic, validate_tables};

#[test]
fn test_tables_compile_completely() {
    assert_eq!(validate_tables(), Ok(()));
    for opcode in 0..=0xFFu8 {
        assert!(!mnemonic(opcode).is_empty(), "{opcode:02X}");
        assert!(!prefixed_mnemonic(opcode).is_empty(), "CB {opcode:02X}");
    }
}

#[test]
fn test_halt_overrides_ld_block() {
    assert_eq!(mnemonic(0x76), "halt");
    assert_eq!(mnemonic(0x75), "ld (hl), l");
    assert_eq!(mnemonic(0x77), "ld (hl), a");
    assert_eq!(mnemonic(0x40), "ld b, b");
    assert_eq!(mnemonic(0x7E), "ld a, (hl)");
}

#[test]
fn test_primary_mnemonics() {
    assert_eq!(mnemonic(0x00), "nop");
    assert_eq!(mnemonic(0x22), "ld (hl+), a");
    assert_eq!(mnemonic(0x3A), "ld a, (hl-)");
    assert_eq!(mnemonic(0x07), "rlca");
    assert_eq!(mnemonic(0x1F), "rra");
    assert_eq!(mnemonic(0x27), "daa");
    assert_eq!(mnemonic(0x3F), "ccf");
    assert_eq!(mnemonic(0x96), "sub (hl)");
    assert_eq!(mnemonic(0x8F), "adc a, a");
    assert_eq!(mnemonic(0xFE), "cp d8");
    assert_eq!(mnemonic(0xC0), "ret nz");
    assert_eq!(mnemonic(0xDA), "jp c, a16");
    assert_eq!(mnemonic(0xF5), "push af");
    assert_eq!(mnemonic(0xFF), "rst $38");
    assert_eq!(mnemonic(0xD9), "reti");
    assert_eq!(mnemonic(0xCB), "prefix cb");
}

#[test]
fn test_unused_opcodes_are_marked() {
    for opcode in [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD] {
        assert_eq!(mnemonic(opcode), format!("illegal ${opcode:02x}"));
        assert_eq!(instruction_length(opcode), 1);
    }
}

#[test]
fn test_prefixed_mnemonics() {
    assert_eq!(prefixed_mnemonic(0x00), "rlc b");
    assert_eq!(prefixed_mnemonic(0x37), "swap a");
    assert_eq!(prefixed_mnemonic(0x7C), "bit 7, h");
    assert_eq!(prefixed_mnemonic(0x86), "res 0, (hl)");
    assert_eq!(prefixed_mnemonic(0xFF), "set 7, a");
}

#[test]
fn test_instruction_lengths() {
    assert_eq!(instruction_length(0x00), 1);
    assert_eq!(instruction_length(0x01), 3);
    assert_eq!(instruction_length(0x10), 2);
    assert_eq!(instruction_length(0x18), 2);
    assert_eq!(instruction_length(0xCB), 2);
    assert_eq!(instruction_length(0xE0), 2);
    assert_eq!(instruction_length(0xEA), 3);
}

#[test]
fn test_disassemble_immediates() {
    let mut bus = SimpleBus::new();
    bus.load(
        0x0200,
        &[
            0x06, 0x12,       // LD B, $12
            0x21, 0x34, 0x12, // LD HL, $1234
            0xE0, 0x44,       // LDH ($FF44), A
            0x20, 0xFE,       // JR NZ, -2
            0xF8, 0xFD,       // LD HL, SP-3
            0xE8, 0x05,       // ADD SP, 5
            0xCB, 0x11,       // RL C
        ],
    );

    let expected = [
        ("ld b, $12", 2),
        ("ld hl, $1234", 3),
        ("ldh ($ff44), a", 2),
        ("jr nz, $0207", 2),
        ("ld hl, sp-$03", 2),
        ("add sp, $05", 2),
        ("rl c", 2),
    ];
    let mut addr = 0x0200u16;
    for (text, len) in expected {
        assert_eq!(disassemble_at(&bus, addr), (text.to_string(), len), "${addr:04x}");
        addr += u16::from(len);
    }
}

#[test]
fn test_compile_reports_gaps() {
    let nop = |_: &Fields| 0u8;
    let table = compile(256, &[Rule::new("00xxxxxx", &nop), Rule::new("01xxxxxx", &nop)]);
    assert_eq!(table, Err(DispatchError::Unmapped(0x80)));
    assert_eq!(
        DispatchError::Unmapped(0x80).to_string(),
        "no rule covers slot 0x80"
    );
}
