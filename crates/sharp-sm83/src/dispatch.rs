//! Opcode dispatch tables compiled from bit-pattern rules.
//!
//! A rule is a pattern over `0`, `1` and field letters, most significant bit
//! first, plus a generator. `"01aaabbb"` matches every opcode whose top two
//! bits are `01` and hands the generator `a` (bits 5-3) and `b` (bits 2-0).
//! Every opcode a rule matches gets its own generated entry, and rules apply
//! in order, so a later, more specific rule replaces entries an earlier one
//! produced. That is how single-opcode exceptions such as HALT sitting in
//! the middle of the `LD r,r` block are expressed.

use std::fmt;

/// Decoded field values for one opcode.
///
/// A letter that appears more than once (contiguous or not) accumulates its
/// bits in pattern order, most significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: Vec<(char, usize)>,
}

impl Fields {
    /// Value of field `name`. Letters the pattern does not contain read as 0.
    #[must_use]
    pub fn get(&self, name: char) -> usize {
        self.values
            .iter()
            .find(|(letter, _)| *letter == name)
            .map_or(0, |&(_, value)| value)
    }

    fn push_bit(&mut self, name: char, bit: usize) {
        if let Some(entry) = self.values.iter_mut().find(|(letter, _)| *letter == name) {
            entry.1 = (entry.1 << 1) | bit;
        } else {
            self.values.push((name, bit));
        }
    }
}

/// A pattern and the generator that builds entries for its matches.
pub struct Rule<'a, T> {
    pub pattern: &'a str,
    pub generate: &'a dyn Fn(&Fields) -> T,
}

impl<'a, T> Rule<'a, T> {
    pub const fn new(pattern: &'a str, generate: &'a dyn Fn(&Fields) -> T) -> Self {
        Self { pattern, generate }
    }
}

/// Errors raised while compiling a dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Pattern contains something other than `0`, `1` or an ASCII letter.
    InvalidCharacter { pattern: String, found: char },
    /// Pattern addresses slots beyond the end of the table.
    TooWide { pattern: String, size: usize },
    /// No rule produced an entry for this slot.
    Unmapped(usize),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::InvalidCharacter { pattern, found } => {
                write!(f, "pattern \"{pattern}\" contains invalid character '{found}'")
            }
            DispatchError::TooWide { pattern, size } => {
                write!(f, "pattern \"{pattern}\" does not fit a table of {size} entries")
            }
            DispatchError::Unmapped(slot) => write!(f, "no rule covers slot {slot:#04X}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Compile `rules` into a table of `size` entries.
///
/// Fails if a pattern is malformed or any slot is left without an entry.
pub fn compile<T>(size: usize, rules: &[Rule<'_, T>]) -> Result<Vec<T>, DispatchError> {
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(size).collect();
    for rule in rules {
        expand(rule, size, &mut slots)?;
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(slot, entry)| entry.ok_or(DispatchError::Unmapped(slot)))
        .collect()
}

/// Apply one rule, writing an entry for every slot it matches.
///
/// Returns the number of entries generated.
pub fn expand<T>(
    rule: &Rule<'_, T>,
    size: usize,
    slots: &mut [Option<T>],
) -> Result<usize, DispatchError> {
    let bits: Vec<char> = rule.pattern.chars().collect();
    if let Some(&found) = bits
        .iter()
        .find(|&&c| c != '0' && c != '1' && !c.is_ascii_alphabetic())
    {
        return Err(DispatchError::InvalidCharacter {
            pattern: rule.pattern.to_string(),
            found,
        });
    }
    let too_wide = || DispatchError::TooWide {
        pattern: rule.pattern.to_string(),
        size,
    };
    let span = u32::try_from(bits.len())
        .ok()
        .and_then(|width| 1usize.checked_shl(width))
        .ok_or_else(too_wide)?;
    if span > size || span > slots.len() {
        return Err(too_wide());
    }

    let mut generated = 0;
    visit(&bits, 0, 0, &Fields::default(), &mut |slot: usize, fields: &Fields| {
        slots[slot] = Some((rule.generate)(fields));
        generated += 1;
    });
    Ok(generated)
}

fn visit(
    bits: &[char],
    position: usize,
    slot: usize,
    fields: &Fields,
    emit: &mut dyn FnMut(usize, &Fields),
) {
    let Some(&bit) = bits.get(position) else {
        emit(slot, fields);
        return;
    };
    match bit {
        '0' => visit(bits, position + 1, slot << 1, fields, emit),
        '1' => visit(bits, position + 1, (slot << 1) | 1, fields, emit),
        letter => {
            for value in 0..=1 {
                let mut next = fields.clone();
                next.push_bit(letter, value);
                visit(bits, position + 1, (slot << 1) | value, &next, emit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fields_decode_msb_first() {
        let calls = Cell::new(0);
        let sum = |f: &Fields| {
            calls.set(calls.get() + 1);
            f.get('a') + f.get('b')
        };
        let mut slots = vec![None; 256];
        let rule = Rule::new("aa01bb", &sum);
        assert_eq!(expand(&rule, 256, &mut slots), Ok(16));
        assert_eq!(calls.get(), 16);
        assert_eq!(slots[0x07], Some(3));
        assert_eq!(slots[0x37], Some(6));
        assert_eq!(slots[0x04], Some(0));
        assert_eq!(slots[0x08], None);
    }

    #[test]
    fn later_rules_override() {
        let sum = |f: &Fields| f.get('a') + f.get('b');
        let fixed = |_: &Fields| 9999_usize;
        let table = compile(16, &[Rule::new("aabb", &sum), Rule::new("1000", &fixed)]);
        let table = table.expect("both rules together cover 16 slots");
        assert_eq!(table[0x07], 4);
        assert_eq!(table[0x04], 1);
        assert_eq!(table[0x08], 9999);
    }

    #[test]
    fn repeated_letter_accumulates() {
        let value = |f: &Fields| f.get('x');
        let table = compile(4, &[Rule::new("x0", &value), Rule::new("x1", &value)]);
        assert_eq!(table, Ok(vec![0, 0, 1, 1]));

        let split = |f: &Fields| f.get('x');
        let table = compile(8, &[Rule::new("x1x", &split), Rule::new("x0x", &split)]);
        assert_eq!(table, Ok(vec![0, 1, 0, 1, 2, 3, 2, 3]));
    }

    #[test]
    fn gaps_are_reported() {
        let one = |_: &Fields| 1;
        assert_eq!(
            compile(256, &[Rule::new("0xxxxxxx", &one)]),
            Err(DispatchError::Unmapped(0x80))
        );
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        let one = |_: &Fields| 1;
        assert!(matches!(
            compile(256, &[Rule::new("01?xxxxx", &one)]),
            Err(DispatchError::InvalidCharacter { found: '?', .. })
        ));
        assert!(matches!(
            compile(256, &[Rule::new("xxxxxxxxx", &one)]),
            Err(DispatchError::TooWide { size: 256, .. })
        ));
    }
}
