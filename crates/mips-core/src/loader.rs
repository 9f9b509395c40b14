//! Textual machine-code program loader.
//!
//! Each line is `0xADDR:` followed by space-separated 8-bit binary groups;
//! every group becomes one byte placed at consecutive addresses starting at
//! `ADDR`. Loading stops at the first malformed line.

use crate::fault::Fault;

/// One byte placement produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Destination byte address.
    pub addr: u32,
    /// The byte value.
    pub byte: u8,
}

fn malformed(line: usize, reason: impl Into<String>) -> Fault {
    Fault::MalformedProgramText {
        line,
        reason: reason.into(),
    }
}

/// Parses program text into byte placements without touching any machine.
///
/// Blank lines are ignored. Parsing is all-or-nothing up to the first
/// malformed line, mirroring the loader's stop-on-error contract.
///
/// # Errors
///
/// Returns [`Fault::MalformedProgramText`] naming the first line that does
/// not parse as `0xADDR: <8-bit binary groups>`.
pub fn parse_program(source: &str) -> Result<Vec<Placement>, Fault> {
    let mut placements = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let (addr_part, bits_part) = line
            .split_once(':')
            .ok_or_else(|| malformed(number, "missing ':' after the address"))?;

        let addr_digits = addr_part
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| malformed(number, "address must start with 0x"))?;
        let mut addr = u32::from_str_radix(addr_digits, 16)
            .map_err(|_| malformed(number, format!("invalid hex address {addr_digits:?}")))?;

        for group in bits_part.split_whitespace() {
            if group.len() != 8 {
                return Err(malformed(
                    number,
                    format!("binary group {group:?} is not 8 bits"),
                ));
            }
            let byte = u8::from_str_radix(group, 2)
                .map_err(|_| malformed(number, format!("invalid binary group {group:?}")))?;
            placements.push(Placement { addr, byte });
            addr = addr.wrapping_add(1);
        }
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::{parse_program, Placement};
    use crate::fault::Fault;

    #[test]
    fn parses_addressed_binary_groups() {
        let source = "0x0: 00100000 00001001\n0x8: 11111111\n";
        let placements = parse_program(source).expect("valid program");
        assert_eq!(
            placements,
            vec![
                Placement { addr: 0, byte: 0b0010_0000 },
                Placement { addr: 1, byte: 0b0000_1001 },
                Placement { addr: 8, byte: 0xFF },
            ]
        );
    }

    #[test]
    fn blank_lines_are_ignored() {
        let source = "\n0x4: 00000001\n\n";
        let placements = parse_program(source).expect("valid program");
        assert_eq!(placements, vec![Placement { addr: 4, byte: 1 }]);
    }

    #[test]
    fn first_malformed_line_stops_the_load() {
        let source = "0x0: 00000001\nno colon here\n0x8: 00000010\n";
        let Err(Fault::MalformedProgramText { line, .. }) = parse_program(source) else {
            panic!("expected a malformed-line fault");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn rejects_bad_addresses_and_groups() {
        assert!(matches!(
            parse_program("4: 00000001"),
            Err(Fault::MalformedProgramText { line: 1, .. })
        ));
        assert!(matches!(
            parse_program("0xZZ: 00000001"),
            Err(Fault::MalformedProgramText { line: 1, .. })
        ));
        assert!(matches!(
            parse_program("0x0: 0000001"),
            Err(Fault::MalformedProgramText { line: 1, .. })
        ));
        assert!(matches!(
            parse_program("0x0: 00000021"),
            Err(Fault::MalformedProgramText { line: 1, .. })
        ));
    }
}
