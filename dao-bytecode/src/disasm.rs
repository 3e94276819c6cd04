//! Program listings

use crate::core::{Opcode, Program};

fn class(op: Opcode) -> &'static str {
    if op.is_io() {
        "io"
    } else if op.is_control_flow() {
        "flow"
    } else if op.is_floor_move() {
        "floor"
    } else if op == Opcode::IDLES {
        ""
    } else {
        "data"
    }
}

/// One line per nybble: position, raw value, symbol, mnemonic and class.
pub fn disassemble(program: &Program) -> String {
    program
        .opcodes()
        .enumerate()
        .map(|(pos, op)| {
            let line = format!(
                "{:05x}  {:x}  {}  {:<5}  {}",
                pos,
                op.nybble(),
                op.symbol(),
                op.mnemonic(),
                class(op)
            );
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render a program back to canonical symbols, `width` symbols per line.
pub fn to_symbols(program: &Program, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(program.len() + program.len() / width);
    for (i, op) in program.opcodes().enumerate() {
        if i > 0 && i % width == 0 {
            out.push('\n');
        }
        out.push(op.symbol());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;

    #[test]
    fn test_disassemble_lists_each_nybble() {
        let listing = disassemble(&encode("#:]"));
        let lines: Vec<_> = listing.lines().map(str::trim_end).collect();
        assert_eq!(
            lines,
            vec![
                "00000  5  #  EXECS  flow",
                "00001  a  :  READS  io",
                "00002  3  )  MERGE  floor",
            ]
        );
    }

    #[test]
    fn test_disassemble_has_no_trailing_whitespace() {
        let listing = disassemble(&encode(".:."));
        assert_eq!(
            listing,
            "00000  0  .  IDLES\n00001  a  :  READS  io\n00002  0  .  IDLES"
        );
        assert_eq!(disassemble(&encode("")), "");
    }

    #[test]
    fn test_to_symbols_uses_canonical_aliases() {
        assert_eq!(to_symbols(&encode("]]]"), 2), "))\n)");
    }
}
