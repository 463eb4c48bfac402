//! Disassembler for MVM64 bytecode.
//!
//! Walks a code buffer with the shared decode rules and renders one
//! instruction per line: offset, mnemonic, and decoded operands. The
//! decoder cannot tell embedded data from instructions, so a buffer with
//! inline DATA constants may desynchronize; bytes too short to decode at
//! the end of the buffer are rendered raw.

use std::fmt::Write;

use mvm64_isa::{opcode, Register};

/// Renders a bytecode buffer as an instruction listing.
pub fn disassemble(code: &[u8]) -> String {
    let mut out = String::new();
    let mut pc = 0usize;

    while pc < code.len() {
        let ins = code[pc];
        let base = opcode::base(ins);

        if base == opcode::RET {
            let _ = writeln!(out, "{pc:04x}: RET");
            pc += 1;
            continue;
        }

        let small = opcode::small_values(ins);
        let a_width = operand_width(opcode::a_is_value(ins), small);
        let b_width = operand_width(opcode::b_is_value(ins), small);

        if pc + 1 + a_width + b_width > code.len() {
            // Not enough bytes left for the operand fields.
            let _ = write!(out, "{pc:04x}: DATA");
            for byte in &code[pc..] {
                let _ = write!(out, " 0x{byte:02x}");
            }
            let _ = writeln!(out);
            break;
        }

        let a = operand_str(code, pc + 1, opcode::a_is_value(ins), small);
        let b = operand_str(code, pc + 1 + a_width, opcode::b_is_value(ins), small);
        let mnemonic = opcode::mnemonic(base).unwrap_or("???");
        let _ = writeln!(out, "{pc:04x}: {mnemonic} {a}, {b}");

        pc += 1 + a_width + b_width;
    }

    out
}

fn operand_width(is_value: bool, small: bool) -> usize {
    if is_value && !small {
        8
    } else {
        1
    }
}

fn operand_str(code: &[u8], offset: usize, is_value: bool, small: bool) -> String {
    if is_value {
        if small {
            format!("0x{:02x}", code[offset])
        } else {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&code[offset..offset + 8]);
            format!("0x{:x}", u64::from_le_bytes(bytes))
        }
    } else {
        match Register::from_index(code[offset]) {
            Some(register) => register.name().to_string(),
            None => format!("r{}?", code[offset]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;

    #[test]
    fn disassemble_when_steel_thread_then_listing_matches() {
        let code = assemble("MOV A, 0x14\nADD A, 300\nMOV R, A\nRET").unwrap();

        let listing = disassemble(&code);

        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0000: MOV A, 0x14",
                "0003: ADD A, 0x12c",
                "000d: MOV R, A",
                "0010: RET",
            ]
        );
    }

    #[test]
    fn disassemble_when_truncated_operands_then_rendered_raw() {
        // An opcode byte with no room left for its operands.
        let listing = disassemble(&[mvm64_isa::opcode::MOV, 0]);

        assert_eq!(listing, "0000: DATA 0x09 0x00\n");
    }

    #[test]
    fn disassemble_when_unknown_register_index_then_marked() {
        let listing = disassemble(&[mvm64_isa::opcode::MOV, 0, 13]);

        assert_eq!(listing, "0000: MOV A, r13?\n");
    }

    #[test]
    fn disassemble_when_empty_then_empty() {
        assert!(disassemble(&[]).is_empty());
    }
}
