//! The assembly driver.
//!
//! Walks the tokenized source line by line, encoding instructions and
//! recording symbol definitions and references, then runs the resolver
//! once at end of input to patch every reference site. All state for one
//! run lives in the [`Encoder`]; nothing is shared between runs.

use log::debug;

use crate::classify::{classify, OperandKind};
use crate::emit::{Encoder, DATA, INSTRUCTIONS};
use crate::error::AsmError;
use crate::lexer::{tokenize, SourceLine, TokenType};

/// Assembles source text into MVM64 bytecode.
///
/// Stops at the first error; no partial output is produced.
pub fn assemble(source: &str) -> Result<Vec<u8>, AsmError> {
    let lines = tokenize(source)?;

    let mut encoder = Encoder::new();
    for line in &lines {
        encode_line(&mut encoder, line)?;
        encoder.check_capacity(line.number)?;
    }

    debug!(
        "encoded {} bytes, {} symbols; resolving references",
        encoder.len(),
        encoder.symbol_count()
    );

    encoder.finish()
}

fn encode_line(encoder: &mut Encoder, line: &SourceLine) -> Result<(), AsmError> {
    let first = &line.tokens[0];
    match first.token_type {
        TokenType::LabelDef => {
            // A label stands alone on its line.
            if let Some(extra) = line.tokens.get(1) {
                return Err(AsmError::UnexpectedToken {
                    line: line.number,
                    text: extra.text.clone(),
                });
            }
            let name = first.text.strip_suffix(':').unwrap_or(&first.text);
            encoder.define_label(name, line.number)
        }
        TokenType::SymbolRef => Err(AsmError::InvalidCommand {
            line: line.number,
            mnemonic: first.text.clone(),
        }),
        TokenType::Word => {
            let mnemonic = first.text.to_ascii_uppercase();
            if mnemonic == DATA {
                return encode_data(encoder, line);
            }

            let def =
                INSTRUCTIONS
                    .get(mnemonic.as_str())
                    .ok_or_else(|| AsmError::InvalidCommand {
                        line: line.number,
                        mnemonic: first.text.clone(),
                    })?;

            let operands = &line.tokens[1..];
            if operands.len() != def.operands {
                return Err(AsmError::WrongOperandCount {
                    line: line.number,
                    mnemonic,
                    expected: def.operands,
                    found: operands.len(),
                });
            }

            let kind_a = operands.first().map_or(OperandKind::None, |t| classify(&t.text));
            let kind_b = operands.get(1).map_or(OperandKind::None, |t| classify(&t.text));

            for (token, kind) in operands.iter().zip([kind_a, kind_b]) {
                if kind == OperandKind::Invalid {
                    return Err(AsmError::InvalidOperand {
                        line: line.number,
                        token: token.text.clone(),
                    });
                }
            }

            if def.register_dest && def.operands > 0 && kind_a != OperandKind::Register {
                return Err(AsmError::RegisterRequired {
                    line: line.number,
                    mnemonic,
                    token: operands[0].text.clone(),
                });
            }

            encoder.emit_instruction(def, kind_a, kind_b);
            if let Some(token) = operands.first() {
                encoder.emit_operand(def.opcode, kind_a, &token.text, line.number)?;
            }
            if let Some(token) = operands.get(1) {
                encoder.emit_operand(def.opcode, kind_b, &token.text, line.number)?;
            }
            Ok(())
        }
        TokenType::Newline => unreachable!("newlines are not stored in source lines"),
    }
}

fn encode_data(encoder: &mut Encoder, line: &SourceLine) -> Result<(), AsmError> {
    if line.tokens.len() != 2 {
        return Err(AsmError::WrongOperandCount {
            line: line.number,
            mnemonic: DATA.to_string(),
            expected: 1,
            found: line.tokens.len() - 1,
        });
    }
    let token = &line.tokens[1];
    encoder.emit_data(classify(&token.text), &token.text, line.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvm64_isa::opcode::{ADD, JMP, JZR, MOV, PUSH, RET, SMALL_FLAG, VALA_FLAG, VALB_FLAG};

    #[test]
    fn assemble_when_steel_thread_then_exact_bytes() {
        let source = "\
; load, add, move to return register
MOV A, 0x14
ADD A, 300
MOV R, A
RET
";
        let code = assemble(source).unwrap();

        #[rustfmt::skip]
        assert_eq!(code, vec![
            MOV | VALB_FLAG | SMALL_FLAG, 0, 0x14,
            ADD | VALB_FLAG, 0, 0x2C, 0x01, 0, 0, 0, 0, 0, 0,
            MOV, 8, 0,
            RET,
        ]);
    }

    #[test]
    fn assemble_when_mnemonic_lower_case_then_accepted() {
        let code = assemble("mov R, A\nret").unwrap();

        assert_eq!(code, vec![MOV, 8, 0, RET]);
    }

    #[test]
    fn assemble_when_forward_jump_reference_then_displacement_patched() {
        let source = "\
JMP @END
DATA 0x1122334455667788
END:
RET
";
        let code = assemble(source).unwrap();

        // JMP opcode + 8-byte operand, then 8 data bytes, then RET.
        assert_eq!(code.len(), 18);
        assert_eq!(code[0], JMP | VALA_FLAG);
        let displacement = i64::from_le_bytes(code[1..9].try_into().unwrap());
        let reference_offset = 1i64;
        let label_offset = 17i64;
        assert_eq!(displacement + reference_offset, label_offset);
    }

    #[test]
    fn assemble_when_backward_jump_reference_then_negative_displacement() {
        let source = "\
TOP:
JZR @TOP
RET
";
        let code = assemble(source).unwrap();

        assert_eq!(code[0], JZR | VALA_FLAG);
        let displacement = i64::from_le_bytes(code[1..9].try_into().unwrap());
        assert_eq!(displacement, -1);
    }

    #[test]
    fn assemble_when_value_symbol_reference_then_bytes_at_definition_copied() {
        // A non-jump reference copies the 8 bytes stored at the symbol's
        // defining offset into the reference site.
        let source = "\
MOV A, @CONST
RET
CONST:
DATA 0x1122334455667788
";
        let code = assemble(source).unwrap();

        let patched = u64::from_le_bytes(code[2..10].try_into().unwrap());
        assert_eq!(patched, 0x1122334455667788);
    }

    #[test]
    fn assemble_when_push_then_one_operand_field_emitted() {
        let code = assemble("PUSH A\nRET").unwrap();

        assert_eq!(code, vec![PUSH, 0, RET]);
    }

    #[test]
    fn assemble_when_data_small_literal_then_single_byte() {
        let code = assemble("DATA 5\nRET").unwrap();

        assert_eq!(code, vec![5, RET]);
    }

    #[test]
    fn assemble_when_undefined_mnemonic_then_not_a_valid_command() {
        let result = assemble("DATA 5\nHALT");

        let err = result.unwrap_err();
        assert_eq!(
            err,
            AsmError::InvalidCommand {
                line: 2,
                mnemonic: String::from("HALT"),
            }
        );
        assert!(err.to_string().contains("not a valid command"));
    }

    #[test]
    fn assemble_when_wrong_operand_count_then_error() {
        let result = assemble("MOV A");

        assert_eq!(
            result.unwrap_err(),
            AsmError::WrongOperandCount {
                line: 1,
                mnemonic: String::from("MOV"),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn assemble_when_value_destination_then_register_required() {
        let result = assemble("ADD 5, A");

        assert!(matches!(
            result.unwrap_err(),
            AsmError::RegisterRequired { line: 1, .. }
        ));
    }

    #[test]
    fn assemble_when_operand_invalid_then_error() {
        let result = assemble("MOV A, bogus");

        assert_eq!(
            result.unwrap_err(),
            AsmError::InvalidOperand {
                line: 1,
                token: String::from("bogus"),
            }
        );
    }

    #[test]
    fn assemble_when_data_operand_is_register_then_error() {
        let result = assemble("DATA A");

        assert!(matches!(
            result.unwrap_err(),
            AsmError::DataNotLiteral { line: 1, .. }
        ));
    }

    #[test]
    fn assemble_when_label_redefined_then_error() {
        let result = assemble("LOOP:\nRET\nLOOP:");

        assert_eq!(
            result.unwrap_err(),
            AsmError::SymbolRedefined {
                line: 3,
                name: String::from("LOOP"),
                first_defined: 1,
            }
        );
    }

    #[test]
    fn assemble_when_symbol_never_defined_then_unresolved_at_end() {
        // Every line parses; the failure only surfaces at resolution.
        let result = assemble("JMP @NOWHERE\nRET");

        assert_eq!(
            result.unwrap_err(),
            AsmError::UnresolvedSymbol {
                name: String::from("NOWHERE"),
                line_referenced: 1,
            }
        );
    }

    #[test]
    fn assemble_when_label_defined_but_unreferenced_then_ok() {
        let code = assemble("SPARE:\nRET").unwrap();

        assert_eq!(code, vec![RET]);
    }

    #[test]
    fn assemble_when_label_followed_by_tokens_then_error() {
        let result = assemble("LOOP: RET");

        assert!(matches!(
            result.unwrap_err(),
            AsmError::UnexpectedToken { line: 1, .. }
        ));
    }

    #[test]
    fn assemble_when_register_operand_case_differs_then_invalid() {
        // Register names are never case-adjusted; 'a' is not an operand.
        let result = assemble("MOV a, B");

        assert_eq!(
            result.unwrap_err(),
            AsmError::InvalidOperand {
                line: 1,
                token: String::from("a"),
            }
        );
    }

    #[test]
    fn assemble_when_too_many_symbols_then_table_full() {
        let mut source = String::new();
        for i in 0..=128 {
            source.push_str(&format!("LBL{i}:\nDATA 1\n"));
        }
        source.push_str("RET\n");

        let result = assemble(&source);

        assert!(matches!(
            result.unwrap_err(),
            AsmError::SymbolTableFull { .. }
        ));
    }

    #[test]
    fn assemble_when_too_many_references_then_list_full() {
        let mut source = String::from("TOP:\n");
        for _ in 0..33 {
            source.push_str("JMP @TOP\n");
        }

        let result = assemble(&source);

        assert!(matches!(
            result.unwrap_err(),
            AsmError::ReferenceListFull { .. }
        ));
    }

    #[test]
    fn assemble_when_output_exceeds_capacity_then_buffer_full() {
        let mut source = String::new();
        for _ in 0..513 {
            source.push_str("DATA 0x1122334455667788\n");
        }

        let result = assemble(&source);

        assert!(matches!(result.unwrap_err(), AsmError::CodeBufferFull { .. }));
    }

    #[test]
    fn assemble_when_symbol_name_too_long_then_error() {
        let name = "A".repeat(33);
        let result = assemble(&format!("{name}:\nRET"));

        assert!(matches!(
            result.unwrap_err(),
            AsmError::SymbolNameTooLong { line: 1, .. }
        ));
    }

    #[test]
    fn assemble_when_empty_source_then_empty_output() {
        assert!(assemble("; nothing but comments\n\n").unwrap().is_empty());
    }
}
