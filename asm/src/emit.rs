//! Code emission.
//!
//! The encoder appends opcode and operand bytes to a growing code buffer
//! and records symbol references as it goes. The "small" flag is a single
//! bit shared by both value operands: it is set when either operand is
//! small, and the decoder applies it to both. A mixed small/large
//! immediate pair cannot be encoded.

use mvm64_isa::{opcode, Register};
use phf::phf_map;

use crate::classify::{signed_value, unsigned_value, OperandKind};
use crate::error::AsmError;
use crate::symbol::{SymbolTable, SYMBOL_NAME_SIZE};

/// Capacity of the output code buffer, in bytes.
pub const MAX_BYTES: usize = 4096;

/// How an instruction's mnemonic maps to the encoding.
pub struct InstructionDef {
    /// The base opcode.
    pub opcode: u8,
    /// Number of operand tokens the mnemonic takes in source.
    pub operands: usize,
    /// True if the instruction writes operand A, which must then be a
    /// register.
    pub register_dest: bool,
}

/// Instruction table, keyed by upper-cased mnemonic.
pub static INSTRUCTIONS: phf::Map<&'static str, InstructionDef> = phf_map! {
    "ADD" => InstructionDef { opcode: opcode::ADD, operands: 2, register_dest: true },
    "SUB" => InstructionDef { opcode: opcode::SUB, operands: 2, register_dest: true },
    "MUL" => InstructionDef { opcode: opcode::MUL, operands: 2, register_dest: true },
    "DIV" => InstructionDef { opcode: opcode::DIV, operands: 2, register_dest: true },
    "AND" => InstructionDef { opcode: opcode::AND, operands: 2, register_dest: true },
    "OR" => InstructionDef { opcode: opcode::OR, operands: 2, register_dest: true },
    "XOR" => InstructionDef { opcode: opcode::XOR, operands: 2, register_dest: true },
    "JMP" => InstructionDef { opcode: opcode::JMP, operands: 1, register_dest: false },
    "JZR" => InstructionDef { opcode: opcode::JZR, operands: 1, register_dest: false },
    "MOV" => InstructionDef { opcode: opcode::MOV, operands: 2, register_dest: true },
    "DREF" => InstructionDef { opcode: opcode::DREF, operands: 2, register_dest: true },
    "LADR" => InstructionDef { opcode: opcode::LADR, operands: 2, register_dest: true },
    "COMP" => InstructionDef { opcode: opcode::COMP, operands: 2, register_dest: true },
    "PUSH" => InstructionDef { opcode: opcode::PUSH, operands: 1, register_dest: false },
    "POP" => InstructionDef { opcode: opcode::POP, operands: 1, register_dest: true },
    "RET" => InstructionDef { opcode: opcode::RET, operands: 0, register_dest: false },
};

/// The data emplacement directive, for embedding constants in the code
/// stream.
pub const DATA: &str = "DATA";

/// Accumulates emitted code and symbol records for one assembly run.
pub struct Encoder {
    code: Vec<u8>,
    symbols: SymbolTable,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            code: Vec::new(),
            symbols: SymbolTable::new(),
        }
    }

    /// Current length of the emitted code, in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Defines a label at the current code offset.
    pub fn define_label(&mut self, name: &str, line: usize) -> Result<(), AsmError> {
        if name.len() > SYMBOL_NAME_SIZE {
            return Err(AsmError::SymbolNameTooLong {
                line,
                name: name.to_string(),
            });
        }
        self.symbols.define(name, self.code.len(), line)
    }

    /// Emits the opcode byte for an instruction with the given operand
    /// kinds: the value flags are set for non-register operands, and the
    /// shared small flag when either operand is small.
    pub fn emit_instruction(
        &mut self,
        def: &InstructionDef,
        kind_a: OperandKind,
        kind_b: OperandKind,
    ) {
        let mut byte = def.opcode;
        if kind_a.is_value() {
            byte |= opcode::VALA_FLAG;
        }
        if kind_b.is_value() {
            byte |= opcode::VALB_FLAG;
        }
        if kind_a.is_small() || kind_b.is_small() {
            byte |= opcode::SMALL_FLAG;
        }
        self.code.push(byte);
    }

    /// Emits one operand: a register-index byte, a 1-byte or 8-byte
    /// immediate, or an 8-byte zero placeholder with a recorded symbol
    /// reference.
    pub fn emit_operand(
        &mut self,
        base: u8,
        kind: OperandKind,
        token: &str,
        line: usize,
    ) -> Result<(), AsmError> {
        match kind {
            OperandKind::None => Err(AsmError::MissingOperand { line }),
            OperandKind::Invalid => Err(AsmError::InvalidOperand {
                line,
                token: token.to_string(),
            }),
            OperandKind::Register => {
                let register =
                    Register::from_name(token).ok_or_else(|| AsmError::InvalidOperand {
                        line,
                        token: token.to_string(),
                    })?;
                self.code.push(register.index());
                Ok(())
            }
            OperandKind::SmallUnsigned => {
                let value = self.unsigned_operand(token, line)?;
                self.code.push(value as u8);
                Ok(())
            }
            OperandKind::SmallSigned => {
                let value = self.signed_operand(token, line)?;
                self.code.push(value as i8 as u8);
                Ok(())
            }
            OperandKind::LargeUnsigned => {
                let value = self.unsigned_operand(token, line)?;
                self.code.extend_from_slice(&value.to_le_bytes());
                Ok(())
            }
            OperandKind::LargeSigned => {
                let value = self.signed_operand(token, line)?;
                self.code.extend_from_slice(&value.to_le_bytes());
                Ok(())
            }
            OperandKind::Symbol => {
                let name = &token[1..];
                if name.len() > SYMBOL_NAME_SIZE {
                    return Err(AsmError::SymbolNameTooLong {
                        line,
                        name: name.to_string(),
                    });
                }
                let is_jump = base == opcode::JMP || base == opcode::JZR;
                self.symbols
                    .add_reference(name, self.code.len(), is_jump, line)?;
                self.code.extend_from_slice(&[0u8; 8]);
                Ok(())
            }
        }
    }

    /// Emits a DATA literal directly into the code stream.
    pub fn emit_data(&mut self, kind: OperandKind, token: &str, line: usize) -> Result<(), AsmError> {
        match kind {
            OperandKind::SmallUnsigned
            | OperandKind::SmallSigned
            | OperandKind::LargeUnsigned
            | OperandKind::LargeSigned => self.emit_operand(0, kind, token, line),
            _ => Err(AsmError::DataNotLiteral {
                line,
                token: token.to_string(),
            }),
        }
    }

    /// Fails if the emitted code has exceeded the buffer capacity.
    pub fn check_capacity(&self, line: usize) -> Result<(), AsmError> {
        if self.code.len() > MAX_BYTES {
            return Err(AsmError::CodeBufferFull { line });
        }
        Ok(())
    }

    /// Resolves all symbol references and returns the finished code.
    pub fn finish(mut self) -> Result<Vec<u8>, AsmError> {
        self.symbols.resolve(&mut self.code)?;
        Ok(self.code)
    }

    /// Number of symbols recorded so far.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    fn unsigned_operand(&self, token: &str, line: usize) -> Result<u64, AsmError> {
        unsigned_value(token).ok_or_else(|| AsmError::InvalidOperand {
            line,
            token: token.to_string(),
        })
    }

    fn signed_operand(&self, token: &str, line: usize) -> Result<i64, AsmError> {
        signed_value(token).ok_or_else(|| AsmError::InvalidOperand {
            line,
            token: token.to_string(),
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
