//! Instruction decode and dispatch.
//!
//! The engine trusts its input completely: no bounds checking on jump
//! targets or addresses, no validation of register indices before use.
//! The only checked conditions are the two stack assertions and the
//! opcode dispatch itself. Feeding the engine anything other than
//! well-formed bytecode is a caller error and panics.

use log::debug;
use mvm64_isa::{opcode, Register, STACK_SIZE};

use crate::context::Context;
use crate::error::Trap;
use crate::memory::{self, CODE_BASE};
use crate::value::Slot;

/// The result of decoding and executing one instruction.
#[derive(Debug, PartialEq, Eq)]
pub enum StepResult {
    /// The instruction consumed this many bytes. The instruction pointer
    /// has already been updated (advanced, or redirected by a jump).
    Advance(u64),
    /// The instruction was RET; execution is complete.
    Halt,
    /// The opcode byte did not decode to a known instruction.
    Fault(u8),
}

/// A successful run.
#[derive(Debug, PartialEq, Eq)]
pub struct Halted {
    /// Total bytes executed, including the final RET opcode byte.
    pub bytes_executed: u64,
    /// The value of register R at the RET.
    pub return_value: Slot,
}

/// A decoded operand location.
///
/// Large immediates are read in place from the code buffer; small
/// immediates are widened into a transient copy. A register index is
/// kept raw and only validated when the operand is actually accessed,
/// so an instruction that never touches an operand (JMP ignores B)
/// tolerates garbage in that field.
#[derive(Clone, Copy, Debug)]
enum Operand {
    Register(u8),
    Small(u8),
    Code(usize),
}

impl Operand {
    fn load(self, ctx: &Context, code: &[u8]) -> Slot {
        match self {
            Operand::Register(index) => ctx.register(index),
            Operand::Small(byte) => Slot::from_u64(u64::from(byte)),
            Operand::Code(offset) => memory::read_code_u64(code, offset),
        }
    }

    fn store(self, ctx: &mut Context, value: Slot) {
        match self {
            Operand::Register(index) => ctx.set_register(index, value),
            // A small immediate is a transient copy; the write is discarded.
            Operand::Small(_) => {}
            Operand::Code(offset) => {
                panic!("write to immediate operand at code offset {offset}")
            }
        }
    }

    /// The guest address of this operand's storage (LADR).
    fn address(self) -> u64 {
        match self {
            Operand::Register(index) => {
                let register = Register::from_index(index)
                    .unwrap_or_else(|| panic!("register index out of range: {index}"));
                memory::register_address(register)
            }
            Operand::Small(_) => panic!("a small immediate has no address"),
            Operand::Code(offset) => memory::code_address(offset),
        }
    }
}

fn decode_operand(code: &[u8], addr: u64, is_value: bool, small: bool) -> (Operand, u64) {
    let offset = memory::code_offset(addr);
    if is_value {
        if small {
            (Operand::Small(code[offset]), 1)
        } else {
            (Operand::Code(offset), 8)
        }
    } else {
        (Operand::Register(code[offset]), 1)
    }
}

/// Decodes and executes exactly one instruction.
///
/// Every instruction except RET decodes two operand fields; an
/// instruction that uses only operand A still consumes operand B's
/// encoded width when it advances.
pub fn step(ctx: &mut Context, code: &[u8]) -> StepResult {
    let ip = ctx.get(Register::I).as_u64();
    let ins = code[memory::code_offset(ip)];
    let base = opcode::base(ins);

    if base == opcode::RET {
        debug!("0x{ip:012x}: RET");
        return StepResult::Halt;
    }

    let small = opcode::small_values(ins);
    let (op_a, a_width) = decode_operand(code, ip + 1, opcode::a_is_value(ins), small);
    let (op_b, b_width) = decode_operand(code, ip + 1 + a_width, opcode::b_is_value(ins), small);
    let bytes_executed = 1 + a_width + b_width;

    debug!(
        "0x{ip:012x}: {} {op_a:?}, {op_b:?}",
        opcode::mnemonic(base).unwrap_or("???")
    );

    match base {
        opcode::ADD => {
            let v = op_a.load(ctx, code).as_i64().wrapping_add(op_b.load(ctx, code).as_i64());
            op_a.store(ctx, Slot::from_i64(v));
        }
        opcode::SUB => {
            let v = op_a.load(ctx, code).as_i64().wrapping_sub(op_b.load(ctx, code).as_i64());
            op_a.store(ctx, Slot::from_i64(v));
        }
        opcode::MUL => {
            let v = op_a.load(ctx, code).as_i64().wrapping_mul(op_b.load(ctx, code).as_i64());
            op_a.store(ctx, Slot::from_i64(v));
        }
        opcode::DIV => {
            // Division by zero is a fatal arithmetic fault, not an error value.
            let v = op_a.load(ctx, code).as_i64() / op_b.load(ctx, code).as_i64();
            op_a.store(ctx, Slot::from_i64(v));
        }
        opcode::AND => {
            let v = op_a.load(ctx, code).as_u64() & op_b.load(ctx, code).as_u64();
            op_a.store(ctx, Slot::from_u64(v));
        }
        opcode::OR => {
            let v = op_a.load(ctx, code).as_u64() | op_b.load(ctx, code).as_u64();
            op_a.store(ctx, Slot::from_u64(v));
        }
        opcode::XOR => {
            let v = op_a.load(ctx, code).as_u64() ^ op_b.load(ctx, code).as_u64();
            op_a.store(ctx, Slot::from_u64(v));
        }
        opcode::MOV => {
            let v = op_b.load(ctx, code);
            op_a.store(ctx, v);
        }
        opcode::JMP => {
            ctx.set(Register::I, op_a.load(ctx, code));
            return StepResult::Advance(bytes_executed);
        }
        opcode::JZR => {
            if ctx.get(Register::R).as_u64() == 0 {
                ctx.set(Register::I, op_a.load(ctx, code));
                return StepResult::Advance(bytes_executed);
            }
        }
        opcode::DREF => {
            let v = memory::read_u64(ctx, code, op_b.load(ctx, code).as_u64());
            op_a.store(ctx, v);
        }
        opcode::LADR => {
            op_a.store(ctx, Slot::from_u64(op_b.address()));
        }
        opcode::COMP => {
            let v = !op_b.load(ctx, code).as_u64();
            op_a.store(ctx, Slot::from_u64(v));
        }
        opcode::PUSH => {
            assert!(ctx.depth() < STACK_SIZE as u64, "stack overflow");
            let v = op_a.load(ctx, code);
            let s = ctx.get(Register::S).as_u64() + 8;
            ctx.set(Register::S, Slot::from_u64(s));
            memory::write_u64(ctx, s, v);
        }
        opcode::POP => {
            assert!(ctx.depth() != 0, "stack underflow");
            let s = ctx.get(Register::S).as_u64();
            let v = memory::read_u64(ctx, code, s);
            ctx.set(Register::S, Slot::from_u64(s - 8));
            op_a.store(ctx, v);
        }
        _ => return StepResult::Fault(ins),
    }

    ctx.set(Register::I, Slot::from_u64(ip + bytes_executed));
    StepResult::Advance(bytes_executed)
}

/// Executes bytecode from its first byte until RET or a fault.
///
/// On RET, reports the total bytes executed and the value of register R.
/// On a fault the caller sees no byte count and no return value.
pub fn execute(code: &[u8], ctx: &mut Context) -> Result<Halted, Trap> {
    ctx.set(Register::I, Slot::from_u64(CODE_BASE));

    let mut bytes_executed = 0u64;
    loop {
        match step(ctx, code) {
            StepResult::Advance(n) => bytes_executed += n,
            StepResult::Halt => {
                return Ok(Halted {
                    bytes_executed: bytes_executed + 1,
                    return_value: ctx.get(Register::R),
                })
            }
            StepResult::Fault(op) => return Err(Trap::InvalidInstruction(op)),
        }
    }
}
