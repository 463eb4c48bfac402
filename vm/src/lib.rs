//! Register-based virtual machine for MVM64 bytecode.
//!
//! The VM executes a compact variable-length bytecode produced by the
//! `mvm64-asm` assembler (or hand-assembled byte buffers). It trusts its
//! input: beyond the two stack assertions and opcode dispatch there is no
//! validation, and malformed code panics rather than returning an error.

pub mod cli;
pub mod error;
pub mod logger;

mod context;
mod engine;
mod memory;
mod value;

pub use context::Context;
pub use engine::{execute, step, Halted, StepResult};
pub use memory::{code_address, register_address, CODE_BASE, REG_BASE, STACK_BASE};
pub use value::Slot;
