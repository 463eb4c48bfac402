#![no_std]

//! Shared definitions for the MVM64 bytecode format.
//!
//! Both the assembler and the VM depend on this crate so that the two
//! sides of the instruction encoding cannot drift apart.

pub mod opcode;

mod register;

pub use register::{Register, NUM_REGISTERS};

/// Capacity of the operand stack, in 8-byte slots.
pub const STACK_SIZE: usize = 128;
