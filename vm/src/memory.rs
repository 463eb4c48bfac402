//! The guest address space.
//!
//! The VM executes trusted bytecode that manipulates addresses as plain
//! 64-bit values (DREF, LADR, JMP, stack pointer arithmetic). Rather than
//! hand out host pointers, the VM maps three disjoint segments into the
//! guest's address space, each backed by an indexable arena:
//!
//! - code: the bytecode buffer, read-only
//! - stack: the context's stack arena
//! - registers: the register file, 8 bytes per register
//!
//! An address that falls outside a mapped segment, or that addresses a
//! register at a misaligned offset, violates the trusted-input contract
//! and panics.

use mvm64_isa::Register;

use crate::context::Context;
use crate::value::Slot;

/// Base address of the code segment.
pub const CODE_BASE: u64 = 0x0000_1000_0000_0000;

/// Base address of the stack segment.
pub const STACK_BASE: u64 = 0x0000_2000_0000_0000;

/// Base address of the register file segment.
pub const REG_BASE: u64 = 0x0000_3000_0000_0000;

const SEGMENT_SPAN: u64 = 0x0000_1000_0000_0000;

/// A guest address resolved to its segment and offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Code(usize),
    Stack(usize),
    Reg(u8),
}

/// Resolves a guest address to its segment and offset.
///
/// Panics on an unmapped address or a misaligned register address.
pub fn resolve(addr: u64) -> Location {
    if (CODE_BASE..CODE_BASE + SEGMENT_SPAN).contains(&addr) {
        Location::Code((addr - CODE_BASE) as usize)
    } else if (STACK_BASE..STACK_BASE + SEGMENT_SPAN).contains(&addr) {
        Location::Stack((addr - STACK_BASE) as usize)
    } else if (REG_BASE..REG_BASE + SEGMENT_SPAN).contains(&addr) {
        let offset = addr - REG_BASE;
        assert!(
            offset % 8 == 0,
            "misaligned register address 0x{addr:016x}"
        );
        Location::Reg((offset / 8) as u8)
    } else {
        panic!("unmapped address 0x{addr:016x}");
    }
}

/// The guest address of a code buffer offset.
pub fn code_address(offset: usize) -> u64 {
    CODE_BASE + offset as u64
}

/// The code buffer offset of a guest address.
///
/// Panics if the address is not in the code segment.
pub fn code_offset(addr: u64) -> usize {
    match resolve(addr) {
        Location::Code(offset) => offset,
        _ => panic!("address 0x{addr:016x} is not in the code segment"),
    }
}

/// The guest address of a register's storage.
pub fn register_address(register: Register) -> u64 {
    REG_BASE + u64::from(register.index()) * 8
}

/// Reads 8 bytes through a guest address.
pub fn read_u64(ctx: &Context, code: &[u8], addr: u64) -> Slot {
    match resolve(addr) {
        Location::Code(offset) => read_code_u64(code, offset),
        Location::Stack(offset) => ctx.read_stack_u64(offset),
        Location::Reg(index) => ctx.register(index),
    }
}

/// Writes 8 bytes through a guest address.
///
/// The code segment is read-only; writing to it panics.
pub fn write_u64(ctx: &mut Context, addr: u64, value: Slot) {
    match resolve(addr) {
        Location::Code(offset) => {
            panic!("write to read-only code segment at offset {offset}")
        }
        Location::Stack(offset) => ctx.write_stack_u64(offset, value),
        Location::Reg(index) => ctx.set_register(index, value),
    }
}

/// Reads a little-endian u64 from the code buffer.
pub fn read_code_u64(code: &[u8], offset: usize) -> Slot {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&code[offset..offset + 8]);
    Slot::from_u64(u64::from_le_bytes(bytes))
}
