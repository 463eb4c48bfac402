//! The mutable execution state: register file plus operand stack.

use mvm64_isa::{Register, NUM_REGISTERS, STACK_SIZE};

use crate::memory::STACK_BASE;
use crate::value::Slot;

/// Register file and operand stack for one program run.
///
/// The stack arena is addressed through the `S` (stack pointer) and `Z`
/// (stack base) registers, which hold guest addresses in the stack
/// segment. A push pre-increments `S` before writing, so the arena
/// carries one extra slot and the base slot is never written.
pub struct Context {
    registers: [Slot; NUM_REGISTERS],
    stack: Box<[u8]>,
}

impl Context {
    /// Creates a context with zeroed registers, an empty stack, and
    /// `S == Z` pointing at the stack base.
    pub fn new() -> Self {
        let mut ctx = Context {
            registers: [Slot::default(); NUM_REGISTERS],
            stack: vec![0u8; (STACK_SIZE + 1) * 8].into_boxed_slice(),
        };
        ctx.set(Register::S, Slot::from_u64(STACK_BASE));
        ctx.set(Register::Z, Slot::from_u64(STACK_BASE));
        ctx
    }

    /// Reads a register.
    pub fn get(&self, register: Register) -> Slot {
        self.registers[usize::from(register.index())]
    }

    /// Writes a register.
    pub fn set(&mut self, register: Register, value: Slot) {
        self.registers[usize::from(register.index())] = value;
    }

    /// Reads a register by operand encoding.
    ///
    /// Panics if the index is out of range; bytecode is trusted to encode
    /// only valid register indices.
    pub fn register(&self, index: u8) -> Slot {
        assert!(
            usize::from(index) < NUM_REGISTERS,
            "register index out of range: {index}"
        );
        self.registers[usize::from(index)]
    }

    /// Writes a register by operand encoding.
    ///
    /// Panics if the index is out of range.
    pub fn set_register(&mut self, index: u8, value: Slot) {
        assert!(
            usize::from(index) < NUM_REGISTERS,
            "register index out of range: {index}"
        );
        self.registers[usize::from(index)] = value;
    }

    /// The number of values on the stack, from the `S`/`Z` registers.
    pub fn depth(&self) -> u64 {
        (self.get(Register::S).as_u64() - self.get(Register::Z).as_u64()) / 8
    }

    /// Pushes a value, for seeding the stack before execution (e.g. to
    /// pass an argument).
    ///
    /// Unlike the engine's PUSH instruction this performs no capacity
    /// check; pushing past the arena panics on the arena access instead.
    pub fn push(&mut self, value: Slot) {
        let s = self.get(Register::S).as_u64() + 8;
        self.set(Register::S, Slot::from_u64(s));
        self.write_stack_u64((s - STACK_BASE) as usize, value);
    }

    /// Pops the top of the stack. Panics if the stack is empty.
    pub fn pop(&mut self) -> Slot {
        assert!(self.depth() != 0, "stack underflow");
        let s = self.get(Register::S).as_u64();
        let value = self.read_stack_u64((s - STACK_BASE) as usize);
        self.set(Register::S, Slot::from_u64(s - 8));
        value
    }

    /// Reads 8 bytes from the stack arena at a byte offset.
    pub(crate) fn read_stack_u64(&self, offset: usize) -> Slot {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.stack[offset..offset + 8]);
        Slot::from_u64(u64::from_le_bytes(bytes))
    }

    /// Writes 8 bytes to the stack arena at a byte offset.
    pub(crate) fn write_stack_u64(&mut self, offset: usize, value: Slot) {
        self.stack[offset..offset + 8].copy_from_slice(&value.as_u64().to_le_bytes());
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
