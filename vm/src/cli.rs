//! Implements the command line behavior.

use std::fs;
use std::path::Path;

use log::debug;

use crate::context::Context;
use crate::engine::execute;
use crate::value::Slot;

/// Loads a bytecode file and executes it from byte 0 until RET.
///
/// `pushes` are seeded onto the stack in order before execution starts,
/// so a program can receive arguments with POP.
///
/// Prints the executed byte count and the return value on success. A
/// decode fault is reported as an error with no bytes and no value.
pub fn run(path: &Path, pushes: &[i64]) -> Result<(), String> {
    let code = fs::read(path).map_err(|e| format!("Unable to open {}: {}", path.display(), e))?;

    if code.is_empty() {
        return Err(format!("{} contains no bytecode", path.display()));
    }

    debug!("Loaded {} bytes from {}", code.len(), path.display());

    let mut ctx = Context::new();
    for &value in pushes {
        ctx.push(Slot::from_i64(value));
    }

    let halted = execute(&code, &mut ctx)
        .map_err(|trap| format!("Execution fault: {trap} (0 bytes executed, return value 0)"))?;

    println!(
        "Executed 0x{:x} bytes, return value 0x{:x}",
        halted.bytes_executed,
        halted.return_value.as_u64()
    );

    Ok(())
}
