//! Implements the command line behavior.

use std::fs;
use std::path::Path;

use log::debug;

use crate::assemble::assemble;
use crate::disassemble::disassemble;

/// Assembles a source file and writes the bytecode to the output path.
///
/// On any assembly error the output file is not written.
pub fn assemble_file(source: &Path, output: &Path) -> Result<(), String> {
    let text = fs::read_to_string(source)
        .map_err(|e| format!("Unable to open source file {}: {}", source.display(), e))?;

    debug!("assembling {}", source.display());

    let code = assemble(&text).map_err(|e| format!("Assembly failed: {e}"))?;

    fs::write(output, &code)
        .map_err(|e| format!("Unable to write output file {}: {}", output.display(), e))?;

    println!("Wrote {} bytes to {}", code.len(), output.display());

    Ok(())
}

/// Prints an instruction listing of a bytecode file.
pub fn disassemble_file(path: &Path) -> Result<(), String> {
    let code = fs::read(path).map_err(|e| format!("Unable to open {}: {}", path.display(), e))?;

    print!("{}", disassemble(&code));

    Ok(())
}
