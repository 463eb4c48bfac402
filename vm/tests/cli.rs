use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Hand-assembled test program:
///   MOV A, 0x14 (8-bit immediate)
///   ADD A, 0x10 (64-bit immediate)
///   MOV R, A
///   RET
/// Halts with R == 0x24 after 17 bytes.
fn write_steel_thread_bytecode(path: &Path) {
    #[rustfmt::skip]
    let code: Vec<u8> = vec![
        0x09 | 0x40 | 0x80, 0x00, 0x14,                   // MOV|VALB|SMALL A, 0x14
        0x00 | 0x40, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0,    // ADD|VALB A, 0x10
        0x09, 0x08, 0x00,                                 // MOV R, A
        0x0F,                                             // RET
    ];
    std::fs::write(path, &code).unwrap();
}

#[test]
fn run_when_valid_bytecode_then_prints_bytes_and_return_value(
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let bin_path = dir.path().join("test.bin");
    write_steel_thread_bytecode(&bin_path);

    let mut cmd = Command::new(cargo::cargo_bin!("mvm64vm"));
    cmd.arg("run").arg(&bin_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Executed 0x11 bytes"))
        .stdout(predicate::str::contains("return value 0x24"));

    Ok(())
}

#[test]
fn run_when_stack_seeded_then_program_pops_argument() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let bin_path = dir.path().join("arg.bin");
    // POP R; RET (the engine reads a dummy second operand field)
    std::fs::write(&bin_path, [0x0E, 0x08, 0x00, 0x0F])?;

    let mut cmd = Command::new(cargo::cargo_bin!("mvm64vm"));
    cmd.arg("run").arg(&bin_path).arg("--push").arg("66");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("return value 0x42"));

    Ok(())
}

#[test]
fn run_when_file_missing_then_fails() {
    let mut cmd = Command::new(cargo::cargo_bin!("mvm64vm"));
    cmd.arg("run").arg("no-such-file.bin");
    cmd.assert().failure();
}

#[test]
fn run_when_file_empty_then_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let bin_path = dir.path().join("empty.bin");
    std::fs::write(&bin_path, [])?;

    let mut cmd = Command::new(cargo::cargo_bin!("mvm64vm"));
    cmd.arg("run").arg(&bin_path);
    cmd.assert().failure();

    Ok(())
}

#[test]
fn version_when_requested_then_prints_version() {
    let mut cmd = Command::new(cargo::cargo_bin!("mvm64vm"));
    cmd.arg("version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("mvm64vm version"));
}
