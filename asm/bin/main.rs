use std::path::PathBuf;

use clap::Parser;

use mvm64_asm::cli;
use mvm64_asm::logger;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "mvm64asm", about = "MVM64 assembler")]
struct Args {
    /// Turn on verbose logging. Repeat to increase verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Sets the logging to write to a file.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Selects the subcommand.
    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand, Debug)]
enum Action {
    /// Assembles a source file into a bytecode file.
    Assemble {
        /// Path to the assembly source file.
        source: PathBuf,

        /// Path of the bytecode file to write.
        output: PathBuf,
    },
    /// Prints an instruction listing of a bytecode file.
    Disassemble {
        /// Path to the bytecode file.
        file: PathBuf,
    },
    /// Prints the version number of the assembler.
    Version,
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    match args.action {
        Action::Assemble { source, output } => cli::assemble_file(&source, &output),
        Action::Disassemble { file } => cli::disassemble_file(&file),
        Action::Version => {
            println!("mvm64asm version {VERSION}");
            Ok(())
        }
    }
}
