use std::path::PathBuf;

use clap::Parser;

use mvm64_vm::cli;
use mvm64_vm::logger;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(name = "mvm64vm", about = "MVM64 bytecode virtual machine")]
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
    /// Loads and executes a bytecode file.
    Run {
        /// Path to the bytecode file (.bin).
        file: PathBuf,

        /// Push a value onto the stack before execution. May be repeated;
        /// values are pushed in the order given.
        #[arg(long, allow_hyphen_values = true)]
        push: Vec<i64>,
    },
    /// Prints the version number of the virtual machine.
    Version,
}

pub fn main() -> Result<(), String> {
    let args = Args::parse();

    logger::configure(args.verbose, args.log_file)?;

    match args.action {
        Action::Run { file, push } => cli::run(&file, &push),
        Action::Version => {
            println!("mvm64vm version {VERSION}");
            Ok(())
        }
    }
}
