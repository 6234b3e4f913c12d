use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Source code input file
    pub input_file: PathBuf,

    /// Execution mode
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Compile)]
    pub mode: Mode,

    /// Print the generated IR
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Compile the source code and write the textual IR to `out.ir`
    Compile,

    /// Inspect the AST of the parsed source code
    Parse,
}
