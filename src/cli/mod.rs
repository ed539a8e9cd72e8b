use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "lifecycle-hooks")]
#[command(about = "Hook-extensible state transitions and command lifecycles")]
#[command(long_about = "Runs commands through the CREATED -> INITIALIZED -> EXECUTING -> COMPLETED/FAILED \
                       lifecycle and inspects the snapshots they leave behind. Try \
                       'lifecycle-hooks run --code greet --params '{\"name\":\"ada\"}'' to see one.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a built-in echo command and print its snapshot
    Run {
        /// Command code
        #[arg(long, default_value = "echo", help = "Code the command is registered under")]
        code: String,
        /// JSON input parameters
        #[arg(long, help = "JSON parameters; the echo command returns them as its result")]
        params: Option<String>,
        /// Make the business step fail with this message
        #[arg(long, help = "Fail the command during execution with the given message")]
        fail: Option<String>,
        /// Write the snapshot to a file instead of stdout
        #[arg(long, short = 'o', help = "Write the snapshot JSON to this file")]
        output: Option<PathBuf>,
        /// Print every hook phase as it runs
        #[arg(long, help = "Print each lifecycle phase as it fires")]
        trace_hooks: bool,
    },
    /// Restore a snapshot and report its status, timing and outcome
    Inspect {
        /// Snapshot file produced by `run --output`
        file: PathBuf,
    },
}
