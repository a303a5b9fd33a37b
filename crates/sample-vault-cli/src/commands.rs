use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sample-vault")]
#[command(about = "Binary sample catalog and repository", long_about = None)]
pub struct Cli {
    /// Repository root (overrides configuration)
    #[arg(short, long, global = true)]
    pub repository: Option<PathBuf>,

    /// Catalog database file (overrides configuration)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the interactive console (default)
    Console,
    /// Run a single console command line and exit
    Exec {
        /// Print the command output as JSON
        #[arg(long)]
        json: bool,

        /// The command line, e.g. `find tag mal`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        line: Vec<String>,
    },
    /// Print configuration values
    PrintConfig,
}
