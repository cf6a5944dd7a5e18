//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// codepad: compile multi-file web projects and run server scripts remotely
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: codepad.toml)
    #[arg(short = 'C', long, global = true, default_value = "codepad.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile the project once into the output directory
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Compile, then recompile on every change
    ///
    /// Reads commands from stdin: `open <path>`, `run [path]`, `stdin [file]`,
    /// `ls`, `quit`.
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        project: ProjectArgs,

        /// Debounce window in milliseconds (overrides [schedule].debounce_ms)
        #[arg(short, long)]
        debounce: Option<u64>,
    },

    /// Run one server script on the remote service and print the result
    #[command(visible_alias = "x")]
    Exec {
        /// Script to run (.php or .py)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// File whose content is passed as standard input
        #[arg(long, value_hint = clap::ValueHint::FilePath)]
        stdin: Option<PathBuf>,

        /// Language override (php, python3)
        #[arg(short, long)]
        language: Option<String>,

        /// Python module to import before the script (repeatable)
        #[arg(short, long = "module")]
        modules: Vec<String>,
    },
}

/// Shared arguments for Build and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory
    #[arg(default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,
}
