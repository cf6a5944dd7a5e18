//! codepad - compile multi-file web projects and run server scripts remotely.

#![allow(dead_code)]

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod logger;
mod remote;
mod surface;
mod utils;
mod workspace;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Everything runs on one cooperative scheduler
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Build { project } => {
            let project = cli::common::open_project(project, &cli.config, None)?;
            cli::build::build_project(&project).map(|_| ())
        }
        Commands::Watch { project, debounce } => {
            let project = cli::common::open_project(project, &cli.config, *debounce)?;
            cli::watch::watch_project(project).await
        }
        Commands::Exec {
            file,
            stdin,
            language,
            modules,
        } => {
            let run = cli::exec::ExecRequest {
                file,
                stdin: stdin.as_deref(),
                language: language.as_deref(),
                modules,
            };
            cli::exec::exec_file(run, &cli.config).await
        }
    }
}
