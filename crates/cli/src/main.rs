// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet: ephemeral CI runner launches and image lifecycle.

mod commands;
mod dry_run;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{boot_script, event, plan, status, validate, Context};
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleet", version, about = "Ephemeral CI runners and the images they boot from")]
struct Cli {
    /// Config file
    #[arg(long, short, global = true, env = "FLEET_CONFIG", default_value = "fleet.toml")]
    config: PathBuf,

    #[arg(long, short, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the config and summarize what it sets up
    Validate,
    /// Render the boot script a runner would start with
    BootScript(boot_script::BootScriptArgs),
    /// Show the image pipeline and collectors the builder declares
    Plan,
    /// Show the runner provider status snapshot
    Status,
    /// Dispatch a collector invocation payload (dry run)
    Event(event::EventArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FLEET_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };
    match command {
        Commands::Event(args) => event::handle(&args, cli.output).await,
        Commands::Validate => validate::handle(&Context::load(&cli.config)?, cli.output),
        Commands::BootScript(args) => boot_script::handle(&Context::load(&cli.config)?, &args),
        Commands::Plan => plan::handle(&Context::load(&cli.config)?, cli.output),
        Commands::Status => status::handle(&Context::load(&cli.config)?, cli.output),
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|rt| rt.block_on(run(cli)));

    if let Err(e) = result {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            eprintln!("error: {}", exit.message);
            std::process::exit(exit.code);
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
