// src/bin/st2chat.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use st2chat::{
    cli::{
        Cli,
        dispatcher::{self, AppContext},
    },
    core::settings,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// The main entry point of the `st2chat` application.
/// It sets up logging, loads the configuration, dispatches to the requested command
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let settings =
        settings::load(cli.config.as_deref()).context("Failed to load the configuration")?;
    let context = AppContext {
        settings,
        cancellation_token: Arc::new(AtomicBool::new(false)),
    };

    dispatcher::dispatch(cli.args, &context)
}
