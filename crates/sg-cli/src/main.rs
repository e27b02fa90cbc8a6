//! Entry point: parses arguments, configures logging and color, loads
//! configuration, and routes to a command module (grounded on the teacher's
//! `main.rs`).

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use sg_core::{Config, Runtime};
use sg_mcp_server::{tools::build_registry, AppContext};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!("sg={log_level}")))
        .with_target(false)
        .with_level(false)
        .init();

    let debug = cli.debug;
    if let Err(err) = run(cli).await {
        output::print_error(debug, &err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(Runtime::new(config.clone()));
    let registry = build_registry();

    match cli.command {
        Commands::Doctor { component, fix } => commands::doctor::run(&ctx, component, fix).await,
        Commands::Config { action } => commands::config::run(action, &config),
        other => commands::run::dispatch(&ctx, &registry, other).await,
    }
}
