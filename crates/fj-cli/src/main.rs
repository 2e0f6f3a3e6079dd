use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fj_cli::commands::{add, clear, day, digest, edit, list, remove, status};
use fj_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout carries command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Some(Commands::Add(args)) => add::run(&mut stdout, args, &config)?,
        Some(Commands::Edit(args)) => edit::run(&mut stdout, args, &config)?,
        Some(Commands::Rm(args)) => remove::run(&mut stdout, args, &config)?,
        Some(Commands::Clear(args)) => clear::run(&mut stdout, args, &config)?,
        Some(Commands::List(args)) => list::run(&mut stdout, args, &config)?,
        Some(Commands::Day(args)) => day::run(&mut stdout, args, &config)?,
        Some(Commands::Digest(args)) => digest::run(&mut stdout, args, &config)?,
        Some(Commands::Status) => status::run(&mut stdout, &config)?,
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
