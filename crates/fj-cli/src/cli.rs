//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    add::AddArgs, clear::ClearArgs, day::DayArgs, digest::DigestArgs, edit::EditArgs,
    list::ListArgs, remove::RemoveArgs,
};

/// Personal food journal.
///
/// Logs what you ate and when, lays each day out on an hourly timeline,
/// and summarizes the journal for dietary feedback.
#[derive(Debug, Parser)]
#[command(name = "fj", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log a food entry.
    Add(AddArgs),

    /// Change an existing entry, keeping its timestamp.
    Edit(EditArgs),

    /// Delete an entry by timestamp.
    #[command(alias = "delete")]
    Rm(RemoveArgs),

    /// Delete every entry.
    Clear(ClearArgs),

    /// List entries, optionally for one day.
    List(ListArgs),

    /// Show a day on the hourly timeline.
    Day(DayArgs),

    /// Print the journal digest used for dietary feedback.
    Digest(DigestArgs),

    /// Show journal status.
    Status,
}
