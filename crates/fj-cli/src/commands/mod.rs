//! CLI subcommand implementations.

pub mod add;
pub mod clear;
pub mod day;
pub mod digest;
pub mod edit;
pub mod list;
pub mod remove;
pub mod status;
pub mod util;
