//! Command-line orchestration for copying prior cluster labels onto a
//! transformed tractography file.

mod commands;

pub use commands::{Cli, CliError, TransferSummary, render_summary, run_cli};

#[cfg(test)]
mod tests;
