//! CLI entry point for transferring prior cluster labels onto transformed
//! tractography.
//!
//! Parses arguments with clap, initialises logging at the requested verbosity,
//! runs the transfer, prints a summary to stdout and maps errors to a failing
//! exit code.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use tracing::{error, field};
use tractolabel_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};

/// Execute the transfer, render the summary, and flush the output stream.
fn try_main(cli: Cli) -> Result<()> {
    let summary = run_cli(cli).context("failed to transfer cluster labels")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(cli.verbose) {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main(cli) {
        let code = err
            .downcast_ref::<CliError>()
            .and_then(CliError::code)
            .map(|code| field::display(code.as_str()));
        error!(error = %format!("{err:#}"), code, "command execution failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "Emit one-off diagnostic before tracing is initialized"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialize logging: {err}");
}
