//! Diagnostics setup for the `tractolabel` binary.
//!
//! Every event goes to `stderr` through one global `tracing` subscriber, so
//! the transfer summary printed on `stdout` stays machine-readable. Records
//! emitted through the `log` facade are forwarded into the same subscriber.

use std::{env, sync::OnceLock};

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, Layer, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Selects the output encoding: `human` (default) or `json`.
pub const LOG_FORMAT_ENV: &str = "TRACTOLABEL_LOG_FORMAT";

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Rendering used for diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line text.
    #[default]
    Human,
    /// One JSON object per event, including the active span list.
    Json,
}

impl LogFormat {
    fn from_env() -> Result<Self, LoggingError> {
        match env::var(LOG_FORMAT_ENV) {
            Ok(raw) => raw.parse(),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(source @ env::VarError::NotUnicode(_)) => Err(LoggingError::NonUnicodeFormat {
                variable: LOG_FORMAT_ENV,
                source,
            }),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = raw.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            _ => Err(LoggingError::UnknownFormat { value: normalised }),
        }
    }
}

/// Failures while setting up diagnostics.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The format variable held bytes that are not UTF-8.
    #[error("`{variable}` is not valid UTF-8: {source}")]
    NonUnicodeFormat {
        /// Variable that was read.
        variable: &'static str,
        /// Lookup failure reported by the environment.
        #[source]
        source: env::VarError,
    },
    /// The format variable named neither `human` nor `json`.
    #[error("log format `{value}` is not recognised; use `human` or `json`")]
    UnknownFormat {
        /// Normalised value that was rejected.
        value: String,
    },
    /// The global subscriber slot could not be claimed.
    #[error("could not register the tracing subscriber: {source}")]
    Registration {
        /// Failure reported by `tracing_subscriber`.
        #[source]
        source: tracing_subscriber::util::TryInitError,
    },
}

/// Sets up diagnostics once per process; later calls return `Ok(())`.
///
/// `verbosity` counts `-v` flags and picks the default filter (`info`,
/// `debug`, then `trace`). A `RUST_LOG` directive replaces that default
/// entirely. The output format is read from [`LOG_FORMAT_ENV`].
///
/// # Errors
/// Returns [`LoggingError`] when the format variable is unreadable or names
/// an unknown format. A subscriber installed by someone else is reported on
/// `stderr` and otherwise tolerated.
#[expect(
    clippy::print_stderr,
    reason = "Tracing is unavailable when another subscriber owns the slot"
)]
pub fn init_logging(verbosity: u8) -> Result<(), LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let format = LogFormat::from_env()?;
    if let Err(err) = install(format, filter_for(verbosity)) {
        eprintln!("tractolabel: keeping the existing tracing subscriber ({err})");
    }
    let _ = INSTALLED.set(());
    Ok(())
}

fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)))
}

fn install(format: LogFormat, filter: EnvFilter) -> Result<(), LoggingError> {
    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let output = match format {
        LogFormat::Human => base.boxed(),
        LogFormat::Json => base
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
    };

    // The `log` slot may already be taken by an embedding application.
    let _ = LogTracer::init();

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(|source| LoggingError::Registration { source })
}

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
