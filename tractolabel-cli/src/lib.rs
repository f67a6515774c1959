//! Support library for the tractolabel CLI binary.
//!
//! Re-exports the CLI and logging modules so tests can drive the transfer
//! pipeline without forking a subprocess.

pub mod cli;
pub mod logging;
