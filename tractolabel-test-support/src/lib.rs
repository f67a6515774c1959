//! Shared test utilities used across tractolabel crates.

pub mod fixtures;
pub mod tracing;
