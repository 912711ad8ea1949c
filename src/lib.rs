//! runprep - forecast model run preparation
//!
//! runprep resolves a flat environment-style configuration into a
//! structured run specification, stages required input artifacts into a
//! working directory, and renders templated model-control files.

// Public modules
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod task;

// Re-export commonly used types
pub use error::{PrepError, Result};

/// Current version of runprep
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
