//! Configuration context capture and access
//!
//! This module ingests flat environment-style configuration, casts values
//! to typed scalars, and projects the runtime context required by tasks.

pub mod parse;
pub mod runtime;
pub mod types;

// Re-export main types
pub use parse::*;
pub use runtime::*;
pub use types::*;
