//! Task lifecycle controller
//!
//! Tasks own a configuration context and move through five ordered phases:
//! initialize, configure, execute, finalize, clean.

pub mod base;
pub mod forecast;
pub mod model;

// Re-export main types
pub use base::*;
pub use forecast::*;
pub use model::*;
