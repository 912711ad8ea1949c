//! CLI interface and argument parsing

pub mod app;

// Re-export main types
pub use app::*;
