//! Run preparation engines
//!
//! Stateless services invoked with context passed explicitly: template
//! substitution, staging/sync, and forecast-hour scheduling.

pub mod schedule;
pub mod stage;
pub mod template;

// Re-export main types
pub use schedule::*;
pub use stage::*;
pub use template::*;
