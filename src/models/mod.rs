//! Data models and structures for the ping monitor

pub mod config;
pub mod probe;

// Re-export main model types
pub use config::Config;
pub use probe::{Destination, ProbeOutcome, RoundResult};
