//! Pinegate Core - Shared data structures and infrastructure
//!
//! This module defines the domain types, error system, configuration, and
//! logging setup shared by the access-control services and the web front-end.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
