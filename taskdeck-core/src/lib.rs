//! Taskdeck Core - Shared data structures and infrastructure
//!
//! Error taxonomy, logging, configuration, and the data model shared by the
//! session layer, the API client, and the command-line front end.

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
