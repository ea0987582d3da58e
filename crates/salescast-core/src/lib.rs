//! Core types, configuration and session state for Salescast.

pub mod config;
pub mod error;
pub mod session;
pub mod tabular;
pub mod types;

pub use config::SalescastConfig;
pub use error::{Result, SalescastError};
pub use session::{GenerationToken, ResourceLedger, SessionSnapshot, SessionStore};
pub use types::*;
