//! Conversational assistant for Salescast reports.

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use state::{ChatPhase, PhaseMachine};
