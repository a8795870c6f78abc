//! Augur - market signal engine for a single asset

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::Config;
use services::SignalOrchestrator;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<SignalOrchestrator>,
}

// Re-export commonly used types
pub use error::{AppError, Result};
pub use services::{CycleStatus, SkipReason, Trigger};
pub use types::*;
