//! HTTP API for the interview agent

mod handlers;
mod types;

pub use handlers::create_router;

use crate::interview::InterviewService;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub interview: Arc<InterviewService>,
    /// Directory served for paths outside the API
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(interview: InterviewService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            interview: Arc::new(interview),
            static_dir: static_dir.into(),
        }
    }
}
