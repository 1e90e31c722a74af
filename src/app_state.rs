use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::services::pipeline::Pipeline;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Parent token; per-request tokens are children so shutdown aborts
    /// any in-flight polling.
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pipeline: Pipeline, shutdown: CancellationToken) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            shutdown,
            started_at: Instant::now(),
        }
    }
}
