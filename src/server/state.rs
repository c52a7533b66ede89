//! Shared state handed to every request handler.

use crate::pipeline::Converter;
use crate::progress::{MemoryProgressStore, ProgressStore};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
pub struct AppState {
    pub converter: Converter,
    pub progress: Arc<dyn ProgressStore>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(converter: Converter, progress: Arc<dyn ProgressStore>, max_upload_bytes: usize) -> Self {
        Self {
            converter,
            progress,
            max_upload_bytes,
        }
    }

    /// State backed by an in-memory progress store
    pub fn in_memory(converter: Converter, progress_ttl: Option<Duration>, max_upload_bytes: usize) -> Self {
        Self::new(
            converter,
            Arc::new(MemoryProgressStore::new(progress_ttl)),
            max_upload_bytes,
        )
    }
}

/// Thread-safe handle to the application state
pub type SharedState = Arc<AppState>;
