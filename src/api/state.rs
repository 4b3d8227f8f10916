//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::{AuthConfig, ServerConfig};
use crate::storage::Store;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Player and score store
    pub store: Arc<Store>,
    /// Admin credential checked by the auth extractors
    pub auth: Arc<AuthConfig>,
    /// Server configuration (static dir, CORS)
    pub server: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<Store>, auth: AuthConfig, server: ServerConfig) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            server: Arc::new(server),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
