// Application state module
// Immutable per-process state, built once at startup

use std::time::Instant;

use super::types::Config;
use crate::routing::RouteTable;

/// Application state shared by every connection task.
///
/// Route registration happens here, during initialization, and the
/// resulting table is never mutated afterwards.
pub struct AppState {
    pub config: Config,
    pub routes: RouteTable,
    pub started_at: Instant,
}

impl AppState {
    /// Create `AppState` with the endpoint routes registered
    pub fn new(config: Config) -> Self {
        Self {
            config,
            routes: crate::handler::build_routes(),
            started_at: Instant::now(),
        }
    }

    /// Seconds elapsed since the server started (reported by `/health`)
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
