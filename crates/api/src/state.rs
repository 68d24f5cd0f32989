use std::sync::Arc;

use decora_pipeline::Orchestrator;

use crate::config::ServerConfig;
use crate::sessions::SessionStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Live decorating sessions.
    pub sessions: Arc<SessionStore>,
    /// Drives workflow transitions and the remote calls around them.
    pub orchestrator: Orchestrator,
}
