use std::sync::Arc;

use crate::db::DbPool;
use crate::presence::PresenceRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection wrapped in Arc<Mutex>
    pub db: DbPool,
    /// Identity -> live WebSocket connection mapping, used for event push
    pub registry: Arc<PresenceRegistry>,
}
