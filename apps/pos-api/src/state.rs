//! Shared application state handed to every handler.

use verdant_db::Database;

use crate::config::ApiConfig;

/// Shared application state.
///
/// Cheap to clone: the database handle wraps a pooled connection set.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState { db, config }
    }
}
