//! Handler types and dependencies

use std::sync::Arc;

use crate::core::session::SessionStore;
use crate::storage::db::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    /// Per-user dialog state, keyed by Telegram user id
    pub sessions: SessionStore,
    /// Bot username used to build t.me referral deep links
    pub bot_username: Option<String>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, sessions: SessionStore, bot_username: Option<String>) -> Self {
        Self {
            db_pool,
            sessions,
            bot_username,
        }
    }
}
