use std::sync::Arc;

use crate::config::Settings;
use crate::db::Database;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let session_manager = SessionManager::new(db.clone(), settings.session.lifetime_days);
        Self {
            db,
            session_manager,
            settings: Arc::new(settings),
        }
    }
}
