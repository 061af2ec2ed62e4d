use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{Ledger, Settings};
use crate::xsrf::XsrfToken;
use std::sync::{Arc, RwLock};

/// The transaction table of the current session. `None` until a file is uploaded.
pub type SessionStore = Arc<RwLock<Option<Arc<Ledger>>>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub settings: Settings,
    pub xsrf_token: XsrfToken,
    pub session: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            settings: Settings::from_config(&config),
            config: Arc::new(config),
            xsrf_token: XsrfToken::generate(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Snapshot of the loaded ledger. The lock is released before returning.
    pub fn ledger(&self) -> Option<Arc<Ledger>> {
        let guard = self.session.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    pub fn require_ledger(&self) -> AppResult<Arc<Ledger>> {
        self.ledger().ok_or(AppError::NoData)
    }

    pub fn replace_ledger(&self, ledger: Ledger) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(ledger));
    }

    pub fn clear_ledger(&self) {
        let mut guard = self.session.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
