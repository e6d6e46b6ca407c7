use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::AppConfig;
use crate::notes::NoteGuard;
use crate::store::NoteStore;

/// Shared, read-only handles built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub verifier: Arc<TokenVerifier>,
    pub notes: NoteGuard,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn NoteStore>) -> Self {
        let verifier = TokenVerifier::new(&config.security);
        let notes = NoteGuard::new(store, config.is_development());

        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            notes,
        }
    }
}
