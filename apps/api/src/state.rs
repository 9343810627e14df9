use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::profile::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one profile this process serves. Handlers take the lock for the whole
    /// read-modify-write so each request sees a consistent snapshot.
    pub store: Arc<Mutex<ProfileStore>>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: ProfileStore, config: Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config,
        }
    }
}
