use crate::config::Config;
use crate::store::DocumentStore;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub config: Config,
}

impl FromRef<AppState> for DocumentStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
