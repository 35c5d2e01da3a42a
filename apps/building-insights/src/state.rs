use crate::config::InsightsConfig;
use crate::services::facts::ClaimRegistry;
use crate::services::generator::TextGenerator;
use crate::services::store::MetricStore;
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: InsightsConfig,
    pub store: Arc<MetricStore>,
    pub claims: &'static ClaimRegistry,
    pub generator: Arc<dyn TextGenerator>,
}

impl FromRef<AppState> for Arc<MetricStore> {
    fn from_ref(state: &AppState) -> Arc<MetricStore> {
        state.store.clone()
    }
}
