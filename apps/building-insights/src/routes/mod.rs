pub mod analysis;
pub mod chat;
pub mod health;
pub mod report;
pub mod validate;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(analysis::router())
                .merge(report::router())
                .merge(validate::router())
                .merge(chat::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
