use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod ephemeris;
pub mod frontend;
pub mod health;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(health::router(&state))
        .merge(ephemeris::router(&state));

    Router::new()
        .nest("/api", api)
        .merge(frontend::router(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
