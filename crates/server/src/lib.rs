pub mod app_state;
pub mod auth;
pub mod error;
pub mod routes;

pub use app_state::AppState;
