use axum::http::{HeaderMap, header::AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::error::ApiError;

/// Scheduled callers send `Authorization: Bearer <CRON_SECRET>`. Requests
/// without the header are manual triggers and pass; a header that does not
/// match the configured secret (or any header when none is configured) is
/// rejected.
pub fn authorize_scheduler(
    headers: &HeaderMap,
    cron_secret: Option<&SecretString>,
) -> Result<(), ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(());
    };

    let provided = value.to_str().unwrap_or_default();
    match cron_secret {
        Some(secret) if provided == format!("Bearer {}", secret.expose_secret()) => Ok(()),
        _ => {
            warn!("Rejected request with invalid scheduler credentials");
            Err(ApiError::Unauthorized)
        }
    }
}
