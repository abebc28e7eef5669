use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, header::AUTHORIZATION},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::NaiveDate;
use db::models::ephemeris::Ephemeris;
use serde::{Deserialize, Serialize};
use services::services::ephemeris::GenerateOptions;
use tracing::info;
use utils::{date_key, response::ApiResponse};

use crate::{AppState, auth::authorize_scheduler, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

impl DateQuery {
    /// An empty `date` parameter counts as absent.
    fn parse(&self) -> Result<Option<NaiveDate>, ApiError> {
        match self.date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Ok(Some(date_key::parse_full_key(raw)?)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default, alias = "forceRegenerate")]
    pub force_generate: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub ephemeris: Ephemeris,
    pub date: String,
    pub display_date: String,
    pub source: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePreview {
    pub target_date: String,
    pub display_date: String,
    pub usage: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEphemerisRequest {
    pub date: String,
    pub event: String,
}

/// An empty body parses as `None`.
fn parse_body<T: for<'de> Deserialize<'de>>(body: &Bytes) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

pub async fn generate_ephemeris(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DateQuery>,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<GenerateResponse>>, ApiError> {
    authorize_scheduler(&headers, state.config().cron_secret.as_ref())?;

    let request: GenerateRequest = parse_body(&body)?.unwrap_or_default();
    let target_date = query.parse()?.unwrap_or_else(|| state.today());
    let manual = !headers.contains_key(AUTHORIZATION);
    info!(
        target_date = %target_date,
        force = request.force_generate,
        manual,
        "Ephemeris generation requested"
    );

    let outcome = state
        .ephemeris()
        .generate(
            target_date,
            GenerateOptions {
                force_regenerate: request.force_generate,
            },
        )
        .await?;

    let source = outcome.source_label();
    let message = match source.as_str() {
        "existing" => "Ephemeris already exists for this date",
        _ => "Ephemeris generated successfully",
    };

    Ok(ResponseJson(ApiResponse::success_with_message(
        GenerateResponse {
            ephemeris: outcome.into_ephemeris(),
            date: date_key::full_key(target_date),
            display_date: date_key::display_key(target_date),
            source,
            message: message.to_string(),
        },
        message,
    )))
}

pub async fn preview_generation(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<ResponseJson<ApiResponse<GeneratePreview>>, ApiError> {
    let target_date = query.parse()?.unwrap_or_else(|| state.today());
    Ok(ResponseJson(ApiResponse::success_with_message(
        GeneratePreview {
            target_date: date_key::full_key(target_date),
            display_date: date_key::display_key(target_date),
            usage: "POST generates the programming ephemeris for the target date".to_string(),
        },
        "Use POST method to generate ephemeris",
    )))
}

pub async fn list_ephemerides(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Ephemeris>>>, ApiError> {
    let pool = &state.db().pool;
    let rows = match query.parse()? {
        Some(date) => Ephemeris::find_by_date(pool, date).await?,
        None => Ephemeris::find_all(pool).await?,
    };
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub async fn add_ephemeris(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<Ephemeris>>, ApiError> {
    authorize_scheduler(&headers, state.config().cron_secret.as_ref())?;

    let payload: CreateEphemerisRequest = parse_body(&body)?
        .ok_or_else(|| ApiError::BadRequest("Request body is required".to_string()))?;

    let date = date_key::parse_full_key(payload.date.trim())?;
    let row = state.ephemeris().add_manual(date, &payload.event).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        row,
        "Ephemeris added",
    )))
}

pub async fn today_ephemeris(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<Option<Ephemeris>>> {
    let row = state.ephemeris().today(state.today()).await;
    ResponseJson(ApiResponse::success(row))
}

pub async fn random_ephemeris(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<Option<Ephemeris>>> {
    ResponseJson(ApiResponse::success(state.ephemeris().random().await))
}

pub async fn available_dates(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<String>>>, ApiError> {
    let dates = Ephemeris::available_display_dates(&state.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(dates)))
}

pub async fn by_display_key(
    State(state): State<AppState>,
    Path(display_key): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Ephemeris>>>, ApiError> {
    let display_key = date_key::parse_display_key(&display_key)?;
    let rows = state.ephemeris().by_display_key(&display_key).await;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/generate-ephemeris",
            get(preview_generation).post(generate_ephemeris),
        )
        .route("/ephemerides", get(list_ephemerides).post(add_ephemeris))
        .route("/ephemerides/today", get(today_ephemeris))
        .route("/ephemerides/random", get(random_ephemeris))
        .route("/ephemerides/dates", get(available_dates))
        .route("/ephemerides/display/{display_key}", get(by_display_key))
}
