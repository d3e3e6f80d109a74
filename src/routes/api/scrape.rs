use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::JobSearchQuery;
use crate::routes::AppState;
use crate::worker::ScrapeStatus;

/// POST /api/v1/scrape
///
/// Queue a background scrape. Poll `GET /api/v1/scrape/{id}` for the outcome.
pub async fn submit(
    State(state): State<AppState>,
    Json(query): Json<JobSearchQuery>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let id = state.worker.submit(query).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "queued",
            "id": id,
            "provider": state.worker.provider(),
        })),
    ))
}

pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScrapeStatus>, AppError> {
    Ok(Json(state.worker.status(id)?))
}
