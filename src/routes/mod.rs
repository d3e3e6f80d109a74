pub mod api;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::search::SearchService;
use crate::worker::ScrapeWorker;

#[derive(Clone)]
pub struct AppState {
    pub service: SearchService,
    pub worker: ScrapeWorker,
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(api::router(state))
}
