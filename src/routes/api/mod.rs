pub mod providers;
pub mod scrape;
pub mod search;

use axum::Router;
use axum::routing::{get, post};

use crate::routes::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // Search
        .route("/search", get(search::search))
        .route("/search/boosted", post(search::boosted))
        // Providers
        .route("/providers", get(providers::list))
        .route("/providers/{name}/enable", post(providers::enable))
        .route("/providers/{name}/disable", post(providers::disable))
        // Background scrapes
        .route("/scrape", post(scrape::submit))
        .route("/scrape/{id}", get(scrape::status))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}
