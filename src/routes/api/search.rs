use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Job, JobSearchQuery};
use crate::routes::AppState;
use crate::search::SearchOutcome;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keywords: String,
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub results_per_page: Option<u32>,
    /// Restrict the search to one provider
    pub provider: Option<String>,
}

impl SearchParams {
    fn into_query(self) -> (JobSearchQuery, Option<String>) {
        let mut query = JobSearchQuery::new(self.keywords);
        query.location = self.location;
        query.remote = self.remote;
        query.salary_min = self.salary_min;
        query.salary_max = self.salary_max;
        query.job_type = self.job_type;
        query.category = self.category;
        if let Some(page) = self.page {
            query.page = page;
        }
        if let Some(per_page) = self.results_per_page {
            query.results_per_page = per_page;
        }
        (query, self.provider)
    }
}

/// GET /api/v1/search
///
/// Without `provider` every enabled provider is queried and the merged,
/// deduplicated list is returned. With it, that provider's raw result.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchOutcome>, AppError> {
    let (query, provider) = params.into_query();
    let outcome = state.service.search(&query, provider.as_deref()).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct BoostedRequest {
    pub query: JobSearchQuery,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// POST /api/v1/search/boosted
pub async fn boosted(
    State(state): State<AppState>,
    Json(input): Json<BoostedRequest>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = state
        .service
        .search_boosted(&input.query, &input.keywords)
        .await?;
    Ok(Json(jobs))
}
