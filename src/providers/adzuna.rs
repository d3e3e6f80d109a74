use std::collections::BTreeSet;

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::fetch::RetryableFetcher;
use crate::models::{Capability, Job, JobSearchQuery, JobSearchResult, Salary};
use crate::providers::SearchProvider;
use crate::providers::normalize::{id_to_string, infer_remote, non_empty, parse_posted_date};

const NAME: &str = "adzuna";
const BASE_URL: &str = "https://api.adzuna.com";

/// Salary-aware source: filters by salary bounds server-side and reports
/// numeric salary ranges per posting.
pub struct Adzuna {
    fetcher: RetryableFetcher,
    base_url: String,
    app_id: String,
    app_key: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    id: Value,
    title: Option<String>,
    description: Option<String>,
    redirect_url: Option<String>,
    created: Option<String>,
    company: Option<DisplayName>,
    location: Option<DisplayName>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    contract_time: Option<String>,
    contract_type: Option<String>,
    category: Option<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    label: Option<String>,
    tag: Option<String>,
}

impl Adzuna {
    pub fn new(fetcher: RetryableFetcher, app_id: String, app_key: String, country: String) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            app_id,
            app_key,
            country: country.to_lowercase(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn params(&self, query: &JobSearchQuery) -> Vec<(&'static str, String)> {
        let what = if query.remote {
            format!("{} remote", query.keywords)
        } else {
            query.keywords.clone()
        };

        let mut params = vec![
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
            ("results_per_page", query.results_per_page.to_string()),
            ("what", what),
            ("content-type", "application/json".to_string()),
        ];
        if let Some(location) = non_empty(query.location.as_deref()) {
            params.push(("where", location));
        }
        if let Some(min) = query.salary_min {
            params.push(("salary_min", min.to_string()));
        }
        if let Some(max) = query.salary_max {
            params.push(("salary_max", max.to_string()));
        }
        if let Some(flag) = query.job_type.as_deref().and_then(contract_flag) {
            params.push((flag, "1".to_string()));
        }
        if let Some(category) = non_empty(query.category.as_deref()) {
            params.push(("category", category));
        }
        params
    }

    fn currency(&self) -> Option<String> {
        let code = match self.country.as_str() {
            "gb" => "GBP",
            "us" => "USD",
            "ca" => "CAD",
            "au" => "AUD",
            "nz" => "NZD",
            "in" => "INR",
            "br" => "BRL",
            "za" => "ZAR",
            "sg" => "SGD",
            "pl" => "PLN",
            "ch" => "CHF",
            "de" | "fr" | "nl" | "it" | "es" | "at" | "be" => "EUR",
            _ => return None,
        };
        Some(code.to_string())
    }

    fn normalize(&self, raw: RawJob) -> Option<Job> {
        let title = non_empty(raw.title.as_deref())?;
        let url = non_empty(raw.redirect_url.as_deref())?;
        let source_id = id_to_string(&raw.id)?;
        let description = raw.description.unwrap_or_default();

        let job_type = raw
            .contract_time
            .or(raw.contract_type)
            .map(|t| t.replace('_', "-"))
            .unwrap_or_else(|| "full-time".to_string());

        let (category, tags) = match raw.category {
            Some(c) => (c.label, c.tag.into_iter().collect()),
            None => (None, BTreeSet::new()),
        };

        Some(Job {
            id: format!("{NAME}_{source_id}"),
            remote: infer_remote(None, &title, &description),
            title,
            company: raw.company.and_then(|c| c.display_name).unwrap_or_default(),
            location: raw.location.and_then(|l| l.display_name).unwrap_or_default(),
            description,
            url,
            source: NAME.to_string(),
            posted_date: parse_posted_date(raw.created.as_deref()),
            job_type,
            category,
            tags,
            salary: Salary::from_bounds(
                raw.salary_min,
                raw.salary_max,
                self.currency(),
                Some("year".to_string()),
            ),
            relevance_score: None,
        })
    }
}

/// Map a free-form employment type onto Adzuna's boolean contract filters.
fn contract_flag(job_type: &str) -> Option<&'static str> {
    match job_type.to_lowercase().replace(['-', ' '], "_").as_str() {
        "full_time" | "fulltime" => Some("full_time"),
        "part_time" | "parttime" => Some("part_time"),
        "contract" => Some("contract"),
        "permanent" => Some("permanent"),
        _ => None,
    }
}

#[async_trait]
impl SearchProvider for Adzuna {
    fn name(&self) -> &str {
        NAME
    }

    fn capability(&self) -> Capability {
        Capability::TypedApi
    }

    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult> {
        let url = format!(
            "{}/v1/api/jobs/{}/search/{}",
            self.base_url,
            utf8_percent_encode(&self.country, NON_ALPHANUMERIC),
            query.page
        );
        let request = self.fetcher.client().get(&url).query(&self.params(query));

        let data: SearchResponse = self
            .fetcher
            .fetch_json(request)
            .await
            .map_err(|e| AppError::provider(NAME, e))?;

        let jobs: Vec<Job> = data
            .results
            .into_iter()
            .filter_map(|raw| self.normalize(raw))
            .collect();

        tracing::debug!("Adzuna returned {} jobs of {}", jobs.len(), data.count);
        Ok(JobSearchResult::new(NAME, jobs, data.count, query))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::Router;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use serde_json::json;

    use super::*;
    use crate::fetch::RetryPolicy;
    use crate::testing::serve;

    fn fetcher() -> RetryableFetcher {
        RetryableFetcher::new(
            reqwest::Client::new(),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
        )
    }

    fn sample_response() -> Value {
        json!({
            "count": 45,
            "results": [
                {
                    "id": "4412093",
                    "title": "Senior Rust Engineer",
                    "description": "Build trading systems.",
                    "redirect_url": "https://www.adzuna.co.uk/details/4412093",
                    "created": "2024-05-02T09:15:00Z",
                    "company": { "display_name": "Ferrous Ltd" },
                    "location": { "display_name": "London, UK" },
                    "salary_min": 85000.0,
                    "salary_max": 110000.0,
                    "contract_time": "full_time",
                    "category": { "label": "IT Jobs", "tag": "it-jobs" }
                },
                {
                    "id": 77,
                    "title": "Remote Platform Engineer",
                    "redirect_url": "https://www.adzuna.co.uk/details/77",
                    "location": { "display_name": "UK" }
                },
                { "id": "3", "description": "no title" },
                { "id": "4", "title": "No URL" }
            ]
        })
    }

    #[tokio::test]
    async fn test_search_normalizes_results() {
        let router = Router::new().route(
            "/v1/api/jobs/{country}/search/{page}",
            get(
                |Path((country, page)): Path<(String, u32)>,
                 Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(country, "gb");
                    assert_eq!(page, 2);
                    assert_eq!(params.get("what").map(String::as_str), Some("rust"));
                    assert_eq!(params.get("where").map(String::as_str), Some("London"));
                    assert_eq!(params.get("salary_min").map(String::as_str), Some("80000"));
                    assert_eq!(params.get("full_time").map(String::as_str), Some("1"));
                    axum::Json(sample_response())
                },
            ),
        );
        let base = serve(router).await;
        let provider = Adzuna::new(fetcher(), "id".into(), "key".into(), "GB".into())
            .with_base_url(base);

        let mut query = JobSearchQuery::new("rust").with_location("London");
        query.page = 2;
        query.salary_min = Some(80000);
        query.job_type = Some("Full-time".into());

        let result = provider.search(&query).await.unwrap();
        assert_eq!(result.jobs.len(), 2);
        assert_eq!(result.total_results, 45);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.sources, vec!["adzuna"]);

        let first = &result.jobs[0];
        assert_eq!(first.id, "adzuna_4412093");
        assert_eq!(first.company, "Ferrous Ltd");
        assert_eq!(first.job_type, "full-time");
        assert_eq!(first.category.as_deref(), Some("IT Jobs"));
        assert!(!first.remote);
        let salary = first.salary.as_ref().unwrap();
        assert_eq!(salary.min, Some(85000.0));
        assert_eq!(salary.currency.as_deref(), Some("GBP"));

        let second = &result.jobs[1];
        assert_eq!(second.id, "adzuna_77");
        assert_eq!(second.company, "");
        assert!(second.remote);
        assert!(second.salary.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_provider_error() {
        let router = Router::new().route(
            "/v1/api/jobs/{country}/search/{page}",
            get(|| async { (axum::http::StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = serve(router).await;
        let provider =
            Adzuna::new(fetcher(), "id".into(), "key".into(), "gb".into()).with_base_url(base);

        let err = provider.search(&JobSearchQuery::new("rust")).await.unwrap_err();
        assert!(matches!(err, AppError::Provider { ref provider, .. } if provider == "adzuna"));
    }

    #[test]
    fn test_contract_flag() {
        assert_eq!(contract_flag("Full-time"), Some("full_time"));
        assert_eq!(contract_flag("part time"), Some("part_time"));
        assert_eq!(contract_flag("internship"), None);
    }
}
