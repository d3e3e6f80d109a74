use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::fetch::RetryableFetcher;
use crate::models::{Capability, Job, JobSearchQuery, JobSearchResult};
use crate::providers::SearchProvider;
use crate::providers::normalize::{
    id_to_string, infer_remote, non_empty, parse_posted_date, squash_whitespace,
};

const NAME: &str = "jooble";
const BASE_URL: &str = "https://jooble.org";

/// POST-based source. The search call has no side effects upstream, so it is
/// retried like a GET.
pub struct Jooble {
    fetcher: RetryableFetcher,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    keywords: &'a str,
    location: &'a str,
    page: String,
    #[serde(rename = "ResultOnPage")]
    result_on_page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    salary: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    jobs: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    id: Value,
    title: Option<String>,
    location: Option<String>,
    snippet: Option<String>,
    #[serde(rename = "type")]
    job_type: Option<String>,
    link: Option<String>,
    company: Option<String>,
    updated: Option<String>,
}

impl Jooble {
    pub fn new(fetcher: RetryableFetcher, api_key: String) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn normalize(raw: RawJob) -> Option<Job> {
        let title = non_empty(raw.title.as_deref()).map(|t| squash_whitespace(&t))?;
        let url = non_empty(raw.link.as_deref())?;
        let source_id = id_to_string(&raw.id)?;
        let description = raw
            .snippet
            .map(|s| squash_whitespace(&s))
            .unwrap_or_default();

        Some(Job {
            id: format!("{NAME}_{source_id}"),
            remote: infer_remote(None, &title, &description),
            title,
            company: raw.company.unwrap_or_default(),
            location: raw.location.unwrap_or_default(),
            description,
            url,
            source: NAME.to_string(),
            posted_date: parse_posted_date(raw.updated.as_deref()),
            job_type: non_empty(raw.job_type.as_deref())
                .map(|t| t.to_lowercase())
                .unwrap_or_else(|| "full-time".to_string()),
            category: None,
            tags: Default::default(),
            // Jooble reports salaries as free text only.
            salary: None,
            relevance_score: None,
        })
    }
}

#[async_trait]
impl SearchProvider for Jooble {
    fn name(&self) -> &str {
        NAME
    }

    fn capability(&self) -> Capability {
        Capability::TypedApi
    }

    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult> {
        let keywords = if query.remote {
            format!("{} remote", query.keywords)
        } else {
            query.keywords.clone()
        };
        let body = SearchRequest {
            keywords: &keywords,
            location: query.location_or_empty(),
            page: query.page.to_string(),
            result_on_page: query.results_per_page.to_string(),
            salary: query.salary_min,
        };
        let url = format!(
            "{}/api/{}",
            self.base_url,
            utf8_percent_encode(&self.api_key, NON_ALPHANUMERIC)
        );
        let request = self.fetcher.client().post(url).json(&body);

        let data: SearchResponse = self
            .fetcher
            .fetch_json(request)
            .await
            .map_err(|e| AppError::provider(NAME, e))?;

        let jobs = data.jobs.into_iter().filter_map(Self::normalize).collect();
        Ok(JobSearchResult::new(NAME, jobs, data.total_count, query))
    }
}
