use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::fetch::RetryableFetcher;
use crate::models::{Capability, Job, JobSearchQuery, JobSearchResult};
use crate::providers::SearchProvider;
use crate::providers::normalize::{id_to_string, infer_remote, non_empty, parse_posted_date};

const NAME: &str = "remotive";
const BASE_URL: &str = "https://remotive.com";

/// Remote-only source whose server-side search is loose, so results are
/// filtered again against the query terms and paginated locally.
pub struct Remotive {
    fetcher: RetryableFetcher,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs: Vec<RawJob>,
}

#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default)]
    id: Value,
    url: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    job_type: Option<String>,
    publication_date: Option<String>,
    candidate_required_location: Option<String>,
    description: Option<String>,
}

impl Remotive {
    pub fn new(fetcher: RetryableFetcher) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn normalize(raw: RawJob) -> Option<Job> {
        let title = non_empty(raw.title.as_deref())?;
        let url = non_empty(raw.url.as_deref())?;
        let source_id = id_to_string(&raw.id)?;
        let description = raw.description.unwrap_or_default();

        Some(Job {
            id: format!("{NAME}_{source_id}"),
            remote: infer_remote(Some(true), &title, &description),
            title,
            company: raw.company_name.unwrap_or_default(),
            location: raw
                .candidate_required_location
                .unwrap_or_else(|| "Remote".to_string()),
            description,
            url,
            source: NAME.to_string(),
            posted_date: parse_posted_date(raw.publication_date.as_deref()),
            job_type: raw
                .job_type
                .filter(|t| !t.is_empty())
                .map(|t| t.replace('_', "-"))
                .unwrap_or_else(|| "full-time".to_string()),
            category: raw.category,
            tags: raw.tags.into_iter().map(|t| t.to_lowercase()).collect(),
            // Remotive only publishes free-text salaries.
            salary: None,
            relevance_score: None,
        })
    }
}

/// A job survives when any term occurs in its title, description or tags.
fn matches_terms(job: &Job, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();
    terms.iter().any(|term| {
        title.contains(term)
            || description.contains(term)
            || job.tags.iter().any(|tag| tag.contains(term))
    })
}

#[async_trait]
impl SearchProvider for Remotive {
    fn name(&self) -> &str {
        NAME
    }

    fn capability(&self) -> Capability {
        Capability::TypedApi
    }

    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult> {
        let mut params = vec![("search", query.keywords.clone())];
        if let Some(category) = non_empty(query.category.as_deref()) {
            params.push(("category", category));
        }
        let request = self
            .fetcher
            .client()
            .get(format!("{}/api/remote-jobs", self.base_url))
            .query(&params);

        let data: SearchResponse = self
            .fetcher
            .fetch_json(request)
            .await
            .map_err(|e| AppError::provider(NAME, e))?;

        let terms = query.terms();
        let matched: Vec<Job> = data
            .jobs
            .into_iter()
            .filter_map(Self::normalize)
            .filter(|job| matches_terms(job, &terms))
            .collect();

        let total = matched.len() as u64;
        let per_page = query.results_per_page as usize;
        let offset = (query.page.saturating_sub(1) as usize) * per_page;
        let jobs = matched.into_iter().skip(offset).take(per_page).collect();

        Ok(JobSearchResult::new(NAME, jobs, total, query))
    }
}
