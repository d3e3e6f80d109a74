use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::job::Job;

fn default_page() -> u32 {
    1
}

fn default_results_per_page() -> u32 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSearchQuery {
    pub keywords: String,
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,
}

impl JobSearchQuery {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: None,
            remote: false,
            salary_min: None,
            salary_max: None,
            job_type: None,
            category: None,
            page: default_page(),
            results_per_page: default_results_per_page(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.keywords.trim().is_empty() {
            return Err(AppError::BadRequest("keywords must not be empty".to_string()));
        }
        if self.page == 0 {
            return Err(AppError::BadRequest("page must be >= 1".to_string()));
        }
        if self.results_per_page == 0 {
            return Err(AppError::BadRequest(
                "results_per_page must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Individual search terms, split on whitespace and commas.
    pub fn terms(&self) -> Vec<String> {
        self.keywords
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect()
    }

    pub fn location_or_empty(&self) -> &str {
        self.location.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSearchResult {
    pub jobs: Vec<Job>,
    pub total_results: u64,
    pub page: u32,
    pub total_pages: u32,
    pub sources: Vec<String>,
}

impl JobSearchResult {
    /// An empty result tagged with the provider that produced it.
    pub fn empty(source: &str, page: u32) -> Self {
        Self {
            jobs: Vec::new(),
            total_results: 0,
            page,
            total_pages: 0,
            sources: vec![source.to_string()],
        }
    }

    pub fn new(source: &str, jobs: Vec<Job>, total_results: u64, query: &JobSearchQuery) -> Self {
        Self {
            jobs,
            total_results,
            page: query.page,
            total_pages: total_pages(total_results, query.results_per_page),
            sources: vec![source.to_string()],
        }
    }
}

pub fn total_pages(total_results: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    u32::try_from(total_results.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(JobSearchQuery::new("rust").validate().is_ok());
        assert!(JobSearchQuery::new("  ").validate().is_err());

        let mut q = JobSearchQuery::new("rust");
        q.page = 0;
        assert!(matches!(q.validate(), Err(AppError::BadRequest(_))));

        let mut q = JobSearchQuery::new("rust");
        q.results_per_page = 0;
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_terms() {
        let q = JobSearchQuery::new("Software  Engineer, Rust");
        assert_eq!(q.terms(), vec!["software", "engineer", "rust"]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(41, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(10, 3), 4);
        assert_eq!(total_pages(u64::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_query_defaults_from_json() {
        let q: JobSearchQuery = serde_json::from_str(r#"{"keywords":"rust"}"#).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.results_per_page, 20);
        assert!(!q.remote);
    }
}
