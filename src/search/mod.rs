pub mod aggregator;
pub mod dedup;
pub mod scoring;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;

pub use aggregator::Aggregator;

use crate::error::Result;
use crate::models::{Job, JobSearchQuery, JobSearchResult};

/// Result of the [`search`](SearchService::search) entry point.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    /// Merged, deduplicated jobs from every enabled provider.
    Aggregated(Vec<Job>),
    /// The raw result of one named provider.
    Single(JobSearchResult),
}

impl SearchOutcome {
    pub fn jobs(&self) -> &[Job] {
        match self {
            SearchOutcome::Aggregated(jobs) => jobs,
            SearchOutcome::Single(result) => &result.jobs,
        }
    }
}

/// Entry point consumed by the outer layers (HTTP routes, CLI, worker).
#[derive(Clone)]
pub struct SearchService {
    aggregator: Aggregator,
}

impl SearchService {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Search one named provider, or all enabled providers when `provider` is `None`.
    pub async fn search(
        &self,
        query: &JobSearchQuery,
        provider: Option<&str>,
    ) -> Result<SearchOutcome> {
        query.validate()?;
        match provider {
            Some(name) => Ok(SearchOutcome::Single(
                self.aggregator.search_provider(name, query).await?,
            )),
            None => Ok(SearchOutcome::Aggregated(
                self.aggregator.search_all(query).await,
            )),
        }
    }

    /// Manual and resume search path: aggregate, boost by `keywords`, rank.
    ///
    /// Falls back to the query's own terms when no keywords are given.
    pub async fn search_boosted(
        &self,
        query: &JobSearchQuery,
        keywords: &[String],
    ) -> Result<Vec<Job>> {
        query.validate()?;
        let keywords = if keywords.iter().all(|k| k.trim().is_empty()) {
            query.terms()
        } else {
            keywords.to_vec()
        };

        let mut jobs = self.aggregator.search_all(query).await;
        scoring::boost_and_rank(&mut jobs, &keywords);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::AppError;
    use crate::models::job::fixtures::job;
    use crate::providers::ProviderRegistry;
    use super::testing::StubProvider;

    fn service() -> SearchService {
        let registry = ProviderRegistry::new();
        registry.register(
            Arc::new(StubProvider::ok(
                "alpha",
                vec![
                    job("alpha_1", "Office Manager", "Acme", "Remote", "spreadsheets"),
                    job("alpha_2", "Python Developer", "Acme", "Remote", "AWS lambdas"),
                ],
            )),
            true,
        );
        SearchService::new(Aggregator::new(Arc::new(registry)))
    }

    #[tokio::test]
    async fn test_search_dispatches_on_provider_name() {
        let svc = service();
        let q = JobSearchQuery::new("python");

        let all = svc.search(&q, None).await.unwrap();
        assert!(matches!(all, SearchOutcome::Aggregated(ref jobs) if jobs.len() == 2));

        let one = svc.search(&q, Some("alpha")).await.unwrap();
        assert!(matches!(one, SearchOutcome::Single(ref r) if r.sources == vec!["alpha"]));

        let missing = svc.search(&q, Some("beta")).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_query() {
        let err = service()
            .search(&JobSearchQuery::new(""), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_boosted_search_ranks_matches_first() {
        let svc = service();
        let keywords = vec!["python".to_string(), "aws".to_string()];
        let jobs = svc
            .search_boosted(&JobSearchQuery::new("developer"), &keywords)
            .await
            .unwrap();

        assert_eq!(jobs[0].id, "alpha_2");
        assert!((jobs[0].relevance_score.unwrap() - 0.8).abs() < 1e-9);
        assert!((jobs[1].relevance_score.unwrap() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_boosted_search_defaults_to_query_terms() {
        let jobs = service()
            .search_boosted(&JobSearchQuery::new("office"), &[])
            .await
            .unwrap();
        assert_eq!(jobs[0].id, "alpha_1");
    }
}
