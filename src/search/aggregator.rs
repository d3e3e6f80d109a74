//! Concurrent fan-out across the enabled providers.

use std::sync::Arc;

use futures::future::join_all;
use tracing::Instrument;

use crate::error::{AppError, Result};
use crate::models::{Job, JobSearchQuery, JobSearchResult, ProviderDescriptor};
use crate::providers::ProviderRegistry;
use crate::search::dedup::deduplicate;

#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<ProviderRegistry>,
}

impl Aggregator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Query every enabled provider concurrently and merge the results.
    ///
    /// One task per provider; every task is awaited. A failing or panicking
    /// provider contributes an empty result, so this never fails because of a
    /// single source. Merged jobs keep registry order before deduplication.
    pub async fn search_all(&self, query: &JobSearchQuery) -> Vec<Job> {
        let providers = self.registry.enabled();
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("search_all", %request_id, keywords = %query.keywords);

        async {
            tracing::info!("Dispatching to {} providers", providers.len());

            let tasks = providers.into_iter().map(|provider| {
                let name = provider.name().to_string();
                let query = query.clone();
                let handle = tokio::spawn(
                    async move { provider.search(&query).await }.in_current_span(),
                );
                (name, handle)
            });
            let (names, handles): (Vec<_>, Vec<_>) = tasks.unzip();

            let settled = join_all(handles).await;

            let mut merged = Vec::new();
            for (name, outcome) in names.into_iter().zip(settled) {
                let result = match outcome {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => {
                        tracing::warn!("Provider '{name}' failed: {e}");
                        JobSearchResult::empty(&name, query.page)
                    }
                    Err(e) => {
                        tracing::error!("Provider '{name}' task aborted: {e}");
                        JobSearchResult::empty(&name, query.page)
                    }
                };
                tracing::debug!("Provider '{name}' contributed {} jobs", result.jobs.len());
                merged.extend(result.jobs);
            }

            let found = merged.len();
            let jobs = deduplicate(merged);
            tracing::info!("Merged {found} jobs into {} unique", jobs.len());
            jobs
        }
        .instrument(span)
        .await
    }

    /// Query one provider by exact name. Its errors propagate to the caller.
    pub async fn search_provider(
        &self,
        name: &str,
        query: &JobSearchQuery,
    ) -> Result<JobSearchResult> {
        let provider = self
            .registry
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Provider '{name}' not found")))?;
        provider.search(query).await
    }

    pub fn enable_provider(&self, name: &str) -> Result<()> {
        self.registry.enable(name)
    }

    pub fn disable_provider(&self, name: &str) -> Result<()> {
        self.registry.disable(name)
    }

    pub fn providers(&self) -> Vec<ProviderDescriptor> {
        self.registry.descriptors()
    }
}
