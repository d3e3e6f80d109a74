// Provider module.
// Defines the capability contract shared by every job source and the
// closed set of production sources.

pub mod adzuna;
pub mod jooble;
pub mod normalize;
pub mod registry;
pub mod remotive;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::RetryableFetcher;
use crate::models::{Capability, JobSearchQuery, JobSearchResult};
use crate::scraping::IndeedScraper;

pub use registry::ProviderRegistry;

/// Trait that all job sources must implement.
/// Each provider queries one external source and returns normalized jobs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Unique registry key, also used as the `source` of every job it emits.
    fn name(&self) -> &str;

    fn capability(&self) -> Capability;

    /// Query the source. Network and parse failures surface as `AppError::Provider`.
    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult>;
}

/// The production provider variants. Add a source by adding a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Adzuna,
    Remotive,
    Jooble,
    Indeed,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Adzuna,
        ProviderKind::Remotive,
        ProviderKind::Jooble,
        ProviderKind::Indeed,
    ];

    /// Instantiate the provider and report whether it starts enabled.
    pub fn build(
        self,
        config: &Config,
        fetcher: &RetryableFetcher,
    ) -> Result<(Arc<dyn SearchProvider>, bool)> {
        let built: (Arc<dyn SearchProvider>, bool) = match self {
            ProviderKind::Adzuna => {
                let credentials = config.adzuna_credentials();
                let enabled = credentials.is_some();
                let (app_id, app_key) = credentials.unwrap_or_default();
                (
                    Arc::new(adzuna::Adzuna::new(
                        fetcher.clone(),
                        app_id,
                        app_key,
                        config.adzuna_country.clone(),
                    )),
                    enabled,
                )
            }
            ProviderKind::Remotive => (Arc::new(remotive::Remotive::new(fetcher.clone())), true),
            ProviderKind::Jooble => {
                let key = config.jooble_api_key.clone().unwrap_or_default();
                let enabled = !key.is_empty();
                (Arc::new(jooble::Jooble::new(fetcher.clone(), key)), enabled)
            }
            ProviderKind::Indeed => (
                Arc::new(IndeedScraper::from_config(config)?),
                config.scraper_enabled,
            ),
        };
        Ok(built)
    }
}

/// Build the registry holding every production provider.
pub fn build_registry(config: &Config) -> Result<ProviderRegistry> {
    let fetcher = RetryableFetcher::with_policy(config.retry_policy())?;
    let registry = ProviderRegistry::new();
    for kind in ProviderKind::ALL {
        let (provider, enabled) = kind.build(config, &fetcher)?;
        if !enabled {
            tracing::info!("Provider '{}' registered but disabled", provider.name());
        }
        registry.register(provider, enabled);
    }
    Ok(registry)
}
