use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobscout::config::{Command, Config};
use jobscout::models::JobSearchQuery;
use jobscout::providers::build_registry;
use jobscout::routes::{self, AppState};
use jobscout::search::{Aggregator, SearchService};
use jobscout::worker::ScrapeWorker;

const SCRAPE_PROVIDER: &str = "indeed";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobscout=info,tower_http=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // LOG_FORMAT=json for structured output
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::parse();

    let registry = build_registry(&config)?;
    let aggregator = Aggregator::new(Arc::new(registry));
    for provider in aggregator.providers() {
        tracing::info!(
            "Provider '{}' ({:?}) enabled={}",
            provider.name,
            provider.capability,
            provider.enabled
        );
    }
    let service = SearchService::new(aggregator.clone());

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            let state = AppState {
                service,
                worker: ScrapeWorker::spawn(aggregator, SCRAPE_PROVIDER),
            };
            let app = routes::router(state)
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {listen_addr}");
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    tokio::signal::ctrl_c().await.ok();
                    tracing::info!("Shutdown signal received, exiting gracefully");
                })
                .await?;
        }
        Command::Search {
            keywords,
            location,
            provider,
            remote,
            page,
            results_per_page,
            boost,
        } => {
            let mut query = JobSearchQuery::new(keywords);
            query.location = location;
            query.remote = remote;
            query.page = page;
            query.results_per_page = results_per_page;

            let output = if boost.is_empty() {
                serde_json::to_string_pretty(&service.search(&query, provider.as_deref()).await?)?
            } else {
                if provider.is_some() {
                    tracing::warn!("--provider is ignored when --boost is given");
                }
                serde_json::to_string_pretty(&service.search_boosted(&query, &boost).await?)?
            };
            println!("{output}");
        }
    }

    Ok(())
}
