use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::fetch::RetryPolicy;

#[derive(Parser, Debug, Clone)]
#[command(name = "jobscout", about = "Multi-source job search aggregator")]
pub struct Config {
    /// Adzuna application id
    #[arg(long, env = "ADZUNA_APP_ID")]
    pub adzuna_app_id: Option<String>,

    /// Adzuna application key
    #[arg(long, env = "ADZUNA_APP_KEY")]
    pub adzuna_app_key: Option<String>,

    /// Adzuna country code (gb, us, de, ...)
    #[arg(long, env = "ADZUNA_COUNTRY", default_value = "gb")]
    pub adzuna_country: String,

    /// Jooble API key
    #[arg(long, env = "JOOBLE_API_KEY")]
    pub jooble_api_key: Option<String>,

    /// Enable the browser-driven Indeed provider
    #[arg(long, env = "SCRAPER_ENABLED", default_value = "false")]
    pub scraper_enabled: bool,

    /// WebDriver endpoint (chromedriver) used by the scraping provider
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// TOML file overriding the scraper's selector fallback chains
    #[arg(long, env = "SELECTORS_FILE")]
    pub selectors_file: Option<PathBuf>,

    /// Maximum listings returned by one scrape
    #[arg(long, env = "SCRAPE_MAX_RESULTS", default_value = "25")]
    pub scrape_max_results: usize,

    /// Total attempts per typed-provider HTTP call
    #[arg(long, env = "FETCH_MAX_RETRIES", default_value = "3")]
    pub fetch_max_retries: u32,

    /// Linear retry delay unit in milliseconds
    #[arg(long, env = "FETCH_RETRY_DELAY_MS", default_value = "1000")]
    pub fetch_retry_delay_ms: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP API (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Run one search and print the jobs as JSON
    Search {
        /// Search keywords
        keywords: String,

        #[arg(long)]
        location: Option<String>,

        /// Only query this provider
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        remote: bool,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        results_per_page: u32,

        /// Boost and rank by these keywords (manual search path)
        #[arg(long, value_delimiter = ',')]
        boost: Vec<String>,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn adzuna_credentials(&self) -> Option<(String, String)> {
        match (&self.adzuna_app_id, &self.adzuna_app_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => {
                Some((id.clone(), key.clone()))
            }
            _ => None,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.fetch_max_retries,
            base_delay: Duration::from_millis(self.fetch_retry_delay_ms),
        }
    }
}
