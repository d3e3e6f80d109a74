//! Browser-driven Indeed provider.
//!
//! One call walks a fixed sequence of states:
//!
//! ```text
//! Init -> SessionWarmup -> NavigateSearch -> BlockCheck -> Extract -> Done
//!                                                 \
//!                                                  -> Blocked
//! ```
//!
//! Each call owns exactly one browser session, closed on every exit path
//! including cancellation of the call itself.

pub mod browser;
pub mod extract;
pub mod selectors;
pub mod stealth;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Capability, Job, JobSearchQuery, JobSearchResult};
use crate::providers::SearchProvider;
use crate::search::scoring::{ListingSignals, base_score};

pub use browser::{BrowserLauncher, BrowserPage, BrowserSession, WebDriverLauncher};
pub use extract::{ScrapedListing, extract_listings};
pub use selectors::{CompiledSelectors, SelectorSet};
pub use stealth::{DelayRange, StealthProfile};

const NAME: &str = "indeed";
const BASE_URL: &str = "https://www.indeed.com";
const NAVIGATION_TIMEOUT_SECS: u64 = 30;
const RESULTS_PER_PAGE: u32 = 10;
const DEFAULT_MAX_RESULTS: usize = 25;
const DEFAULT_JOB_TYPE: &str = "full-time";

const BLOCK_TITLE_MARKERS: [&str; 7] = [
    "just a moment",
    "attention required",
    "access denied",
    "security check",
    "blocked",
    "captcha",
    "verify",
];
const BLOCK_CONTENT_MARKERS: [&str; 7] = [
    "cf-challenge",
    "challenge-form",
    "g-recaptcha",
    "h-captcha",
    "verify you are human",
    "unusual traffic from your",
    "request blocked",
];

/// What to scrape for.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub job_title: String,
    pub keywords: Vec<String>,
    pub location: String,
    pub remote: bool,
    /// Employment type stamped on every scraped job
    pub job_type: String,
    /// Results offset on the target (multiples of its page size).
    pub start: u32,
    pub max_results: usize,
}

impl ScrapeRequest {
    pub fn from_query(query: &JobSearchQuery, max_results: usize) -> Self {
        Self {
            job_title: query.keywords.trim().to_string(),
            keywords: query.terms(),
            location: query.location_or_empty().to_string(),
            remote: query.remote,
            job_type: query
                .job_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string()),
            start: (query.page.saturating_sub(1)) * RESULTS_PER_PAGE,
            max_results: max_results.min(query.results_per_page as usize),
        }
    }
}

#[derive(Debug)]
enum ScrapeState {
    Init,
    SessionWarmup,
    NavigateSearch,
    BlockCheck,
    Extract { html: String },
    Done { listings: Vec<ScrapedListing> },
    Blocked { signal: String },
}

impl ScrapeState {
    fn label(&self) -> &'static str {
        match self {
            ScrapeState::Init => "init",
            ScrapeState::SessionWarmup => "session_warmup",
            ScrapeState::NavigateSearch => "navigate_search",
            ScrapeState::BlockCheck => "block_check",
            ScrapeState::Extract { .. } => "extract",
            ScrapeState::Done { .. } => "done",
            ScrapeState::Blocked { .. } => "blocked",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub navigation_timeout: Duration,
    pub step_delay: DelayRange,
    pub max_results: usize,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            navigation_timeout: Duration::from_secs(NAVIGATION_TIMEOUT_SECS),
            step_delay: DelayRange::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

pub struct IndeedScraper {
    launcher: Arc<dyn BrowserLauncher>,
    selectors: Arc<CompiledSelectors>,
    settings: ScraperSettings,
}

impl IndeedScraper {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        selectors: &SelectorSet,
        settings: ScraperSettings,
    ) -> Result<Self> {
        Url::parse(&settings.base_url)
            .map_err(|e| AppError::Config(format!("scraper base url: {e}")))?;
        Ok(Self {
            launcher,
            selectors: Arc::new(selectors.compile()?),
            settings,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let selectors = match &config.selectors_file {
            Some(path) => SelectorSet::load(path)?,
            None => SelectorSet::default(),
        };
        let settings = ScraperSettings {
            max_results: config.scrape_max_results,
            ..ScraperSettings::default()
        };
        Self::new(
            Arc::new(WebDriverLauncher::new(config.webdriver_url.clone())),
            &selectors,
            settings,
        )
    }

    pub fn max_results(&self) -> usize {
        self.settings.max_results
    }

    /// Run one scrape in its own browser session.
    ///
    /// Returns at most `request.max_results` jobs, each carrying its base
    /// relevance score. A block page or a navigation timeout fails the call.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<Vec<Job>> {
        let profile = StealthProfile::random();
        tracing::debug!("Launching browser session as '{}'", profile.user_agent);
        let session = BrowserSession::new(self.launcher.launch(&profile).await?);

        let outcome = AssertUnwindSafe(self.drive(session.page()?, request))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {e}");
        }

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn drive(&self, page: &dyn BrowserPage, request: &ScrapeRequest) -> Result<Vec<Job>> {
        let base_url = Url::parse(&self.settings.base_url)
            .map_err(|e| AppError::Config(format!("scraper base url: {e}")))?;
        let mut state = ScrapeState::Init;

        loop {
            tracing::debug!(state = state.label(), "Scrape step");
            state = match state {
                ScrapeState::Init => ScrapeState::SessionWarmup,
                ScrapeState::SessionWarmup => {
                    self.navigate(page, base_url.as_str()).await?;
                    self.settings.step_delay.pause().await;
                    ScrapeState::NavigateSearch
                }
                ScrapeState::NavigateSearch => {
                    let url = search_url(&base_url, request)?;
                    self.navigate(page, url.as_str()).await?;
                    self.settings.step_delay.pause().await;
                    ScrapeState::BlockCheck
                }
                ScrapeState::BlockCheck => {
                    let title = page.title().await?;
                    let html = page.content().await?;
                    match detect_block(&title, &html, request) {
                        Some(signal) => ScrapeState::Blocked {
                            signal: signal.to_string(),
                        },
                        None => ScrapeState::Extract { html },
                    }
                }
                ScrapeState::Extract { html } => ScrapeState::Done {
                    listings: extract_listings(&html, &self.selectors, &base_url),
                },
                ScrapeState::Done { listings } => {
                    let jobs = finish(listings, request);
                    tracing::info!("Scraped {} jobs from {NAME}", jobs.len());
                    return Ok(jobs);
                }
                ScrapeState::Blocked { signal } => {
                    tracing::warn!("{NAME} served a block page ({signal})");
                    return Err(AppError::blocked(NAME, signal));
                }
            };
        }
    }

    async fn navigate(&self, page: &dyn BrowserPage, url: &str) -> Result<()> {
        tokio::time::timeout(self.settings.navigation_timeout, page.goto(url))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "navigation to {url} exceeded {}s",
                    self.settings.navigation_timeout.as_secs_f64()
                ))
            })?
    }
}

fn search_url(base_url: &Url, request: &ScrapeRequest) -> Result<Url> {
    let mut url = base_url
        .join("/jobs")
        .map_err(|e| AppError::Internal(format!("search url: {e}")))?;
    let q = if request.remote {
        format!("{} remote", request.job_title)
    } else {
        request.job_title.clone()
    };
    url.query_pairs_mut()
        .append_pair("q", &q)
        .append_pair("l", &request.location);
    if request.start > 0 {
        url.query_pairs_mut()
            .append_pair("start", &request.start.to_string());
    }
    Ok(url)
}

/// Look for block or verification signals in the page title and body.
///
/// Results-page titles echo the search text, so the query is cut out of the
/// title before the title markers are checked.
fn detect_block(title: &str, html: &str, request: &ScrapeRequest) -> Option<&'static str> {
    let title = strip_query_echo(&title.to_lowercase(), request);
    if let Some(marker) = BLOCK_TITLE_MARKERS.iter().find(|m| title.contains(*m)) {
        return Some(*marker);
    }
    let html = html.to_lowercase();
    BLOCK_CONTENT_MARKERS
        .iter()
        .find(|m| html.contains(*m))
        .copied()
}

fn strip_query_echo(title: &str, request: &ScrapeRequest) -> String {
    let phrase = request.job_title.trim().to_lowercase();
    let mut stripped = if phrase.is_empty() {
        title.to_string()
    } else {
        title.replace(&phrase, " ")
    };
    for term in &request.keywords {
        let term = term.trim().to_lowercase();
        if !term.is_empty() {
            stripped = stripped.replace(&term, " ");
        }
    }
    stripped
}

/// Score every listing, keep page order, cap at the requested maximum.
fn finish(listings: Vec<ScrapedListing>, request: &ScrapeRequest) -> Vec<Job> {
    listings
        .into_iter()
        .take(request.max_results)
        .map(|listing| {
            let score = base_score(
                &ListingSignals {
                    title: &listing.title,
                    description: &listing.description,
                    salary_text: listing.salary_text.as_deref(),
                    posted_text: listing.posted_text.as_deref(),
                },
                &request.job_title,
                &request.keywords,
            );
            listing.into_job(NAME, &request.job_type, score)
        })
        .collect()
}

#[async_trait]
impl SearchProvider for IndeedScraper {
    fn name(&self) -> &str {
        NAME
    }

    fn capability(&self) -> Capability {
        Capability::Scraping
    }

    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult> {
        let request = ScrapeRequest::from_query(query, self.settings.max_results);
        let jobs = self.scrape(&request).await?;
        let total = jobs.len() as u64;
        Ok(JobSearchResult::new(NAME, jobs, total, query))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const RESULTS: &str = r#"
    <html><body>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a data-jk="j1" href="/viewjob?jk=j1">Rust Engineer</a></h2>
        <span data-testid="company-name">Ferrous</span>
        <div data-testid="text-location">Remote</div>
        <div class="job-snippet">Tokio and Rust services</div>
        <span class="date">Just posted</span>
      </div>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a data-jk="j2" href="/viewjob?jk=j2">Go Developer</a></h2>
        <span data-testid="company-name">Gopher Co</span>
      </div>
      <div class="job_seen_beacon">
        <h2 class="jobTitle"><a data-jk="j3" href="/viewjob?jk=j3">Orphan Listing</a></h2>
      </div>
    </body></html>"#;

    #[derive(Clone, Copy)]
    enum Mode {
        Results,
        QueryEcho,
        Blocked,
        Hang,
        Panic,
    }

    #[derive(Default)]
    struct Shared {
        visited: Mutex<Vec<String>>,
        launched: AtomicUsize,
        closed: AtomicUsize,
    }

    struct FixturePage {
        mode: Mode,
        shared: Arc<Shared>,
    }

    #[async_trait]
    impl BrowserPage for FixturePage {
        async fn goto(&self, url: &str) -> Result<()> {
            self.shared.visited.lock().unwrap().push(url.to_string());
            if matches!(self.mode, Mode::Hang) && url.contains("/jobs") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(())
        }

        async fn title(&self) -> Result<String> {
            Ok(match self.mode {
                Mode::Blocked => "Just a moment...".to_string(),
                Mode::QueryEcho => "Security Check Officer Jobs, Employment | Indeed.com".to_string(),
                _ => "Rust Jobs | Indeed".to_string(),
            })
        }

        async fn content(&self) -> Result<String> {
            match self.mode {
                Mode::Panic => panic!("renderer crashed"),
                _ => Ok(RESULTS.to_string()),
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.shared.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FixtureLauncher {
        mode: Mode,
        shared: Arc<Shared>,
    }

    #[async_trait]
    impl BrowserLauncher for FixtureLauncher {
        async fn launch(&self, _profile: &StealthProfile) -> Result<Box<dyn BrowserPage>> {
            self.shared.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FixturePage {
                mode: self.mode,
                shared: self.shared.clone(),
            }))
        }
    }

    fn scraper(mode: Mode) -> (IndeedScraper, Arc<Shared>) {
        let shared = Arc::new(Shared::default());
        let launcher = Arc::new(FixtureLauncher {
            mode,
            shared: shared.clone(),
        });
        let settings = ScraperSettings {
            base_url: "https://www.indeed.com".to_string(),
            navigation_timeout: Duration::from_secs(30),
            step_delay: DelayRange::NONE,
            max_results: 10,
        };
        let scraper = IndeedScraper::new(launcher, &SelectorSet::default(), settings).unwrap();
        (scraper, shared)
    }

    fn request() -> ScrapeRequest {
        ScrapeRequest {
            job_title: "rust engineer".to_string(),
            keywords: vec!["rust".to_string(), "tokio".to_string()],
            location: "Remote".to_string(),
            remote: false,
            job_type: "full-time".to_string(),
            start: 0,
            max_results: 10,
        }
    }

    #[tokio::test]
    async fn test_warmup_then_search_then_extract() {
        let (scraper, shared) = scraper(Mode::Results);
        let jobs = scraper.scrape(&request()).await.unwrap();

        let visited = shared.visited.lock().unwrap().clone();
        assert_eq!(visited[0], "https://www.indeed.com/");
        assert_eq!(
            visited[1],
            "https://www.indeed.com/jobs?q=rust+engineer&l=Remote"
        );

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "indeed_j1");
        assert_eq!(jobs[0].source, "indeed");
        assert!(jobs[0].remote);
        // 0.5 + title 0.3 + both keywords 0.2 + recency 0.1, clamped
        assert_eq!(jobs[0].relevance_score, Some(1.0));
        // no title match, no keywords, no salary or recency
        assert_eq!(jobs[1].relevance_score, Some(0.5));
        assert!(jobs.iter().all(|j| !j.company.is_empty()));

        assert_eq!(shared.launched.load(Ordering::SeqCst), 1);
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_max_results_caps_output() {
        let (scraper, _) = scraper(Mode::Results);
        let mut req = request();
        req.max_results = 1;
        let jobs = scraper.scrape(&req).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "indeed_j1");
    }

    #[tokio::test]
    async fn test_block_page_is_terminal_and_session_closed() {
        let (scraper, shared) = scraper(Mode::Blocked);
        let err = scraper.scrape(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::Blocked { ref signal, .. } if signal == "just a moment"));
        assert_eq!(shared.visited.lock().unwrap().len(), 2);
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_timeout_is_fatal() {
        let (scraper, shared) = scraper(Mode::Hang);
        let err = scraper.scrape(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_released_when_caller_gives_up() {
        let (scraper, shared) = scraper(Mode::Hang);
        let outcome =
            tokio::time::timeout(Duration::from_millis(100), scraper.scrape(&request())).await;
        assert!(outcome.is_err());

        // release happens on a background task
        for _ in 0..20 {
            if shared.closed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(shared.launched.load(Ordering::SeqCst), 1);
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closed_when_drive_panics() {
        let (scraper, shared) = scraper(Mode::Panic);
        let outcome = AssertUnwindSafe(scraper.scrape(&request()))
            .catch_unwind()
            .await;
        assert!(outcome.is_err());
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_provider_contract() {
        let (scraper, _) = scraper(Mode::Results);
        let mut query = JobSearchQuery::new("rust engineer").with_location("Remote");
        query.results_per_page = 5;
        let result = scraper.search(&query).await.unwrap();
        assert_eq!(result.sources, vec!["indeed"]);
        assert_eq!(result.total_results, 2);
        assert_eq!(scraper.capability(), Capability::Scraping);
    }

    #[tokio::test]
    async fn test_query_words_in_title_are_not_a_block() {
        let (scraper, shared) = scraper(Mode::QueryEcho);
        let req = ScrapeRequest {
            job_title: "security check officer".to_string(),
            keywords: vec![
                "security".to_string(),
                "check".to_string(),
                "officer".to_string(),
            ],
            ..request()
        };
        let jobs = scraper.scrape(&req).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(shared.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detect_block() {
        let req = request();
        assert_eq!(detect_block("Access Denied", "", &req), Some("access denied"));
        assert_eq!(
            detect_block("Indeed", "<div id=\"cf-challenge-running\"></div>", &req),
            Some("cf-challenge")
        );
        assert_eq!(detect_block("Rust Jobs | Indeed", RESULTS, &req), None);

        let captcha = ScrapeRequest {
            job_title: "captcha annotator".to_string(),
            keywords: vec!["captcha".to_string(), "annotator".to_string()],
            ..request()
        };
        assert_eq!(
            detect_block("Captcha Annotator Jobs | Indeed.com", RESULTS, &captcha),
            None
        );
        // a genuine challenge is still caught by its content
        assert_eq!(
            detect_block(
                "Captcha Annotator Jobs | Indeed.com",
                "<form id=\"challenge-form\"></form>",
                &captcha
            ),
            Some("challenge-form")
        );
        // title markers outside the echoed query still count
        assert_eq!(
            detect_block("Security Check Officer - Access Denied", "", &req),
            Some("access denied")
        );
    }

    #[test]
    fn test_request_from_query() {
        let mut query = JobSearchQuery::new("data engineer").with_location("NYC");
        query.page = 3;
        query.remote = true;
        query.results_per_page = 50;
        let req = ScrapeRequest::from_query(&query, 25);
        assert_eq!(req.job_title, "data engineer");
        assert_eq!(req.job_type, "full-time");
        assert_eq!(req.keywords, vec!["data", "engineer"]);
        assert_eq!(req.start, 20);
        assert_eq!(req.max_results, 25);

        let url = search_url(&Url::parse(BASE_URL).unwrap(), &req).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.indeed.com/jobs?q=data+engineer+remote&l=NYC&start=20"
        );
    }
}
