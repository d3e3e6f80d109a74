//! Anti-detection settings applied to every browser session.

use std::time::Duration;

use rand::Rng;

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// Sub-requests aborted to cut load time and detection surface.
///
/// Patterns match the whole URL, so each one is open-ended to also catch
/// cache-busting query strings such as `main.css?v=3`.
pub const BLOCKED_URL_PATTERNS: [&str; 10] = [
    "*.css*", "*.png*", "*.jpg*", "*.jpeg*", "*.gif*", "*.webp*", "*.svg*", "*.ico*", "*.woff*",
    "*/images/*",
];

/// Chrome pref that stops image loads regardless of URL shape (2 = block).
pub const IMAGES_CONTENT_SETTING: &str = "profile.managed_default_content_settings.images";

/// Runs before any page script and hides the usual automation tells.
pub const INIT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// Per-session browser identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthProfile {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
    pub accept_encoding: &'static str,
    pub blocked_url_patterns: &'static [&'static str],
    pub init_script: &'static str,
}

impl StealthProfile {
    /// Pick a user agent from the pool for a new session.
    pub fn random() -> Self {
        let idx = rand::rng().random_range(0..USER_AGENTS.len());
        Self::with_user_agent(USER_AGENTS[idx])
    }

    pub fn with_user_agent(user_agent: &'static str) -> Self {
        Self {
            user_agent,
            accept_language: ACCEPT_LANGUAGE,
            accept_encoding: ACCEPT_ENCODING,
            blocked_url_patterns: &BLOCKED_URL_PATTERNS,
            init_script: INIT_SCRIPT,
        }
    }
}

/// Randomized pause between navigation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 3000,
        }
    }
}

impl DelayRange {
    pub const NONE: DelayRange = DelayRange { min_ms: 0, max_ms: 0 };

    pub fn sample(&self) -> Duration {
        let (lo, hi) = (self.min_ms.min(self.max_ms), self.min_ms.max(self.max_ms));
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!("Waiting {}ms before next step", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_profile_uses_pool() {
        for _ in 0..20 {
            let profile = StealthProfile::random();
            assert!(USER_AGENTS.contains(&profile.user_agent));
            assert!(profile.init_script.contains("webdriver"));
            assert!(profile.blocked_url_patterns.contains(&"*.css*"));
        }
    }

    /// `*` matches any run of characters, as in CDP `Network.setBlockedURLs`.
    fn wildcard_match(pattern: &str, url: &str) -> bool {
        match pattern.split_once('*') {
            None => pattern == url,
            Some((head, rest)) => {
                url.starts_with(head)
                    && (head.len()..=url.len())
                        .filter(|i| url.is_char_boundary(*i))
                        .any(|i| wildcard_match(rest, &url[i..]))
            }
        }
    }

    fn blocked(url: &str) -> bool {
        BLOCKED_URL_PATTERNS.iter().any(|p| wildcard_match(p, url))
    }

    #[test]
    fn test_blocked_patterns_cover_versioned_assets() {
        assert!(blocked("https://www.indeed.com/static/main.css"));
        assert!(blocked("https://www.indeed.com/static/main.css?v=3"));
        assert!(blocked("https://cdn.example/logo.png?w=64&h=64"));
        assert!(blocked("https://cdn.example/font.woff2"));
        assert!(blocked("https://www.indeed.com/images/hero"));

        assert!(!blocked("https://www.indeed.com/jobs?q=rust&l=Remote"));
        assert!(!blocked("https://www.indeed.com/viewjob?jk=abc"));
        assert!(!blocked("https://www.indeed.com/"));
    }

    #[test]
    fn test_delay_within_range() {
        let range = DelayRange::default();
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(3000));
        }
        assert!(DelayRange::NONE.sample().is_zero());
    }
}
