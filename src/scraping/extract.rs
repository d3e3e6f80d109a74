//! Listing extraction from a rendered results page.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use url::Url;

use crate::models::{Job, Salary};
use crate::providers::normalize::{infer_remote, squash_whitespace, truncate_chars};
use crate::scraping::selectors::CompiledSelectors;

pub const MAX_TITLE_CHARS: usize = 300;
pub const MAX_COMPANY_CHARS: usize = 200;
pub const MAX_LOCATION_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

static SALARY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kK])?").expect("valid salary regex"));
static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\+?\s*days?").expect("valid days regex"));
static HOURS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\+?\s*hours?").expect("valid hours regex"));

/// Raw text pulled from one listing card, already length-capped.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedListing {
    pub listing_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub salary_text: Option<String>,
    pub posted_text: Option<String>,
    pub url: String,
}

impl ScrapedListing {
    pub fn into_job(self, source: &str, job_type: &str, score: f64) -> Job {
        let salary = self.salary_text.as_deref().and_then(parse_salary);
        let posted_date = parse_relative_date(self.posted_text.as_deref(), Utc::now());
        let mut job = Job {
            id: format!("{source}_{}", self.listing_id),
            remote: infer_remote(None, &self.title, &self.description)
                || self.location.to_lowercase().contains("remote"),
            title: self.title,
            company: self.company,
            location: self.location,
            description: self.description,
            url: self.url,
            source: source.to_string(),
            posted_date,
            job_type: job_type.to_string(),
            category: None,
            tags: Default::default(),
            salary,
            relevance_score: None,
        };
        job.set_score(score);
        job
    }
}

/// Extract every complete listing from `html`.
///
/// Listing containers are tried in order and the first selector that matches
/// anything wins. A card is skipped unless its title, company and a stable id
/// all resolve. No match at all is an empty result, not an error.
pub fn extract_listings(
    html: &str,
    selectors: &CompiledSelectors,
    base_url: &Url,
) -> Vec<ScrapedListing> {
    let document = Html::parse_document(html);

    let cards: Vec<ElementRef<'_>> = selectors
        .listing
        .iter()
        .map(|sel| document.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    let mut skipped = 0usize;
    let listings: Vec<ScrapedListing> = cards
        .iter()
        .filter_map(|card| {
            let listing = extract_card(card, selectors, base_url);
            if listing.is_none() {
                skipped += 1;
            }
            listing
        })
        .collect();

    tracing::debug!(
        "Extracted {} listings from {} cards ({skipped} incomplete)",
        listings.len(),
        cards.len()
    );
    listings
}

fn extract_card(
    card: &ElementRef<'_>,
    selectors: &CompiledSelectors,
    base_url: &Url,
) -> Option<ScrapedListing> {
    let title = first_text(card, &selectors.title)?;
    let company = first_text(card, &selectors.company)?;

    let link = first_link(card, &selectors.detail_link);
    let href = link.and_then(|a| a.value().attr("href")).map(str::trim);
    let resolved = href
        .filter(|h| !h.is_empty())
        .and_then(|h| base_url.join(h).ok());

    let attr_id = selectors.id_attributes.iter().find_map(|attr| {
        card.value()
            .attr(attr)
            .or_else(|| link.and_then(|a| a.value().attr(attr)))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    });

    let listing_id = attr_id
        .or_else(|| resolved.as_ref().and_then(|u| query_param(u, "jk")))
        .or_else(|| resolved.as_ref().map(digest_id))?;

    let url = match resolved {
        Some(u) => u.to_string(),
        None => base_url
            .join(&format!("/viewjob?jk={listing_id}"))
            .map(|u| u.to_string())
            .ok()?,
    };

    Some(ScrapedListing {
        listing_id,
        title: truncate_chars(&title, MAX_TITLE_CHARS),
        company: truncate_chars(&company, MAX_COMPANY_CHARS),
        location: first_text(card, &selectors.location)
            .map(|l| truncate_chars(&l, MAX_LOCATION_CHARS))
            .unwrap_or_default(),
        description: first_text(card, &selectors.description)
            .map(|d| truncate_chars(&d, MAX_DESCRIPTION_CHARS))
            .unwrap_or_default(),
        salary_text: first_text(card, &selectors.salary),
        posted_text: first_text(card, &selectors.posted_date),
        url,
    })
}

/// First selector in the chain whose first match has non-empty text.
fn first_text(card: &ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    chain.iter().find_map(|sel| {
        card.select(sel).find_map(|el| {
            let text = squash_whitespace(&el.text().collect::<Vec<_>>().join(" "));
            (!text.is_empty()).then_some(text)
        })
    })
}

fn first_link<'a>(card: &ElementRef<'a>, chain: &[Selector]) -> Option<ElementRef<'a>> {
    chain.iter().find_map(|sel| {
        card.select(sel)
            .find(|el| el.value().attr("href").is_some_and(|h| !h.trim().is_empty()))
    })
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// Stable id derived from the detail URL when the page exposes none.
fn digest_id(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    hex::encode(&digest[..8])
}

/// Parse salary text such as "$80,000 - $120,000 a year" or "£45K".
pub fn parse_salary(text: &str) -> Option<Salary> {
    let numbers: Vec<f64> = SALARY_NUMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let value: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            Some(if caps.get(2).is_some() { value * 1000.0 } else { value })
        })
        .collect();

    let min = numbers.first().copied();
    let max = numbers.get(1).copied();

    let currency = if text.contains('$') {
        Some("USD")
    } else if text.contains('£') {
        Some("GBP")
    } else if text.contains('€') {
        Some("EUR")
    } else {
        None
    };

    let lower = text.to_lowercase();
    let period = [
        ("hour", "hour"),
        ("day", "day"),
        ("week", "week"),
        ("month", "month"),
        ("year", "year"),
        ("annum", "year"),
    ]
    .iter()
    .find(|(marker, _)| lower.contains(marker))
    .map(|(_, period)| period.to_string());

    Salary::from_bounds(min, max, currency.map(String::from), period)
}

/// Resolve "Posted 3 days ago", "Today", "Just posted" and similar to a date.
pub fn parse_relative_date(text: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(text) = text else {
        return now;
    };
    let lower = text.to_lowercase();
    if lower.contains("just posted") || lower.contains("today") {
        return now;
    }
    if let Some(days) = capture_number(&DAYS_AGO, &lower) {
        return now - Duration::days(days);
    }
    if let Some(hours) = capture_number(&HOURS_AGO, &lower) {
        return now - Duration::hours(hours);
    }
    now
}

fn capture_number(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}
