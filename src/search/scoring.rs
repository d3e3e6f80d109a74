//! Relevance scoring.
//!
//! Two independent stages with their own arithmetic:
//!
//! * [`base_score`] rates a scraped listing from its raw text signals.
//! * [`boost`] raises an existing score on the manual and resume search paths.
//!
//! A scraped job can pass through both, in that order.

use crate::models::Job;

const BASE: f64 = 0.5;
const TITLE_MATCH_BONUS: f64 = 0.3;
const KEYWORD_WEIGHT: f64 = 0.2;
const SALARY_BONUS: f64 = 0.1;
const RECENCY_BONUS: f64 = 0.1;
const RECENCY_MARKERS: [&str; 3] = ["today", "1 day", "just posted"];

const BOOST_TITLE: f64 = 0.2;
const BOOST_DESCRIPTION: f64 = 0.1;

/// Raw listing text as seen on the page, before normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingSignals<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub salary_text: Option<&'a str>,
    pub posted_text: Option<&'a str>,
}

fn usable_keywords(keywords: &[String]) -> impl Iterator<Item = String> + '_ {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
}

/// Stage A: base score in [0, 1].
pub fn base_score(signals: &ListingSignals<'_>, job_title: &str, keywords: &[String]) -> f64 {
    let title = signals.title.to_lowercase();
    let description = signals.description.to_lowercase();
    let mut score = BASE;

    let wanted = job_title.trim().to_lowercase();
    if !wanted.is_empty() && title.contains(&wanted) {
        score += TITLE_MATCH_BONUS;
    }

    let keywords: Vec<String> = usable_keywords(keywords).collect();
    if !keywords.is_empty() {
        let matched = keywords
            .iter()
            .filter(|k| title.contains(k.as_str()) || description.contains(k.as_str()))
            .count();
        score += (matched as f64 / keywords.len() as f64) * KEYWORD_WEIGHT;
    }

    if signals.salary_text.is_some_and(|s| !s.trim().is_empty()) {
        score += SALARY_BONUS;
    }

    if let Some(posted) = signals.posted_text {
        let posted = posted.to_lowercase();
        if RECENCY_MARKERS.iter().any(|m| posted.contains(m)) {
            score += RECENCY_BONUS;
        }
    }

    score.min(1.0)
}

/// Stage B: raise the job's score (0.5 when unscored) for every keyword found
/// in its title and, separately, in its description.
pub fn boost(job: &mut Job, keywords: &[String]) {
    let title = job.title.to_lowercase();
    let description = job.description.to_lowercase();
    let mut score = job.score_or(BASE);

    for keyword in usable_keywords(keywords) {
        if title.contains(&keyword) {
            score += BOOST_TITLE;
        }
        if description.contains(&keyword) {
            score += BOOST_DESCRIPTION;
        }
    }

    job.set_score(score.min(1.0));
}

/// Boost every job and order them by descending score. The sort is stable, so
/// equal scores keep their merged order.
pub fn boost_and_rank(jobs: &mut [Job], keywords: &[String]) {
    for job in jobs.iter_mut() {
        boost(job, keywords);
    }
    jobs.sort_by(|a, b| b.score_or(0.0).total_cmp(&a.score_or(0.0)));
}
