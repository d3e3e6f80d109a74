use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized job posting. Created once per raw provider record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Provider-prefixed identifier, e.g. `adzuna_4412093`.
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    /// Name of the provider the record came from.
    pub source: String,
    pub posted_date: DateTime<Utc>,
    pub remote: bool,
    pub job_type: String,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub salary: Option<Salary>,
    pub relevance_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Salary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    /// Pay period such as `year`, `month` or `hour`.
    pub period: Option<String>,
}

impl Salary {
    /// Build a salary only when the source supplied at least one bound.
    pub fn from_bounds(
        min: Option<f64>,
        max: Option<f64>,
        currency: Option<String>,
        period: Option<String>,
    ) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Self {
            min,
            max,
            currency,
            period,
        })
    }
}

impl Job {
    /// Set the relevance score, clamped into [0, 1].
    pub fn set_score(&mut self, score: f64) {
        self.relevance_score = Some(score.clamp(0.0, 1.0));
    }

    pub fn score_or(&self, default: f64) -> f64 {
        self.relevance_score.unwrap_or(default)
    }
}
