//! Selector fallback chains for the scraped listing page.
//!
//! Every field has an ordered list of CSS selectors; extraction takes the first
//! one that yields non-empty text. The chains can be overridden from TOML so a
//! markup change on the target only needs a config edit.

use std::fs;
use std::path::Path;

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Selector chains as written in config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorSet {
    /// One element per listing card
    pub listing: Vec<String>,
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    pub description: Vec<String>,
    pub salary: Vec<String>,
    pub posted_date: Vec<String>,
    /// Link to the listing's detail page (`href` is read)
    pub detail_link: Vec<String>,
    /// Attributes holding the target's own listing id, checked on the card then the link
    pub id_attributes: Vec<String>,
}

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            listing: chain(&[
                "div.job_seen_beacon",
                "div.cardOutline",
                "td.resultContent",
                "div[data-jk]",
                "a.tapItem",
                "li div.result",
            ]),
            title: chain(&[
                "h2.jobTitle span[title]",
                "h2.jobTitle a span",
                "h2.jobTitle",
                "a.jcs-JobTitle span",
                "[data-testid='jobTitle']",
            ]),
            company: chain(&[
                "span[data-testid='company-name']",
                "span.companyName",
                "span.company",
                "[data-testid='company-name']",
            ]),
            location: chain(&[
                "div[data-testid='text-location']",
                "div.companyLocation",
                "span.location",
            ]),
            description: chain(&[
                "div[data-testid='jobsnippet_footer'] ul",
                "div.job-snippet",
                "div.underShelfFooter",
                "table.jobCardShelfContainer",
            ]),
            salary: chain(&[
                "div.salary-snippet-container",
                "[data-testid='salary-snippet']",
                "span.estimated-salary",
                "div.metadata.salary-snippet-container",
            ]),
            posted_date: chain(&[
                "span[data-testid='myJobsStateDate']",
                "span.date",
                "span.posted-since",
            ]),
            detail_link: chain(&[
                "h2.jobTitle a",
                "a.jcs-JobTitle",
                "a[data-jk]",
                "a[href*='/viewjob']",
                "a[href*='/rc/clk']",
            ]),
            id_attributes: chain(&["data-jk", "data-job-id"]),
        }
    }
}

impl SelectorSet {
    /// Load selector overrides from a TOML file. Fields left out keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("selector file: {e}")))
    }

    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            listing: compile_chain(&self.listing)?,
            title: compile_chain(&self.title)?,
            company: compile_chain(&self.company)?,
            location: compile_chain(&self.location)?,
            description: compile_chain(&self.description)?,
            salary: compile_chain(&self.salary)?,
            posted_date: compile_chain(&self.posted_date)?,
            detail_link: compile_chain(&self.detail_link)?,
            id_attributes: self.id_attributes.clone(),
        })
    }
}

/// Parsed selector chains, ready for extraction.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub listing: Vec<Selector>,
    pub title: Vec<Selector>,
    pub company: Vec<Selector>,
    pub location: Vec<Selector>,
    pub description: Vec<Selector>,
    pub salary: Vec<Selector>,
    pub posted_date: Vec<Selector>,
    pub detail_link: Vec<Selector>,
    pub id_attributes: Vec<String>,
}

fn compile_chain(chain: &[String]) -> Result<Vec<Selector>> {
    chain.iter().map(|s| parse_selector(s)).collect()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
