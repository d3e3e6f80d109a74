//! Stub providers for unit tests.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Capability, Job, JobSearchQuery, JobSearchResult};
use crate::providers::SearchProvider;

enum Behaviour {
    Jobs(Vec<Job>),
    Fail,
    Panic,
}

pub struct StubProvider {
    name: String,
    behaviour: Behaviour,
}

impl StubProvider {
    pub fn ok(name: &str, jobs: Vec<Job>) -> Self {
        Self {
            name: name.to_string(),
            behaviour: Behaviour::Jobs(jobs),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            behaviour: Behaviour::Fail,
        }
    }

    pub fn panicking(name: &str) -> Self {
        Self {
            name: name.to_string(),
            behaviour: Behaviour::Panic,
        }
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        Capability::TypedApi
    }

    async fn search(&self, query: &JobSearchQuery) -> Result<JobSearchResult> {
        match &self.behaviour {
            Behaviour::Jobs(jobs) => {
                let total = jobs.len() as u64;
                Ok(JobSearchResult::new(&self.name, jobs.clone(), total, query))
            }
            Behaviour::Fail => Err(AppError::provider(&self.name, "connection reset")),
            Behaviour::Panic => panic!("stub provider '{}' panicked", self.name),
        }
    }
}
