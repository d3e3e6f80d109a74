//! Background scrape queue.
//!
//! Scrapes are slow and hold a browser session, so the HTTP layer only
//! enqueues them. A single worker task drains the queue one request at a
//! time and records each ticket's outcome for later polling. Finished
//! tickets are kept for a retention window, then evicted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Job, JobSearchQuery};
use crate::search::Aggregator;

const QUEUE_CAPACITY: usize = 32;
const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);
/// Upper bound on finished tickets kept at once; oldest go first.
const MAX_FINISHED_TICKETS: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeStatus {
    Pending,
    Running,
    Completed { jobs: Vec<Job> },
    Failed { error: String },
}

impl ScrapeStatus {
    fn is_finished(&self) -> bool {
        matches!(self, ScrapeStatus::Completed { .. } | ScrapeStatus::Failed { .. })
    }
}

struct Ticket {
    status: ScrapeStatus,
    finished_at: Option<Instant>,
}

#[derive(Clone)]
struct Tickets {
    entries: Arc<RwLock<HashMap<Uuid, Ticket>>>,
    retention: Duration,
}

impl Tickets {
    fn new(retention: Duration) -> Self {
        Self {
            entries: Arc::default(),
            retention,
        }
    }

    fn expired(&self, ticket: &Ticket, now: Instant) -> bool {
        ticket
            .finished_at
            .is_some_and(|at| now.duration_since(at) > self.retention)
    }

    fn get(&self, id: Uuid) -> Option<ScrapeStatus> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&id)
            .filter(|t| !self.expired(t, Instant::now()))
            .map(|t| t.status.clone())
    }

    fn record(&self, id: Uuid, status: ScrapeStatus) {
        let now = Instant::now();
        let finished_at = status.is_finished().then_some(now);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            id,
            Ticket {
                status,
                finished_at,
            },
        );
        self.evict(&mut entries, now);
    }

    fn evict(&self, entries: &mut HashMap<Uuid, Ticket>, now: Instant) {
        entries.retain(|_, t| !self.expired(t, now));

        let mut finished: Vec<(Instant, Uuid)> = entries
            .iter()
            .filter_map(|(id, t)| t.finished_at.map(|at| (at, *id)))
            .collect();
        if finished.len() > MAX_FINISHED_TICKETS {
            finished.sort();
            let excess = finished.len() - MAX_FINISHED_TICKETS;
            for (_, id) in finished.into_iter().take(excess) {
                entries.remove(&id);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

struct Task {
    id: Uuid,
    query: JobSearchQuery,
}

/// Handle to the scrape worker. Cloning shares the same queue.
#[derive(Clone)]
pub struct ScrapeWorker {
    provider: String,
    aggregator: Aggregator,
    sender: mpsc::Sender<Task>,
    tickets: Tickets,
}

impl ScrapeWorker {
    /// Start the worker loop for the provider registered as `provider`.
    ///
    /// The loop exits once every handle has been dropped.
    pub fn spawn(aggregator: Aggregator, provider: impl Into<String>) -> Self {
        Self::spawn_with_retention(aggregator, provider, DEFAULT_RETENTION)
    }

    /// Like [`spawn`](Self::spawn), keeping finished tickets for `retention`.
    pub fn spawn_with_retention(
        aggregator: Aggregator,
        provider: impl Into<String>,
        retention: Duration,
    ) -> Self {
        let provider = provider.into();
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let tickets = Tickets::new(retention);

        tokio::spawn(run(
            aggregator.clone(),
            provider.clone(),
            receiver,
            tickets.clone(),
        ));

        Self {
            provider,
            aggregator,
            sender,
            tickets,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Queue a scrape and return its ticket.
    pub async fn submit(&self, query: JobSearchQuery) -> Result<Uuid> {
        query.validate()?;
        let enabled = self
            .aggregator
            .providers()
            .into_iter()
            .find(|p| p.name == self.provider)
            .ok_or_else(|| AppError::NotFound(format!("Provider '{}'", self.provider)))?
            .enabled;
        if !enabled {
            return Err(AppError::BadRequest(format!(
                "Provider '{}' is disabled",
                self.provider
            )));
        }

        // The ticket only exists once a queue slot is held.
        let permit = self
            .sender
            .reserve()
            .await
            .map_err(|_| AppError::Internal("scrape worker has stopped".to_string()))?;
        let id = Uuid::new_v4();
        self.tickets.record(id, ScrapeStatus::Pending);
        permit.send(Task { id, query });
        tracing::info!("Queued scrape {id} for '{}'", self.provider);
        Ok(id)
    }

    /// Current state of a ticket. Unknown and evicted tickets are `NotFound`.
    pub fn status(&self, id: Uuid) -> Result<ScrapeStatus> {
        self.tickets
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Scrape {id}")))
    }
}

async fn run(
    aggregator: Aggregator,
    provider: String,
    mut receiver: mpsc::Receiver<Task>,
    tickets: Tickets,
) {
    tracing::info!("Scrape worker started for '{provider}'");

    while let Some(Task { id, query }) = receiver.recv().await {
        tickets.record(id, ScrapeStatus::Running);

        // Own task: a panic surfaces as a JoinError.
        let handle = {
            let aggregator = aggregator.clone();
            let provider = provider.clone();
            tokio::spawn(async move { aggregator.search_provider(&provider, &query).await })
        };

        let status = match handle.await {
            Ok(Ok(result)) => {
                tracing::info!("Scrape {id} completed: {} jobs", result.jobs.len());
                ScrapeStatus::Completed { jobs: result.jobs }
            }
            Ok(Err(e)) => {
                tracing::error!("Scrape {id} failed: {e}");
                ScrapeStatus::Failed {
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Scrape {id} aborted: {e}");
                ScrapeStatus::Failed {
                    error: format!("scrape aborted: {e}"),
                }
            }
        };
        tickets.record(id, status);
    }

    tracing::info!("Scrape worker for '{provider}' stopped");
}
