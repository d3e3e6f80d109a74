//! Collapses duplicate postings across providers.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::models::Job;

/// Exact, case-folded identity of a posting. Whitespace and punctuation are
/// compared as-is, so "Engineer" and "Engineer " stay distinct.
fn dedup_key(job: &Job) -> (String, String, String) {
    (
        job.title.to_lowercase(),
        job.company.to_lowercase(),
        job.location.to_lowercase(),
    )
}

/// Remove duplicates, keeping the posting with the longer description.
///
/// On a collision the survivor takes the slot of the first-seen posting; ties
/// keep the first-seen one.
pub fn deduplicate(jobs: Vec<Job>) -> Vec<Job> {
    let mut slots: Vec<Job> = Vec::with_capacity(jobs.len());
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();

    for job in jobs {
        match index.entry(dedup_key(&job)) {
            Entry::Occupied(e) => {
                let existing = &mut slots[*e.get()];
                if job.description.chars().count() > existing.description.chars().count() {
                    tracing::trace!("Duplicate '{}' replaced by {}", existing.id, job.id);
                    *existing = job;
                }
            }
            Entry::Vacant(e) => {
                e.insert(slots.len());
                slots.push(job);
            }
        }
    }

    slots
}
