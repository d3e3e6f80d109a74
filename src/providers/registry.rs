use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{AppError, Result};
use crate::models::ProviderDescriptor;
use crate::providers::SearchProvider;

struct Entry {
    provider: Arc<dyn SearchProvider>,
    enabled: AtomicBool,
}

/// The set of known providers and their enabled state.
///
/// Enabled flags are plain atomics: toggles are last-write-wins and a search
/// already in flight keeps the membership it snapshotted.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing any existing one with the same name.
    pub fn register(&self, provider: Arc<dyn SearchProvider>, enabled: bool) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = Entry {
            provider,
            enabled: AtomicBool::new(enabled),
        };
        match entries
            .iter()
            .position(|e| e.provider.name() == entry.provider.name())
        {
            Some(idx) => entries[idx] = entry,
            None => entries.push(entry),
        }
    }

    pub fn enable(&self, name: &str) -> Result<()> {
        self.set_enabled(name, true)
    }

    pub fn disable(&self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .iter()
            .find(|e| e.provider.name() == name)
            .ok_or_else(|| AppError::NotFound(format!("Provider '{name}' not found")))?;
        entry.enabled.store(enabled, Ordering::Relaxed);
        tracing::info!(
            "Provider '{name}' {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Exact-name lookup, regardless of enabled state.
    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchProvider>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .find(|e| e.provider.name() == name)
            .map(|e| e.provider.clone())
    }

    /// Snapshot of the currently enabled providers, in registration order.
    pub fn enabled(&self) -> Vec<Arc<dyn SearchProvider>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| e.enabled.load(Ordering::Relaxed))
            .map(|e| e.provider.clone())
            .collect()
    }

    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .map(|e| ProviderDescriptor {
                name: e.provider.name().to_string(),
                enabled: e.enabled.load(Ordering::Relaxed),
                capability: e.provider.capability(),
            })
            .collect()
    }
}
