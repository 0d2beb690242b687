//! Selector success-rate learning.
//!
//! Tracks which selectors actually worked per element type so the
//! interaction orchestrator can try proven ones before the shipped
//! defaults. This is frequency/recency bookkeeping, not a trained model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Learned selectors below this success rate are not promoted ahead of the
/// defaults. Tunable policy, not a hard law.
pub const MIN_LEARNED_SUCCESS_RATE: f64 = 0.3;

const STORE_FILE: &str = "selector_stats.json";

/// Success statistics for one (element type, selector) pair.
///
/// The success rate is always derived from the two counters; it is never
/// stored, so the counters and the rate cannot drift apart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorRecord {
    pub success_count: u64,
    pub failure_count: u64,
    pub last_used: Option<DateTime<Utc>>,
}

impl SelectorRecord {
    /// successes / attempts, 0.0 when never attempted
    pub fn success_rate(&self) -> f64 {
        let attempts = self.success_count + self.failure_count;
        if attempts == 0 {
            0.0
        } else {
            self.success_count as f64 / attempts as f64
        }
    }
}

/// Persistent per-element-type selector statistics.
///
/// One store per process, loaded at startup and flushed after each
/// completed search. Records are never deleted.
#[derive(Debug)]
pub struct SelectorLearner {
    path: PathBuf,
    records: HashMap<String, HashMap<String, SelectorRecord>>,
}

impl SelectorLearner {
    /// Load the store from `data_dir`, tolerating a missing file (start
    /// empty) and a corrupt one (warn and start empty).
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(STORE_FILE);
        let records = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Selector store at {:?} is unreadable, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        SelectorLearner { path, records }
    }

    /// Record one interaction attempt. Creates the record if absent;
    /// always succeeds.
    pub fn record_outcome(&mut self, element_type: &str, selector: &str, succeeded: bool) {
        let entry = self
            .records
            .entry(element_type.to_string())
            .or_default()
            .entry(selector.to_string())
            .or_default();

        entry.last_used = Some(Utc::now());
        if succeeded {
            entry.success_count += 1;
        } else {
            entry.failure_count += 1;
        }
    }

    /// Selectors to attempt, in order: proven ones (rate above the
    /// threshold, best and most recent first), then the caller's defaults
    /// minus anything already promoted.
    pub fn prioritize(&self, element_type: &str, defaults: &[&str]) -> Vec<String> {
        let mut learned: Vec<(&String, &SelectorRecord)> = self
            .records
            .get(element_type)
            .map(|by_selector| {
                by_selector
                    .iter()
                    .filter(|(_, record)| record.success_rate() > MIN_LEARNED_SUCCESS_RATE)
                    .collect()
            })
            .unwrap_or_default();

        learned.sort_by(|a, b| {
            b.1.success_rate()
                .partial_cmp(&a.1.success_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.last_used.cmp(&a.1.last_used))
        });

        let mut prioritized: Vec<String> = learned.iter().map(|(s, _)| (*s).clone()).collect();
        for default in defaults {
            if !prioritized.iter().any(|s| s == default) {
                prioritized.push((*default).to_string());
            }
        }

        prioritized
    }

    /// Persist the full store. Called once per completed search, never
    /// per mutation.
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write selector store to {:?}", self.path))?;
        debug!("Flushed selector statistics to {:?}", self.path);
        Ok(())
    }

    /// All statistics for one element type, for the stats CLI
    pub fn records_for(&self, element_type: &str) -> Option<&HashMap<String, SelectorRecord>> {
        self.records.get(element_type)
    }

    /// Full view of the store, for the stats CLI
    pub fn snapshot(&self) -> &HashMap<String, HashMap<String, SelectorRecord>> {
        &self.records
    }
}

#[cfg(test)]
#[path = "learner_test.rs"]
mod learner_test;
