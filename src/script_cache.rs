//! Cache of generated automation scripts.
//!
//! Scripts are keyed by element type plus a fingerprint of the page markup
//! they were generated against. There is no automatic invalidation: a
//! stale entry persists until `clear` is run, which trades correctness
//! drift for skipping a generation round-trip.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const STORE_FILE: &str = "script_cache.json";

/// One cached generated script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedScript {
    pub script: String,
    pub created_at: DateTime<Utc>,
    pub usage_count: u64,
}

/// Persistent script cache keyed by `"{element_type}::{fingerprint}"`
#[derive(Debug)]
pub struct ScriptCache {
    path: PathBuf,
    entries: HashMap<String, CachedScript>,
}

/// Fingerprint of page markup: SHA-256, hex, truncated. A wrong cache hit
/// just fails in the sandbox and falls through to generation.
pub fn fingerprint(markup: &str) -> String {
    let digest = Sha256::digest(markup.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

fn cache_key(element_type: &str, fingerprint: &str) -> String {
    format!("{}::{}", element_type, fingerprint)
}

impl ScriptCache {
    /// Load from `data_dir`; missing or corrupt stores start empty.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Script cache at {:?} is unreadable, starting empty: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        ScriptCache { path, entries }
    }

    /// Cached script text, bumping its usage count. Absence is a normal
    /// outcome, not a fault.
    pub fn lookup(&mut self, element_type: &str, fingerprint: &str) -> Option<String> {
        let entry = self.entries.get_mut(&cache_key(element_type, fingerprint))?;
        entry.usage_count += 1;
        Some(entry.script.clone())
    }

    /// Insert or overwrite; overwriting resets the usage count.
    pub fn store(&mut self, element_type: &str, fingerprint: &str, script: impl Into<String>) {
        self.entries.insert(
            cache_key(element_type, fingerprint),
            CachedScript {
                script: script.into(),
                created_at: Utc::now(),
                usage_count: 0,
            },
        );
    }

    /// Persist the cache. Losing it costs performance, not correctness,
    /// so failures are logged and swallowed.
    pub fn flush(&self) {
        if let Err(e) = self.try_flush() {
            warn!("Failed to persist script cache: {}", e);
        }
    }

    fn try_flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        debug!("Flushed script cache to {:?}", self.path);
        Ok(())
    }

    /// Drop every entry and persist the empty store. The only
    /// invalidation path.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.flush();
    }

    /// Number of cached scripts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full view of the cache, for the cache CLI
    pub fn snapshot(&self) -> &HashMap<String, CachedScript> {
        &self.entries
    }
}

#[cfg(test)]
#[path = "script_cache_test.rs"]
mod script_cache_test;
