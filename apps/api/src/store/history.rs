//! Append-only record of every text shown for a scope, used to suppress
//! near-duplicates across generation rounds.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::ranking::similarity::{jaccard, normalize, trigrams, DUPLICATE_THRESHOLD};
use crate::store::ScopeKey;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub normalized_text: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct ScopeHistory {
    entries: Vec<HistoryEntry>,
    seen: HashSet<String>,
}

/// Entries are never mutated or removed; `normalized_text` is unique per scope.
#[derive(Debug, Default)]
pub struct HistoryStore {
    scopes: RwLock<HashMap<ScopeKey, ScopeHistory>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the normalised form of `text` unless it is already stored.
    /// Returns `true` when a new entry was written.
    pub fn record(&self, scope: &ScopeKey, text: &str) -> bool {
        let normalized_text = normalize(text);
        if normalized_text.is_empty() {
            return false;
        }

        let mut scopes = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
        let history = scopes.entry(scope.clone()).or_default();
        if !history.seen.insert(normalized_text.clone()) {
            return false;
        }
        history.entries.push(HistoryEntry {
            normalized_text,
            recorded_at: Utc::now(),
        });
        debug!(
            "History for {scope} now holds {} entries",
            history.entries.len()
        );
        true
    }

    /// True when `text` scores at or above the duplicate threshold against
    /// any stored entry. An unknown scope has no history and never matches.
    pub fn is_near_duplicate(&self, scope: &ScopeKey, text: &str) -> bool {
        let scopes = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        let Some(history) = scopes.get(scope) else {
            return false;
        };

        let normalized = normalize(text);
        if history.seen.contains(&normalized) {
            return !normalized.is_empty();
        }

        let grams = trigrams(&normalized);
        history
            .entries
            .iter()
            .any(|entry| jaccard(&grams, &trigrams(&entry.normalized_text)) >= DUPLICATE_THRESHOLD)
    }

    /// Snapshot of a scope's entries in insertion order.
    pub fn entries(&self, scope: &ScopeKey) -> Vec<HistoryEntry> {
        let scopes = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        scopes
            .get(scope)
            .map(|h| h.entries.clone())
            .unwrap_or_default()
    }
}
