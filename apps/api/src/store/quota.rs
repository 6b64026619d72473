//! Per-scope acceptance targets and counts.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::store::ScopeKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub accepted_count: u32,
    pub target: u32,
    pub complete: bool,
}

impl QuotaState {
    fn new(target: u32) -> Self {
        Self {
            accepted_count: 0,
            target,
            complete: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotaError {
    #[error("quota target must be at least 1")]
    InvalidTarget,

    #[error("quota for {scope} is already {existing}, refusing to change it to {requested}")]
    Misconfigured {
        scope: String,
        existing: u32,
        requested: u32,
    },

    #[error("no quota configured for {0}")]
    NotConfigured(String),
}

#[derive(Debug, Default)]
pub struct QuotaTracker {
    quotas: Mutex<HashMap<ScopeKey, QuotaState>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target for a scope. Re-configuring with the same target is a
    /// no-op; a different target is rejected.
    pub fn configure(&self, scope: &ScopeKey, target: u32) -> Result<QuotaState, QuotaError> {
        if target == 0 {
            return Err(QuotaError::InvalidTarget);
        }

        let mut quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        match quotas.get(scope) {
            Some(existing) if existing.target == target => Ok(*existing),
            Some(existing) => Err(QuotaError::Misconfigured {
                scope: scope.to_string(),
                existing: existing.target,
                requested: target,
            }),
            None => {
                let state = QuotaState::new(target);
                quotas.insert(scope.clone(), state);
                info!("Configured quota for {scope}: target {target}");
                Ok(state)
            }
        }
    }

    /// Returns the scope's quota, configuring `default_target` first if the
    /// scope has none. An existing target is never changed.
    pub fn ensure(&self, scope: &ScopeKey, default_target: u32) -> Result<QuotaState, QuotaError> {
        let mut quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = quotas.get(scope) {
            return Ok(*existing);
        }
        if default_target == 0 {
            return Err(QuotaError::InvalidTarget);
        }
        let state = QuotaState::new(default_target);
        quotas.insert(scope.clone(), state);
        info!("Applied default quota for {scope}: target {default_target}");
        Ok(state)
    }

    /// Records one acceptance. The read-modify-write happens under the lock.
    pub fn accept(&self, scope: &ScopeKey) -> Result<QuotaState, QuotaError> {
        let mut quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        let state = quotas
            .get_mut(scope)
            .ok_or_else(|| QuotaError::NotConfigured(scope.to_string()))?;

        let was_complete = state.complete;
        state.accepted_count += 1;
        state.complete = state.accepted_count >= state.target;
        if state.complete && !was_complete {
            info!(
                "Quota for {scope} met ({}/{})",
                state.accepted_count, state.target
            );
        }
        Ok(*state)
    }

    pub fn progress(&self, scope: &ScopeKey) -> Option<QuotaState> {
        let quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        quotas.get(scope).copied()
    }

    /// True only when every listed category of the job has met its quota.
    /// Unconfigured categories count as incomplete.
    pub fn all_complete<S: AsRef<str>>(&self, job_id: &str, categories: &[S]) -> bool {
        let quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        categories.iter().all(|category| {
            quotas
                .get(&ScopeKey::new(job_id, category.as_ref()))
                .is_some_and(|q| q.complete)
        })
    }

    /// Every configured category of a job, sorted by category name.
    pub fn job_progress(&self, job_id: &str) -> BTreeMap<String, QuotaState> {
        let quotas = self.quotas.lock().unwrap_or_else(PoisonError::into_inner);
        quotas
            .iter()
            .filter(|(scope, _)| scope.job_id == job_id)
            .map(|(scope, state)| (scope.category.clone(), *state))
            .collect()
    }
}
