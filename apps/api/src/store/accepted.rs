//! Accepted bullets, kept verbatim per scope so a finished job can be
//! assembled from them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::format::AmotParts;
use crate::store::ScopeKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedBullet {
    pub suggestion_id: Uuid,
    /// Exactly as offered, not normalised.
    pub text: String,
    pub components: AmotParts,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct AcceptedStore {
    scopes: RwLock<HashMap<ScopeKey, Vec<AcceptedBullet>>>,
}

impl AcceptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, scope: &ScopeKey, bullet: AcceptedBullet) {
        let mut scopes = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
        scopes.entry(scope.clone()).or_default().push(bullet);
    }

    /// Accepted bullets of every category of a job, in acceptance order
    /// within each category.
    pub fn for_job(&self, job_id: &str) -> BTreeMap<String, Vec<AcceptedBullet>> {
        let scopes = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        scopes
            .iter()
            .filter(|(scope, _)| scope.job_id == job_id)
            .map(|(scope, bullets)| (scope.category.clone(), bullets.clone()))
            .collect()
    }
}
