// In-process backing storage for suggestion history, acceptance quotas and
// accepted bullets. Every store is keyed by (job_id, category) and safe to
// share across tasks.

pub mod accepted;
pub mod history;
pub mod quota;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use accepted::{AcceptedBullet, AcceptedStore};
pub use history::HistoryStore;
pub use quota::{QuotaError, QuotaState, QuotaTracker};

/// A (job_id, category) pair. Every piece of pipeline state is scoped by one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    pub job_id: String,
    pub category: String,
}

impl ScopeKey {
    pub fn new(job_id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            category: category.into(),
        }
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job_id, self.category)
    }
}
