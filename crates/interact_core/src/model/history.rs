//! Saved lookup history model.
//!
//! # Responsibility
//! - Define the persisted history row and the draft used to create one.
//! - Define the retention policy that bounds history size per user.
//!
//! # Invariants
//! - Retention limit is always at least 1.
//! - Entries are ordered newest first by `(created_at DESC, id DESC)`.

use crate::model::account::UserId;
use crate::model::interaction::{InteractionQuery, MockVerdict, NormalizedResult};
use serde::{Deserialize, Serialize};

/// Number of history entries kept per user after each save.
pub const DEFAULT_HISTORY_LIMIT: usize = 3;

/// Backend-assigned history row id.
pub type HistoryEntryId = i64;

/// One persisted history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,
    pub user_id: UserId,
    pub drug1: String,
    pub drug2: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Completed lookup waiting to be saved for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDraft {
    pub drug1: String,
    pub drug2: String,
    pub result: String,
    pub description: String,
}

impl HistoryDraft {
    /// Builds a draft from a backend lookup result.
    pub fn from_result(query: &InteractionQuery, result: &NormalizedResult) -> Self {
        Self {
            drug1: query.first.clone(),
            drug2: query.second.clone(),
            result: result.result.clone(),
            description: result.description.clone(),
        }
    }

    /// Builds a draft from the offline mock verdict.
    pub fn from_mock(query: &InteractionQuery, verdict: &MockVerdict) -> Self {
        Self {
            drug1: query.first.clone(),
            drug2: query.second.clone(),
            result: verdict.risk.clone(),
            description: verdict.description.clone(),
        }
    }
}

/// Most-recent-N retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    limit: usize,
}

impl RetentionPolicy {
    /// Creates a policy keeping `limit` entries; `0` is clamped to `1`.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Splits newest-first ids into the ids to delete.
    ///
    /// Keeps indices `[0, limit)` and returns the rest in the given order.
    pub fn overflow<'a>(&self, newest_first: &'a [HistoryEntryId]) -> &'a [HistoryEntryId] {
        if newest_first.len() > self.limit {
            &newest_first[self.limit..]
        } else {
            &[]
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::RetentionPolicy;

    #[test]
    fn overflow_keeps_leading_window() {
        let policy = RetentionPolicy::new(3);
        assert_eq!(policy.overflow(&[9, 8, 7, 6, 5]), &[6, 5]);
        assert!(policy.overflow(&[9, 8, 7]).is_empty());
        assert!(policy.overflow(&[]).is_empty());
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(RetentionPolicy::new(0).limit(), 1);
    }
}
