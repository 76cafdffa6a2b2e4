//! Saved-lookup history use-cases.
//!
//! # Responsibility
//! - Save a completed lookup for the signed-in user and prune older rows.
//! - List and bulk-clear the signed-in user's history.
//!
//! # Invariants
//! - Without a resolved identity no insert, fetch or delete is issued.
//! - Save-and-prune is insert → fetch → delete, strictly in sequence and
//!   without a transaction: a failure after the insert leaves the new row in
//!   place, and the next successful save prunes whatever is left over.
//! - After a save whose prune step succeeds, at most `limit` rows remain and
//!   they are the newest by `(created_at DESC, id DESC)`.
//! - Concurrent saves from several sessions of one user may interleave their
//!   fetch/delete steps; no lock is held across them.

use crate::backend::{Backend, BackendError, Filter, JsonMap, SelectQuery, Table};
use crate::clock::now_epoch_ms;
use crate::model::account::UserIdentity;
use crate::model::history::{HistoryDraft, HistoryEntry, HistoryEntryId, RetentionPolicy};
use crate::search::interaction_search::json_kind;
use log::{error, info, warn};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Failure classes for history use-cases.
#[derive(Debug)]
pub enum HistoryError {
    /// No signed-in user, or the identity lookup itself failed.
    IdentityUnavailable(Option<BackendError>),
    /// Insert or delete refused by the store.
    WriteFailed(BackendError),
    /// Fetch refused by the store.
    QueryFailed(BackendError),
    /// Bulk clear was requested without user confirmation.
    NotConfirmed,
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityUnavailable(None) => write!(f, "no authenticated user"),
            Self::IdentityUnavailable(Some(err)) => {
                write!(f, "cannot resolve authenticated user: {err}")
            }
            Self::WriteFailed(err) => write!(f, "history write failed: {err}"),
            Self::QueryFailed(err) => write!(f, "history fetch failed: {err}"),
            Self::NotConfirmed => write!(f, "history clear was not confirmed"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IdentityUnavailable(Some(err)) | Self::WriteFailed(err) | Self::QueryFailed(err) => {
                Some(err)
            }
            Self::IdentityUnavailable(None) | Self::NotConfirmed => None,
        }
    }
}

/// User answer to the irreversible clear prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearConfirmation {
    Confirmed,
    Cancelled,
}

/// Outcome of a save that reached the store.
#[derive(Debug)]
pub struct SaveReport {
    /// Rows listed by the prune fetch minus rows this save deleted.
    pub kept: usize,
    /// Rows removed by this save.
    pub pruned: usize,
    /// Delete failure; the new entry is stored regardless.
    pub prune_error: Option<BackendError>,
}

/// History service over an injected backend.
pub struct HistoryService<B: Backend> {
    backend: B,
    policy: RetentionPolicy,
    clock: Box<dyn Fn() -> i64>,
}

impl<B: Backend> HistoryService<B> {
    /// Creates a service stamping entries with the wall clock.
    pub fn new(backend: B, policy: RetentionPolicy) -> Self {
        Self {
            backend,
            policy,
            clock: Box::new(now_epoch_ms),
        }
    }

    /// Replaces the timestamp source (epoch milliseconds).
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Saves `draft` for the signed-in user, then enforces the retention window.
    ///
    /// # Errors
    /// - `IdentityUnavailable`: nothing was written.
    /// - `WriteFailed`: the insert was refused; nothing was written.
    /// - `QueryFailed`: the insert succeeded but the prune fetch failed.
    ///
    /// A failed delete is reported in [`SaveReport::prune_error`].
    pub fn save_and_prune(&self, draft: &HistoryDraft) -> HistoryResult<SaveReport> {
        let user = self.require_user("save")?;
        let user_id = user.id.to_string();

        let mut row = JsonMap::new();
        row.insert("user_id".to_string(), json!(user_id));
        row.insert("drug1".to_string(), json!(draft.drug1));
        row.insert("drug2".to_string(), json!(draft.drug2));
        row.insert("result".to_string(), json!(draft.result));
        row.insert("description".to_string(), json!(draft.description));
        row.insert("created_at".to_string(), json!((self.clock)()));

        self.backend
            .insert(Table::InteractionHistory, &[row])
            .map_err(|err| {
                error!("event=history_save module=service status=error step=insert error={err}");
                HistoryError::WriteFailed(err)
            })?;

        let select = SelectQuery::new(Table::InteractionHistory)
            .columns(&["id", "created_at"])
            .filter(Filter::eq("user_id", user_id))
            .order("created_at", false)
            .order("id", false);
        let payload = self.backend.select(&select).map_err(|err| {
            error!("event=history_save module=service status=error step=fetch error={err}");
            HistoryError::QueryFailed(err)
        })?;

        let newest_first = decode_ids(payload);
        let overflow = self.policy.overflow(&newest_first);
        if overflow.is_empty() {
            info!(
                "event=history_save module=service status=ok kept={} pruned=0",
                newest_first.len()
            );
            return Ok(SaveReport {
                kept: newest_first.len(),
                pruned: 0,
                prune_error: None,
            });
        }

        let filter = Filter::is_in("id", overflow.iter().copied());
        match self.backend.delete(Table::InteractionHistory, &filter) {
            Ok(removed) => {
                let kept = newest_first.len().saturating_sub(removed);
                info!("event=history_save module=service status=ok kept={kept} pruned={removed}");
                Ok(SaveReport {
                    kept,
                    pruned: removed,
                    prune_error: None,
                })
            }
            Err(err) => {
                error!(
                    "event=history_save module=service status=partial step=prune pending={} error={err}",
                    overflow.len()
                );
                Ok(SaveReport {
                    kept: newest_first.len(),
                    pruned: 0,
                    prune_error: Some(err),
                })
            }
        }
    }

    /// Lists the signed-in user's history, newest first.
    pub fn list_history(&self) -> HistoryResult<Vec<HistoryEntry>> {
        let user = self.require_user("list")?;
        let select = SelectQuery::new(Table::InteractionHistory)
            .filter(Filter::eq("user_id", user.id.to_string()))
            .order("created_at", false)
            .order("id", false);

        let payload = self.backend.select(&select).map_err(|err| {
            error!("event=history_list module=service status=error error={err}");
            HistoryError::QueryFailed(err)
        })?;
        Ok(decode_entries(payload))
    }

    /// Deletes every history row of the signed-in user. Irreversible.
    ///
    /// Returns the number of removed rows.
    pub fn clear_history(&self, confirmation: ClearConfirmation) -> HistoryResult<usize> {
        if confirmation != ClearConfirmation::Confirmed {
            return Err(HistoryError::NotConfirmed);
        }

        let user = self.require_user("clear")?;
        let removed = self
            .backend
            .delete(
                Table::InteractionHistory,
                &Filter::eq("user_id", user.id.to_string()),
            )
            .map_err(|err| {
                error!("event=history_clear module=service status=error error={err}");
                HistoryError::WriteFailed(err)
            })?;

        info!("event=history_clear module=service status=ok removed={removed}");
        Ok(removed)
    }

    fn require_user(&self, action: &'static str) -> HistoryResult<UserIdentity> {
        match self.backend.current_user() {
            Ok(Some(user)) => Ok(user),
            Ok(None) => {
                warn!("event=history_{action} module=service status=error error_code=no_user");
                Err(HistoryError::IdentityUnavailable(None))
            }
            Err(err) => {
                error!(
                    "event=history_{action} module=service status=error error_code=identity_failed error={err}"
                );
                Err(HistoryError::IdentityUnavailable(Some(err)))
            }
        }
    }
}

fn decode_ids(payload: Value) -> Vec<HistoryEntryId> {
    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            warn!(
                "event=history_decode module=service status=degraded reason=non_array kind={}",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    rows.iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(Value::as_i64);
            if id.is_none() {
                warn!("event=history_decode module=service status=degraded reason=missing_id");
            }
            id
        })
        .collect()
}

fn decode_entries(payload: Value) -> Vec<HistoryEntry> {
    let rows = match payload {
        Value::Array(rows) => rows,
        other => {
            warn!(
                "event=history_decode module=service status=degraded reason=non_array kind={}",
                json_kind(&other)
            );
            return Vec::new();
        }
    };

    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<HistoryEntry>(row) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(
                    "event=history_decode module=service status=degraded reason=bad_row error={err}"
                );
                None
            }
        })
        .collect()
}
