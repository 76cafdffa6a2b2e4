//! Core logic for the food/drug interaction checker.
//! Every surface (mobile FFI, CLI) goes through these services.

pub mod backend;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod search;
pub mod service;

pub use backend::{
    AuthBackend, AuthFailure, Backend, BackendError, BackendResult, Filter, JsonMap, OrderBy,
    SelectQuery, SqliteBackend, Table,
};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{Profile, UserId, UserIdentity, FALLBACK_USERNAME};
pub use model::history::{
    HistoryDraft, HistoryEntry, HistoryEntryId, RetentionPolicy, DEFAULT_HISTORY_LIMIT,
};
pub use model::interaction::{
    InteractionQuery, InteractionRecord, MockVerdict, NormalizedResult, QueryValidationError,
};
pub use service::account_service::{AccountError, AccountResult, AccountService};
pub use service::history_service::{
    ClearConfirmation, HistoryError, HistoryResult, HistoryService, SaveReport,
};
pub use service::interaction_service::{
    mock_check, InteractionService, LookupError, LookupResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
