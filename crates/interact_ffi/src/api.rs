//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose account, interaction lookup and history use-cases to Dart via FRB.
//! - Flatten core errors into response envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens its own connection to the configured store; the signed-in
//!   session lives in the store, not in this process.
//! - Messages never echo passwords.

use interact_core::db::open_db;
use interact_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    mock_check as mock_check_inner, ping as ping_inner, AccountService, ClearConfirmation,
    CoreConfig, HistoryDraft, HistoryEntry, HistoryError, HistoryService, InteractionQuery,
    InteractionService, NormalizedResult, SqliteBackend,
};
use log::warn;
use rusqlite::Connection;
use std::sync::OnceLock;

static CONFIG: OnceLock<CoreConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// One interaction shown in the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionItem {
    pub result: String,
    pub description: String,
    pub drug: Option<String>,
    pub food: Option<String>,
}

/// Lookup response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResponse {
    /// Matches in display order (empty on no hits or failure).
    pub items: Vec<InteractionItem>,
    /// `false` only when the lookup itself failed.
    pub ok: bool,
    pub message: String,
}

impl InteractionResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            ok: false,
            message: message.into(),
        }
    }
}

/// Offline mock verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCheckResponse {
    pub ok: bool,
    pub risk: Option<String>,
    pub message: String,
}

/// One saved lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: i64,
    pub drug1: String,
    pub drug2: String,
    pub result: Option<String>,
    pub description: Option<String>,
    pub created_at_epoch_ms: i64,
}

/// History list response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryListResponse {
    /// Newest first.
    pub items: Vec<HistoryItem>,
    pub ok: bool,
    pub message: String,
}

/// Registers a user. The new user still has to sign in.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_up(email: String, password: String, username: String) -> ActionResponse {
    match with_store(|conn| {
        AccountService::new(SqliteBackend::new(conn))
            .sign_up(&email, &password, &username)
            .map_err(|err| err.to_string())
    }) {
        Ok(_) => ActionResponse::success("Sign up successful. Please log in."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Signs in and persists the session in the store.
#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_in(email: String, password: String) -> ActionResponse {
    match with_store(|conn| {
        AccountService::new(SqliteBackend::new(conn))
            .sign_in(&email, &password)
            .map_err(|err| err.to_string())
    }) {
        Ok(_) => ActionResponse::success("Signed in."),
        Err(err) => ActionResponse::failure(err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn auth_sign_out() -> ActionResponse {
    match with_store(|conn| {
        AccountService::new(SqliteBackend::new(conn))
            .sign_out()
            .map_err(|err| err.to_string())
    }) {
        Ok(()) => ActionResponse::success("Signed out."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Display name of the signed-in user; `"User"` whenever it cannot be resolved.
#[flutter_rust_bridge::frb(sync)]
pub fn current_username() -> String {
    with_store(|conn| Ok(AccountService::new(SqliteBackend::new(conn)).display_username()))
        .unwrap_or_else(|err| {
            warn!("event=ffi_username module=ffi status=degraded error={err}");
            interact_core::FALLBACK_USERNAME.to_string()
        })
}

/// Free-text search across every interaction column.
///
/// Blank text returns an empty successful response without touching the store.
#[flutter_rust_bridge::frb(sync)]
pub fn interaction_search(text: String) -> InteractionResponse {
    if text.trim().is_empty() {
        return lookup_response(Ok(Vec::new()));
    }
    lookup_response(with_store(|conn| {
        InteractionService::new(SqliteBackend::new(conn))
            .search_interactions(&text)
            .map_err(|err| err.to_string())
    }))
}

/// Looks up rows mentioning both inputs.
#[flutter_rust_bridge::frb(sync)]
pub fn interaction_check(first: String, second: String) -> InteractionResponse {
    let query = InteractionQuery::new(first, second);
    if let Err(err) = query.validate() {
        return InteractionResponse::failure(err.to_string());
    }
    lookup_response(with_store(|conn| {
        InteractionService::new(SqliteBackend::new(conn))
            .lookup_pair(&query)
            .map_err(|err| err.to_string())
    }))
}

/// Offline mock check; never touches the store.
#[flutter_rust_bridge::frb(sync)]
pub fn interaction_mock_check(first: String, second: String) -> MockCheckResponse {
    match mock_check_inner(&InteractionQuery::new(first, second)) {
        Ok(verdict) => MockCheckResponse {
            ok: true,
            risk: Some(verdict.risk),
            message: verdict.description,
        },
        Err(err) => MockCheckResponse {
            ok: false,
            risk: None,
            message: err.to_string(),
        },
    }
}

/// Saves a completed lookup for the signed-in user and prunes older entries.
///
/// A failed prune still reports success; the next save retries it.
#[flutter_rust_bridge::frb(sync)]
pub fn history_save(
    drug1: String,
    drug2: String,
    result: String,
    description: String,
) -> ActionResponse {
    let query = InteractionQuery::new(drug1, drug2);
    if let Err(err) = query.validate() {
        return ActionResponse::failure(err.to_string());
    }
    let draft = HistoryDraft::from_result(
        &query,
        &NormalizedResult {
            result,
            description,
            drug: None,
            food: None,
        },
    );

    match with_store(|conn| {
        history_service(conn)
            .save_and_prune(&draft)
            .map_err(|err| history_message(&err))
    }) {
        Ok(report) if report.prune_error.is_some() => {
            ActionResponse::success("Saved to history. Older entries will be cleaned up later.")
        }
        Ok(_) => ActionResponse::success("Saved to history."),
        Err(err) => ActionResponse::failure(err),
    }
}

/// Lists the signed-in user's history, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn history_list() -> HistoryListResponse {
    match with_store(|conn| {
        history_service(conn)
            .list_history()
            .map_err(|err| history_message(&err))
    }) {
        Ok(entries) => {
            let items = entries.into_iter().map(to_history_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No history yet.".to_string()
            } else {
                format!("{} saved lookup(s).", items.len())
            };
            HistoryListResponse {
                items,
                ok: true,
                message,
            }
        }
        Err(err) => HistoryListResponse {
            items: Vec::new(),
            ok: false,
            message: err,
        },
    }
}

/// Deletes all history of the signed-in user.
///
/// `confirmed` must carry the user's answer to the irreversible-action prompt;
/// `false` makes no store call.
#[flutter_rust_bridge::frb(sync)]
pub fn history_clear(confirmed: bool) -> ActionResponse {
    if !confirmed {
        return ActionResponse::failure(HistoryError::NotConfirmed.to_string());
    }

    match with_store(|conn| {
        history_service(conn)
            .clear_history(ClearConfirmation::Confirmed)
            .map_err(|err| history_message(&err))
    }) {
        Ok(removed) => ActionResponse::success(format!("Cleared {removed} history entries.")),
        Err(err) => ActionResponse::failure(err),
    }
}

fn resolve_config() -> &'static CoreConfig {
    CONFIG.get_or_init(|| {
        CoreConfig::from_env().unwrap_or_else(|err| {
            warn!("event=ffi_config module=ffi status=degraded error={err}");
            CoreConfig::default()
        })
    })
}

fn with_store<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn =
        open_db(&resolve_config().db_path).map_err(|err| format!("store open failed: {err}"))?;
    f(&conn)
}

fn history_service(conn: &Connection) -> HistoryService<SqliteBackend<'_>> {
    HistoryService::new(SqliteBackend::new(conn), resolve_config().retention_policy())
}

fn history_message(err: &HistoryError) -> String {
    match err {
        HistoryError::IdentityUnavailable(None) => "Please log in first.".to_string(),
        other => other.to_string(),
    }
}

fn lookup_response(result: Result<Vec<NormalizedResult>, String>) -> InteractionResponse {
    match result {
        Ok(results) => {
            let items = results
                .into_iter()
                .map(|item| InteractionItem {
                    result: item.result,
                    description: item.description,
                    drug: item.drug,
                    food: item.food,
                })
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No interactions found.".to_string()
            } else {
                format!("Found {} interaction(s).", items.len())
            };
            InteractionResponse {
                items,
                ok: true,
                message,
            }
        }
        Err(err) => InteractionResponse::failure(err),
    }
}

fn to_history_item(entry: HistoryEntry) -> HistoryItem {
    HistoryItem {
        id: entry.id,
        drug1: entry.drug1,
        drug2: entry.drug2,
        result: entry.result,
        description: entry.description,
        created_at_epoch_ms: entry.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        auth_sign_in, auth_sign_out, auth_sign_up, core_version, current_username, history_clear,
        history_list, history_save, init_logging, interaction_check, interaction_mock_check,
        interaction_search, ping, resolve_config,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn blank_search_is_an_empty_success() {
        let response = interaction_search("   ".to_string());
        assert!(response.ok, "{}", response.message);
        assert!(response.items.is_empty());
    }

    #[test]
    fn pair_check_requires_both_inputs() {
        let response = interaction_check("Warfarin".to_string(), " ".to_string());
        assert!(!response.ok);
        assert!(response.items.is_empty());
    }

    #[test]
    fn mock_check_describes_the_pair() {
        let response = interaction_mock_check("Ibuprofen".to_string(), "Coffee".to_string());
        assert!(response.ok);
        assert_eq!(response.risk.as_deref(), Some("Moderate"));
        assert_eq!(
            response.message,
            "Combining Ibuprofen and Coffee may increase drowsiness."
        );
        assert!(!interaction_mock_check(String::new(), "x".to_string()).ok);
    }

    #[test]
    fn unconfirmed_clear_is_refused() {
        let response = history_clear(false);
        assert!(!response.ok);
        assert!(response.message.contains("not confirmed"));
    }

    #[test]
    fn signed_in_user_keeps_only_the_newest_entries() {
        let token = unique_token("ffi");
        let email = format!("{token}@example.com");
        let signed_up = auth_sign_up(email.clone(), "pw".to_string(), token.clone());
        assert!(signed_up.ok, "{}", signed_up.message);
        let signed_in = auth_sign_in(email, "pw".to_string());
        assert!(signed_in.ok, "{}", signed_in.message);
        assert_eq!(current_username(), token);

        let limit = resolve_config().retention_policy().limit();
        let saves = limit + 2;
        for n in 1..=saves {
            let saved = history_save(
                format!("drug-{n}"),
                "Grapefruit".to_string(),
                "Moderate".to_string(),
                "note".to_string(),
            );
            assert!(saved.ok, "{}", saved.message);
        }
        let listed = history_list();
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.items.len(), limit);
        assert_eq!(listed.items[0].drug1, format!("drug-{saves}"));

        assert!(history_clear(true).ok);
        assert!(history_list().items.is_empty());
        assert!(auth_sign_out().ok);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}{nanos}")
    }
}
