//! Interaction lookup use-cases.
//!
//! # Responsibility
//! - Run substring searches against the interaction table.
//! - Normalize rows into display results.
//! - Provide the offline mock check.
//!
//! # Invariants
//! - A blank search issues no backend call and returns no results.
//! - Backend failures surface as `LookupError::QueryFailed`, never as an
//!   empty result.
//! - User-entered text is never written to logs; only its length.

use crate::backend::{Backend, BackendError, Filter};
use crate::model::interaction::{
    InteractionQuery, MockVerdict, NormalizedResult, QueryValidationError,
};
use crate::search::interaction_search::{
    decode_interactions, interaction_select, pair_filter, term_filter,
};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LookupResult<T> = Result<T, LookupError>;

/// Lookup failure, distinct from "no matches".
#[derive(Debug)]
pub enum LookupError {
    Validation(QueryValidationError),
    QueryFailed(BackendError),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::QueryFailed(err) => write!(f, "interaction search failed: {err}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::QueryFailed(err) => Some(err),
        }
    }
}

impl From<QueryValidationError> for LookupError {
    fn from(value: QueryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Lookup service over an injected backend.
pub struct InteractionService<B: Backend> {
    backend: B,
}

impl<B: Backend> InteractionService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Searches every text column for `text` (case-insensitive substring).
    ///
    /// # Contract
    /// - `text` is trimmed first: surrounding whitespace is not part of the
    ///   match, so `" tea "` matches `"green tea"`.
    /// - Blank `text` returns `Ok(vec![])` without touching the backend.
    /// - Results keep the store order: `drug_name`, `food_herb_name`, `id`.
    pub fn search_interactions(&self, text: &str) -> LookupResult<Vec<NormalizedResult>> {
        let Some(filter) = term_filter(text) else {
            return Ok(Vec::new());
        };
        self.run("search", text.trim().len(), filter)
    }

    /// Looks up rows that mention both substances.
    ///
    /// Each term may match any searchable column; both must match.
    pub fn lookup_pair(&self, query: &InteractionQuery) -> LookupResult<Vec<NormalizedResult>> {
        query.validate()?;
        let Some(filter) = pair_filter(&query.first, &query.second) else {
            return Ok(Vec::new());
        };
        self.run("pair", query.first.len() + query.second.len(), filter)
    }

    fn run(
        &self,
        mode: &'static str,
        text_len: usize,
        filter: Filter,
    ) -> LookupResult<Vec<NormalizedResult>> {
        let select = interaction_select(filter);
        let payload = self.backend.select(&select).map_err(|err| {
            error!(
                "event=interaction_search module=service status=error mode={mode} text_len={text_len} error={err}"
            );
            LookupError::QueryFailed(err)
        })?;

        let results = decode_interactions(payload)
            .iter()
            .map(|record| record.normalize())
            .collect::<Vec<_>>();
        info!(
            "event=interaction_search module=service status=ok mode={mode} text_len={text_len} hits={}",
            results.len()
        );
        Ok(results)
    }
}

/// Offline check used before backend data is available.
///
/// # Errors
/// - `MissingInput` when either substance is blank.
pub fn mock_check(query: &InteractionQuery) -> Result<MockVerdict, QueryValidationError> {
    query.validate()?;
    Ok(MockVerdict::for_query(query))
}
