//! Interaction lookup model.
//!
//! # Responsibility
//! - Define the user query (two substance terms) and its validation.
//! - Define the raw `food_drug_interactions` row shape.
//! - Project raw rows into `NormalizedResult` using a fixed fallback order.
//!
//! # Invariants
//! - Empty strings are treated the same as missing columns when choosing
//!   fallbacks.
//! - `NormalizedResult.result` and `.description` are never empty.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Risk label used when a row carries no `effect`.
pub const UNKNOWN_RESULT: &str = "Unknown";
/// Description used when a row carries no conclusion, result or note.
pub const NO_DESCRIPTION: &str = "No additional information available.";
/// Risk label produced by the offline mock check.
pub const MOCK_RISK: &str = "Moderate";

/// Validation error for user-entered lookup input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValidationError {
    /// One or both substance fields are blank.
    MissingInput,
}

impl Display for QueryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput => write!(f, "both substance fields must be filled in"),
        }
    }
}

impl Error for QueryValidationError {}

/// Two free-text substance names entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionQuery {
    pub first: String,
    pub second: String,
}

impl InteractionQuery {
    /// Creates a query with trimmed terms.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into().trim().to_string(),
            second: second.into().trim().to_string(),
        }
    }

    /// Checks that both terms carry text.
    ///
    /// # Errors
    /// - `MissingInput` when either term is blank.
    pub fn validate(&self) -> Result<(), QueryValidationError> {
        if self.first.trim().is_empty() || self.second.trim().is_empty() {
            return Err(QueryValidationError::MissingInput);
        }
        Ok(())
    }
}

/// Raw row of the `food_drug_interactions` table.
///
/// Every descriptive column is optional; the upstream data set is sparse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub drug_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub food_herb_name: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl InteractionRecord {
    /// Projects this row into the display shape.
    ///
    /// Precedence:
    /// - `result`: `effect`, else [`UNKNOWN_RESULT`].
    /// - `description`: `conclusion`, `result`, `note`, else [`NO_DESCRIPTION`].
    pub fn normalize(&self) -> NormalizedResult {
        let result = first_present([self.effect.as_deref()])
            .unwrap_or(UNKNOWN_RESULT)
            .to_string();
        let description = first_present([
            self.conclusion.as_deref(),
            self.result.as_deref(),
            self.note.as_deref(),
        ])
        .unwrap_or(NO_DESCRIPTION)
        .to_string();

        NormalizedResult {
            result,
            description,
            drug: self.drug_name.clone(),
            food: self.food_herb_name.clone(),
        }
    }
}

/// Client-facing projection of one interaction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Risk/effect label.
    pub result: String,
    /// Human-readable explanation.
    pub description: String,
    pub drug: Option<String>,
    pub food: Option<String>,
}

/// Result of the offline mock check shown before backend data existed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVerdict {
    pub risk: String,
    pub description: String,
}

impl MockVerdict {
    /// Builds the fixed mock verdict for a validated query.
    pub fn for_query(query: &InteractionQuery) -> Self {
        Self {
            risk: MOCK_RISK.to_string(),
            description: format!(
                "Combining {} and {} may increase drowsiness.",
                query.first, query.second
            ),
        }
    }
}

fn first_present<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
}
