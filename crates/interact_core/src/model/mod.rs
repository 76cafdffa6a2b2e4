//! Domain model for interaction lookups, saved history and accounts.
//!
//! # Responsibility
//! - Define the typed shapes exchanged between services and the backend.
//! - Own the normalization rules that turn raw interaction rows into
//!   display-ready results.
//!
//! # Invariants
//! - Backend rows are read-only projections; the client never mutates
//!   `InteractionRecord` values.
//! - `HistoryEntry.created_at` is epoch milliseconds stamped by the client.

pub mod account;
pub mod history;
pub mod interaction;
