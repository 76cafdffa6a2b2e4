//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate backend calls into lookup, history and account use-cases.
//! - Keep FFI/CLI layers decoupled from store details; every service takes
//!   its backend as an explicit handle.

pub mod account_service;
pub mod history_service;
pub mod interaction_service;
