//! Interaction search entry points.
//!
//! # Responsibility
//! - Build the substring filters used to look up interaction rows.
//! - Decode store payloads into typed rows, degrading on unexpected shapes.

pub mod interaction_search;
