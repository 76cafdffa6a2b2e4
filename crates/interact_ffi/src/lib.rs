//! Flutter bridge surface over `interact_core`.

pub mod api;
