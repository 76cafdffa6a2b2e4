//! Authenticated user and profile model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable auth user id.
pub type UserId = Uuid;

/// Display name used when no profile username can be resolved.
pub const FALLBACK_USERNAME: &str = "User";

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
}

/// Row of the `profiles` table (`id` ↔ `username`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
}
