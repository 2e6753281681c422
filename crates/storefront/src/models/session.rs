//! What a signed-in shopper's session holds.

use serde::{Deserialize, Serialize};

use pawmarket_core::{Email, UserId};

/// Shopper identity written to the session at login.
///
/// Profile fields beyond the display name are read from the database when
/// needed, so a profile edit only has to refresh `full_name` here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
}

/// Session keys.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
}
