//! Session-stored staff identity.

use serde::{Deserialize, Serialize};

use pawmarket_core::{Email, UserId, UserRole};

/// The signed-in back-office user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStaff {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    /// Always `staff` or `admin`; customers never get a back-office session.
    pub role: UserRole,
}

impl CurrentStaff {
    /// Whether this user may run admin-only operations such as the export.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Session keys for back-office authentication.
pub mod keys {
    /// Key for storing the current signed-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";
}
