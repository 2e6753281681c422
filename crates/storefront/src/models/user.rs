//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pawmarket_core::{Email, UserId, UserRole};

/// A registered account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Editable profile fields plus the read-only identity.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Profile update payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl ProfileUpdate {
    /// Trim text fields and turn blank optionals into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            phone: blank_to_none(self.phone),
            address: blank_to_none(self.address),
            gender: blank_to_none(self.gender),
            birth_date: self.birth_date,
        }
    }
}

/// Trim an optional string, dropping it when nothing is left.
pub(crate) fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_normalizes_blanks() {
        let update = ProfileUpdate {
            full_name: "  Mai Tran ".to_string(),
            phone: Some("   ".to_string()),
            address: Some(" 12 Le Loi ".to_string()),
            gender: None,
            birth_date: None,
        }
        .normalized();

        assert_eq!(update.full_name, "Mai Tran");
        assert_eq!(update.phone, None);
        assert_eq!(update.address.as_deref(), Some("12 Le Loi"));
    }
}
