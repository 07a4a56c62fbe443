//! Principal context
//!
//! A typed snapshot of an authenticated caller, populated once from the
//! validated token claims and the stored user record. Business logic never
//! performs string-keyed claim lookups; everything it needs lives here.

use crate::store::UserRecord;
use serde::{Deserialize, Serialize};
use strata_core::SecurityAccess;

/// Authenticated caller identity plus permission tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier (`sub` claim).
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    /// Permission tree, deserialized from the `SecurityAccess` claim or the
    /// stored user record.
    pub access: SecurityAccess,
    /// Whether the principal's email is in the configured super-admin set.
    pub super_admin: bool,
}

impl Principal {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            full_name: None,
            first_name: None,
            last_name: None,
            avatar: None,
            access: SecurityAccess::new(),
            super_admin: false,
        }
    }

    /// Build a principal from a stored user record.
    pub fn from_record(record: UserRecord, super_admin: bool) -> Self {
        Self {
            id: record.id,
            email: record.email,
            full_name: record.full_name,
            first_name: record.first_name,
            last_name: record.last_name,
            avatar: record.avatar_url,
            access: record.access,
            super_admin,
        }
    }

    pub fn with_access(mut self, access: SecurityAccess) -> Self {
        self.access = access;
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn as_super_admin(mut self) -> Self {
        self.super_admin = true;
        self
    }

    /// Display name, falling back to the email when no name claim was sent.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }

    /// Commit author name for published changes.
    pub fn author_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("no name claim")
    }

    /// Commit author email for published changes.
    pub fn author_email(&self) -> &str {
        self.email.as_deref().unwrap_or("no email claim")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_fields_fall_back_to_claim_placeholders() {
        let principal = Principal::new("u-1");
        assert_eq!(principal.author_name(), "no name claim");
        assert_eq!(principal.author_email(), "no email claim");

        let principal = Principal::new("u-1").with_email("dev@example.com");
        assert_eq!(principal.author_email(), "dev@example.com");
    }

    #[test]
    fn display_name_prefers_full_name_then_email() {
        let mut principal = Principal::new("u-1").with_email("dev@example.com");
        assert_eq!(principal.display_name(), "dev@example.com");

        principal.full_name = Some("Dev Eloper".to_string());
        assert_eq!(principal.display_name(), "Dev Eloper");
    }
}
