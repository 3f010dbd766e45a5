//! User models for Quill
//!
//! This module contains:
//! - The user account row
//! - The authenticated identity attached to each request

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Status given to every new account
pub const DEFAULT_STATUS: &str = "I am new!";

/// User account from the users table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, stored lower-cased)
    pub email: String,

    /// Argon2 hashed password
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Free-text status line
    pub status: String,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last profile update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Who is making the current request
///
/// Set once per request by the authentication gate. An absent or invalid
/// token yields `Anonymous`; rejecting it is left to each resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Anonymous,
    User(Uuid),
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_default_is_anonymous() {
        let identity = Identity::default();
        assert!(!identity.is_authenticated());
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn test_identity_user() {
        let id = Uuid::new_v4();
        let identity = Identity::User(id);
        assert!(identity.is_authenticated());
        assert_eq!(identity.user_id(), Some(id));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            status: DEFAULT_STATUS.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], DEFAULT_STATUS);
    }
}
