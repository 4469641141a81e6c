//! User Entity

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Default avatar for newly registered users
pub const DEFAULT_PROFILE_URL: &str = "https://randomuser.me/api/portraits/men/6.jpg";

/// User role. Exactly two values; authorization compares against the
/// enum, never against a substring of the serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

/// User entity. `password` only ever holds an Argon2id PHC hash; the
/// plaintext never reaches the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash
    pub password: String,

    #[serde(default)]
    pub role: Role,

    /// Profile picture URL
    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_profile() -> String {
    DEFAULT_PROFILE_URL.to_string()
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            username: username.into(),
            email: email.into(),
            password: password_hash.into(),
            role: Role::User,
            profile: default_profile(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults() {
        let user = User::new("alice", "alice@example.com", "$argon2id$stub");
        assert_eq!(user.role, Role::User);
        assert!(!user.is_admin());
        assert_eq!(user.profile, DEFAULT_PROFILE_URL);
        assert_eq!(user.id.len(), 13);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
