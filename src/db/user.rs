//! User model for sixchan.

use chrono::{DateTime, Utc};

use crate::auth::Identity;

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Email address (unique).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Whether the account carries the administrator flag.
    pub is_admin: bool,
    /// Whether the account is active.
    pub is_active: bool,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The identity this user acts under.
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.is_admin)
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Administrator flag (defaults to false).
    pub is_admin: bool,
}

impl NewUser {
    /// Create a new regular user.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            is_admin: false,
        }
    }

    /// Set the administrator flag.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let user = NewUser::new("alice", "alice@example.com", "hash");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.is_admin);
    }

    #[test]
    fn test_new_user_with_admin() {
        let user = NewUser::new("root", "root@example.com", "hash").with_admin(true);
        assert!(user.is_admin);
    }

    #[test]
    fn test_identity() {
        let user = User {
            id: 7,
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "hash".to_string(),
            is_admin: true,
            is_active: true,
            created_at: Utc::now(),
        };
        let identity = user.identity();
        assert_eq!(identity.id, 7);
        assert!(identity.is_admin);
    }
}
