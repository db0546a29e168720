//! Account registration and credential checks.

use tracing::{info, warn};

use crate::auth::validation::validate_registration;
use crate::auth::{hash_password, verify_password};
use crate::config::AdminConfig;
use crate::db::{DbPool, NewUser, User, UserRepository};
use crate::{ChanError, FieldErrors, Result};

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Register a new regular user.
///
/// Validates the fields, rejects taken usernames and emails, hashes the
/// password and stores the account.
pub async fn register(pool: &DbPool, request: RegistrationRequest) -> Result<User> {
    create_account(pool, request, false).await
}

/// Register a new administrator.
pub async fn register_admin(pool: &DbPool, request: RegistrationRequest) -> Result<User> {
    create_account(pool, request, true).await
}

async fn create_account(
    pool: &DbPool,
    request: RegistrationRequest,
    is_admin: bool,
) -> Result<User> {
    validate_registration(&request.username, &request.email, &request.password)?;

    let repo = UserRepository::new(pool);

    let mut errors = FieldErrors::new();
    if repo.username_exists(&request.username).await? {
        errors.add("username", "A user with that username already exists.");
    }
    if repo.email_exists(&request.email).await? {
        errors.add("email", "user with this email already exists.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&request.password)?;
    let new_user =
        NewUser::new(&request.username, &request.email, password_hash).with_admin(is_admin);
    let user = repo.create(&new_user).await?;

    info!(
        username = %user.username,
        user_id = user.id,
        is_admin = user.is_admin,
        "New user registered"
    );

    Ok(user)
}

/// Check a username/password pair.
///
/// Unknown users, wrong passwords and inactive accounts all yield the same
/// `Unauthorized` error.
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> Result<User> {
    let invalid = || {
        ChanError::Unauthorized("No active account found with the given credentials".to_string())
    };

    let repo = UserRepository::new(pool);
    let user = repo.get_by_username(username).await?.ok_or_else(invalid)?;

    if verify_password(password, &user.password).is_err() {
        warn!(username = %username, "Failed login attempt");
        return Err(invalid());
    }
    if !user.is_active {
        return Err(invalid());
    }

    Ok(user)
}

/// Create the configured bootstrap administrator if it does not exist yet.
///
/// Returns the created user, or `None` when nothing was configured or the
/// username is already taken.
pub async fn ensure_admin(pool: &DbPool, config: &AdminConfig) -> Result<Option<User>> {
    let Some((username, email, password)) = config.credentials() else {
        return Ok(None);
    };

    if UserRepository::new(pool).username_exists(username).await? {
        return Ok(None);
    }

    let user = register_admin(pool, RegistrationRequest::new(username, email, password)).await?;
    info!(username = %user.username, "Bootstrap administrator created");
    Ok(Some(user))
}
