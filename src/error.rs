//! Error types for sixchan.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field-level validation messages, keyed by field name.
///
/// Errors that do not belong to a single field are stored under
/// [`FieldErrors::NON_FIELD`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key used for errors that are not tied to a specific field.
    pub const NON_FIELD: &'static str = "non_field_errors";

    /// Create an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding a single message for `field`.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append a message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Check if no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Return `Ok(())` when empty, otherwise a [`ChanError::Validation`].
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ChanError::Validation(self))
        }
    }

    /// Iterate over `(field, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<FieldErrors> for std::collections::HashMap<String, Vec<String>> {
    fn from(errors: FieldErrors) -> Self {
        errors.0.into_iter().collect()
    }
}

/// Common error type for sixchan.
#[derive(Error, Debug)]
pub enum ChanError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No or invalid credentials on an operation that needs them.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credentials, but the actor may not touch the resource.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed or missing input, duplicate unique field, or invalid reference.
    #[error("validation error: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Password hashing error.
    #[error("password error: {0}")]
    Password(#[from] crate::auth::PasswordError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChanError {
    /// Shorthand for a validation error on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ChanError::Validation(FieldErrors::single(field, message))
    }
}

impl From<sqlx::Error> for ChanError {
    fn from(e: sqlx::Error) -> Self {
        ChanError::Database(e.to_string())
    }
}

/// Result type alias for sixchan operations.
pub type Result<T> = std::result::Result<T, ChanError>;
