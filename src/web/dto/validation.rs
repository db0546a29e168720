//! Validation utilities for web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// Malformed JSON is rejected with a bad request error; a body that
/// deserializes but fails validation is rejected with field-level details.
///
/// ```ignore
/// async fn create_board(
///     ValidatedJson(req): ValidatedJson<BoardRequest>,
/// ) -> Result<Json<ApiResponse<BoardResponse>>, ApiError> {
///     // req has passed validation
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Validate that a string does not contain control characters or NULL bytes.
///
/// Newlines, carriage returns and tabs are allowed.
pub fn no_control_chars(value: &str) -> Result<(), validator::ValidationError> {
    if value
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t')
    {
        return Err(validator::ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()));
    }
    Ok(())
}

/// Read an optional primary-key value from a loosely typed body.
///
/// Integers and integer strings are accepted. Null and blank strings count
/// as absent. Anything else is a field error on `field`.
pub fn optional_pk(value: Option<&Value>, field: &str) -> Result<Option<i64>, ApiError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ApiError::field(field, "Incorrect type. Expected pk value.")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            ApiError::field(
                field,
                format!("Incorrect type. Expected pk value, received {s}."),
            )
        }),
        Some(_) => Err(ApiError::field(field, "Incorrect type. Expected pk value.")),
    }
}

/// Read a required primary-key field from a loosely typed JSON body.
pub fn required_pk(body: &Value, field: &str) -> Result<i64, ApiError> {
    optional_pk(body.get(field), field)?
        .ok_or_else(|| ApiError::field(field, "This field is required."))
}
