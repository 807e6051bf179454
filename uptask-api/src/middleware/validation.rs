/// JSON body extractor with field validation
///
/// [`ValidJson`] deserializes the body like `axum::Json` and then runs the
/// type's `validator::Validate` rules, so a handler only ever sees a body
/// that passed validation. Malformed JSON is a 400 `bad_request`; a rule
/// failure is a 400 `validation_error` listing every failing field.

use crate::error::ApiError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

/// Longest name, email or title the database stores
pub const MAX_TEXT_LENGTH: usize = 255;

/// Rejects text longer than [`MAX_TEXT_LENGTH`] characters
pub fn within_text_limit(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_TEXT_LENGTH {
        let mut error = ValidationError::new("length");
        error.message = Some(format!("Must be at most {MAX_TEXT_LENGTH} characters").into());
        return Err(error);
    }
    Ok(())
}

/// A deserialized and validated JSON body
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}
