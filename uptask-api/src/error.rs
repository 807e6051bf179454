/// Error handling for the API server
///
/// Every handler and extractor returns `Result<T, ApiError>`. Each variant
/// maps to one HTTP status and a JSON body:
///
/// ```json
/// { "error": "not_found", "message": "Project Not Found" }
/// ```
///
/// Validation failures add a `details` array of `{ field, message }`.
/// Internal errors are logged and replaced by a generic message.
///
/// # Example
///
/// ```
/// use uptask_api::error::{ApiError, ApiResult};
///
/// fn find(found: bool) -> ApiResult<&'static str> {
///     if !found {
///         return Err(ApiError::NotFound("Project Not Found".to_string()));
///     }
///     Ok("project")
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uptask_shared::{
    auth::{authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError},
    db::store::StoreError,
};

/// Message returned for every permission failure
pub const INVALID_ACTION: &str = "Invalid Action";

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email or team membership clash
    Conflict(String),

    /// Field validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Details stay in the log
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Field errors from `validator`, sorted by field name
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    ValidationErrorDetail::new(
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Validation failed".to_string()),
                    )
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) if constraint.contains("email") => {
                ApiError::Conflict("Email is already registered".to_string())
            }
            StoreError::Conflict(constraint) => {
                ApiError::Conflict(format!("Constraint violation: {}", constraint))
            }
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Unauthorized".to_string()),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
        }
    }
}

/// Permission failures are 403, a task addressed through the wrong project
/// is 400 and team membership clashes are 409
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotManager | AuthzError::NotMember | AuthzError::NotAuthor => {
                ApiError::Forbidden(INVALID_ACTION.to_string())
            }
            AuthzError::TaskNotInProject => ApiError::BadRequest(INVALID_ACTION.to_string()),
            AuthzError::AlreadyInTeam | AuthzError::ManagerCannotJoin | AuthzError::NotInTeam => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name field is required"))]
        name: String,
        #[validate(email(message = "Invalid Email"))]
        email: String,
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::ValidationError(vec![]), StatusCode::BAD_REQUEST),
            (ApiError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_validation_errors_are_sorted_by_field() {
        let sample = Sample {
            name: String::new(),
            email: "nope".to_string(),
        };

        let err: ApiError = sample.validate().unwrap_err().into();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![
                        ValidationErrorDetail::new("email", "Invalid Email"),
                        ValidationErrorDetail::new("name", "Name field is required"),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_authz_mapping() {
        assert!(matches!(
            ApiError::from(AuthzError::NotManager),
            ApiError::Forbidden(msg) if msg == INVALID_ACTION
        ));
        assert!(matches!(
            ApiError::from(AuthzError::TaskNotInProject),
            ApiError::BadRequest(msg) if msg == INVALID_ACTION
        ));
        assert!(matches!(
            ApiError::from(AuthzError::AlreadyInTeam),
            ApiError::Conflict(msg) if msg == "User is already in the project"
        ));
    }

    #[test]
    fn test_store_conflict_on_email() {
        let err = ApiError::from(StoreError::Conflict("users_email_key".to_string()));
        assert!(matches!(err, ApiError::Conflict(msg) if msg == "Email is already registered"));
    }
}
