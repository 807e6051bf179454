/// Bearer session authentication
///
/// Parses `Authorization: Bearer <jwt>` and validates the session token. On
/// success the caller's identity is available as an [`AuthContext`]; the API
/// layer inserts it into request extensions and later resolves it into the
/// full user record.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use uptask_shared::auth::jwt::{create_token, Claims};
/// use uptask_shared::auth::middleware::authenticate;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), secret)?;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
///
/// let auth = authenticate(&headers, secret)?;
/// assert_eq!(auth.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};

/// Authenticated caller identity, added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID (the token subject)
    pub user_id: Uuid,
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header
    #[error("Missing credentials")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("{0}")]
    InvalidFormat(String),

    /// Token failed validation
    #[error("{0}")]
    InvalidToken(String),
}

/// Extracts the raw token from `Authorization: Bearer <token>`
///
/// # Errors
///
/// Returns `AuthError::MissingCredentials` without the header and
/// `AuthError::InvalidFormat` for any other scheme or an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    Ok(token)
}

/// Validates the bearer session token in `headers`
///
/// # Errors
///
/// Returns `AuthError` when the header is missing or malformed, or when the
/// token is expired, foreign or forged.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    Ok(AuthContext {
        user_id: claims.sub,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use axum::http::HeaderValue;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_token(&Claims::new(user_id), SECRET).unwrap();

        let auth = authenticate(&headers_with(&format!("Bearer {token}")), SECRET).unwrap();
        assert_eq!(auth.user_id, user_id);
    }

    #[test]
    fn test_missing_header() {
        let result = authenticate(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_wrong_scheme() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));

        let headers = headers_with("Bearer ");
        let result = bearer_token(&headers);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_expired_token() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::hours(-2));
        let token = create_token(&claims, SECRET).unwrap();

        let result = authenticate(&headers_with(&format!("Bearer {token}")), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(msg)) if msg == "Token expired"));
    }

    #[test]
    fn test_forged_token() {
        let token = create_token(&Claims::new(Uuid::new_v4()), "some-other-secret-32-bytes-long!!").unwrap();

        let result = authenticate(&headers_with(&format!("Bearer {token}")), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
