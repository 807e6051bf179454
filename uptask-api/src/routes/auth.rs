/// Account endpoints
///
/// Public account workflow (registration, confirmation, login, password
/// reset) plus the authenticated caller's own account.
///
/// # Endpoints
///
/// - `POST /api/auth/create-account` - Register, emails a confirmation code
/// - `POST /api/auth/confirm-account` - Redeem a confirmation code
/// - `POST /api/auth/login` - Exchange credentials for a session token
/// - `POST /api/auth/request-code` - Email a new confirmation code
/// - `POST /api/auth/forgot-password` - Email a password reset code
/// - `POST /api/auth/validate-token` - Check a reset code without redeeming it
/// - `POST /api/auth/update-password/:token` - Redeem a reset code
/// - `GET /api/auth/user` - Caller's public profile
/// - `PUT /api/auth/profile` - Change name and email
/// - `POST /api/auth/update-password` - Change password
/// - `POST /api/auth/check-password` - Verify the caller's password
///
/// Confirmation and reset codes expire after the configured TTL; an expired
/// code behaves exactly like an unknown one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    middleware::{
        context::Caller,
        validation::{within_text_limit, ValidJson},
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uptask_shared::{
    auth::{password, token},
    email::auth::Recipient,
    models::{
        token::Token,
        user::{CreateUser, User, UserSummary},
    },
};
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Name field is required"),
        custom(function = "within_text_limit")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password is too short, minimum 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords does not match"))]
    pub password_confirmation: String,

    #[serde(default)]
    #[validate(
        email(message = "Invalid Email"),
        custom(function = "within_text_limit")
    )]
    pub email: String,
}

/// Body carrying a six digit code
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Token can't be empty"))]
    pub token: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid Email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password can't be empty"))]
    pub password: String,
}

/// Body carrying only an email address
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[serde(default)]
    #[validate(email(message = "Invalid Email"))]
    pub email: String,
}

/// New password chosen through a reset code
#[derive(Debug, Deserialize, Validate)]
pub struct NewPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 8, message = "Password is too short, minimum 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords does not match"))]
    pub password_confirmation: String,
}

/// Profile update
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Name field is required"),
        custom(function = "within_text_limit")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(
        email(message = "Invalid Email"),
        custom(function = "within_text_limit")
    )]
    pub email: String,
}

/// Password change by an authenticated user
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Current password can't be empty"))]
    pub current_password: String,

    #[serde(default)]
    #[validate(length(min = 8, message = "Password is too short, minimum 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords does not match"))]
    pub password_confirmation: String,
}

/// Password check
#[derive(Debug, Deserialize, Validate)]
pub struct CheckPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Password can't be empty"))]
    pub password: String,
}

/// Emails are compared and stored lowercase
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loads a code that exists and hasn't expired
async fn live_token(state: &AppState, value: &str) -> ApiResult<Token> {
    let issued_after = Utc::now() - state.token_ttl();

    state
        .store
        .find_live_token(value, issued_after)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid Token".to_string()))
}

/// Issues a fresh confirmation code and emails it
async fn send_confirmation(state: &AppState, user: &User) -> ApiResult<()> {
    let code = token::generate_token();
    state.store.create_token(user.id, &code).await?;

    let email = state.auth_email().confirmation(&Recipient {
        email: &user.email,
        name: &user.name,
        token: &code,
    });
    state.send_email(email).await;

    Ok(())
}

/// Register a new account
///
/// The account starts unconfirmed; the confirmation code is emailed.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already registered
pub async fn create_account(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateAccountRequest>,
) -> ApiResult<(StatusCode, String)> {
    let email = normalize_email(&req.email);

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User email is already registered".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;
    let code = token::generate_token();

    let (user, _) = state
        .store
        .create_user_with_token(
            CreateUser {
                email,
                name: req.name,
                password_hash,
            },
            &code,
        )
        .await?;

    let message = state.auth_email().confirmation(&Recipient {
        email: &user.email,
        name: &user.name,
        token: &code,
    });
    state.send_email(message).await;

    info!(user_id = %user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        "Account created successfully, check your email to confirm".to_string(),
    ))
}

/// Redeem a confirmation code
///
/// # Errors
///
/// - `404 Not Found`: Code unknown, expired or already used
pub async fn confirm_account(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> ApiResult<String> {
    let token = live_token(&state, &req.token).await?;

    state.store.confirm_account(&token).await?;

    info!(user_id = %token.user_id, "Account confirmed");

    Ok("Account confirmed successfully".to_string())
}

/// Login
///
/// Answers with the bearer session token as plain text. An unconfirmed
/// account never logs in; a new confirmation code is emailed instead.
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
/// - `401 Unauthorized`: Account unconfirmed or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<String> {
    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.confirmed {
        send_confirmation(&state, &user).await?;
        return Err(ApiError::Unauthorized(
            "Account is not confirmed, we have sent you a confirmation e-mail".to_string(),
        ));
    }

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid Password".to_string()));
    }

    let session = state.issue_session(user.id)?;

    info!(user_id = %user.id, "User logged in");

    Ok(session)
}

/// Email a new confirmation code
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
/// - `403 Forbidden`: Account already confirmed
pub async fn request_code(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<EmailRequest>,
) -> ApiResult<String> {
    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not registered".to_string()))?;

    if user.confirmed {
        return Err(ApiError::Forbidden("User is already confirmed".to_string()));
    }

    send_confirmation(&state, &user).await?;

    Ok("A new confirmation token was sent to your e-mail".to_string())
}

/// Email a password reset code
///
/// Codes issued earlier stay valid until they expire.
///
/// # Errors
///
/// - `404 Not Found`: Unknown email
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<EmailRequest>,
) -> ApiResult<String> {
    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User is not registered".to_string()))?;

    let code = token::generate_token();
    state.store.create_token(user.id, &code).await?;

    let message = state.auth_email().password_reset(&Recipient {
        email: &user.email,
        name: &user.name,
        token: &code,
    });
    state.send_email(message).await;

    info!(user_id = %user.id, "Password reset requested");

    Ok("Check your e-mail and follow the instructions to reset your password".to_string())
}

/// Check that a reset code is live without consuming it
///
/// # Errors
///
/// - `404 Not Found`: Code unknown or expired
pub async fn validate_token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> ApiResult<String> {
    live_token(&state, &req.token).await?;

    Ok("Valid Token, change your password".to_string())
}

/// Redeem a reset code and set a new password
///
/// # Errors
///
/// - `400 Bad Request`: Code isn't six digits or passwords invalid
/// - `404 Not Found`: Code unknown or expired
pub async fn update_password_with_token(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ValidJson(req): ValidJson<NewPasswordRequest>,
) -> ApiResult<String> {
    if !token::is_token_format(&code) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "token",
            "Invalid Token",
        )]));
    }

    let token = live_token(&state, &code).await?;
    let password_hash = password::hash_password(&req.password)?;

    state.store.reset_password(&token, &password_hash).await?;

    info!(user_id = %token.user_id, "Password reset");

    Ok("Password successfully changed".to_string())
}

/// Caller's public profile
pub async fn current_user(Caller(user): Caller) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}

/// Change the caller's name and email
///
/// # Errors
///
/// - `409 Conflict`: Email belongs to another account
pub async fn update_profile(
    State(state): State<AppState>,
    Caller(user): Caller,
    ValidJson(req): ValidJson<ProfileRequest>,
) -> ApiResult<String> {
    let email = normalize_email(&req.email);

    if let Some(existing) = state.store.find_user_by_email(&email).await? {
        if existing.id != user.id {
            return Err(ApiError::Conflict("Email is already registered".to_string()));
        }
    }

    state
        .store
        .update_user_profile(user.id, &req.name, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");

    Ok("Profile updated successfully".to_string())
}

/// Change the caller's password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
pub async fn update_current_password(
    State(state): State<AppState>,
    Caller(user): Caller,
    ValidJson(req): ValidJson<UpdatePasswordRequest>,
) -> ApiResult<String> {
    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current Password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;
    state
        .store
        .update_user_password(user.id, &password_hash)
        .await?;

    info!(user_id = %user.id, "Password changed");

    Ok("Password successfully changed".to_string())
}

/// Verify the caller's password
///
/// # Errors
///
/// - `401 Unauthorized`: Password is wrong
pub async fn check_password(
    Caller(user): Caller,
    ValidJson(req): ValidJson<CheckPasswordRequest>,
) -> ApiResult<String> {
    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Password is incorrect".to_string()));
    }

    Ok("Password is correct".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_create_account_rules() {
        let req = CreateAccountRequest {
            name: String::new(),
            password: "short".to_string(),
            password_confirmation: "other".to_string(),
            email: "not-an-email".to_string(),
        };

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("password_confirmation"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_create_account_valid() {
        let req = CreateAccountRequest {
            name: "Ada".to_string(),
            password: "password123".to_string(),
            password_confirmation: "password123".to_string(),
            email: "ada@example.com".to_string(),
        };

        assert!(req.validate().is_ok());
    }
}
