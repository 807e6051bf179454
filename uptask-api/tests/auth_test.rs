/// Account workflow tests
///
/// Registration, confirmation, login, password reset and the caller's own
/// account, driven through the full router.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{TestContext, JWT_SECRET, PASSWORD};
use serde_json::json;
use uptask_api::config::Config;
use uptask_shared::db::store::Store;

#[tokio::test]
async fn test_register_sends_confirmation_code() {
    let ctx = TestContext::new();

    let response = ctx.register("Ada", "ada@example.com").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body,
        "Account created successfully, check your email to confirm"
    );

    let email = ctx.mailer.last_to("ada@example.com").await.unwrap();
    assert_eq!(email.subject, "UpTask - Confirm Account");

    let user = ctx
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.confirmed);
    assert_ne!(user.password_hash, PASSWORD);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = TestContext::new();

    assert_eq!(ctx.register("Ada", "ada@example.com").await.status, StatusCode::CREATED);

    let again = ctx.register("Ada Again", "Ada@Example.com").await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.json()["message"], "User email is already registered");

    // Still the original account
    let user = ctx
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Ada");
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/auth/create-account",
            None,
            json!({
                "email": "not-an-email",
                "password": "short",
                "password_confirmation": "different",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password", "password_confirmation"]);
}

#[tokio::test]
async fn test_register_rejects_overlong_name() {
    let ctx = TestContext::new();

    let response = ctx.register(&"a".repeat(300), "ada@example.com").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = response.json();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(body["details"][0]["message"], "Must be at most 255 characters");

    assert!(ctx
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .is_none());
    assert!(ctx.mailer.sent().await.is_empty());
}

#[tokio::test]
async fn test_confirmation_code_is_single_use() {
    let ctx = TestContext::new();
    ctx.register("Ada", "ada@example.com").await;
    let code = ctx.latest_code("ada@example.com").await;

    let first = ctx
        .post("/api/auth/confirm-account", None, json!({ "token": code }))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, "Account confirmed successfully");

    let second = ctx
        .post("/api/auth/confirm-account", None, json!({ "token": code }))
        .await;
    assert_eq!(second.status, StatusCode::NOT_FOUND);
    assert_eq!(second.json()["message"], "Invalid Token");

    let user = ctx
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.confirmed);
}

#[tokio::test]
async fn test_expired_confirmation_code_is_rejected() {
    let mut config = Config::for_testing(JWT_SECRET);
    config.account.token_ttl_minutes = 0;
    let ctx = TestContext::with_config(config);

    ctx.register("Ada", "ada@example.com").await;
    let code = ctx.latest_code("ada@example.com").await;

    let response = ctx
        .post("/api/auth/confirm-account", None, json!({ "token": code }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let user = ctx
        .store
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.confirmed);
}

#[tokio::test]
async fn test_unconfirmed_login_reissues_code() {
    let ctx = TestContext::new();
    ctx.register("Ada", "ada@example.com").await;
    assert_eq!(ctx.mailer.sent().await.len(), 1);

    let response = ctx.login("ada@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.json()["message"],
        "Account is not confirmed, we have sent you a confirmation e-mail"
    );

    // A second confirmation email with a fresh, redeemable code
    assert_eq!(ctx.mailer.sent().await.len(), 2);
    let code = ctx.latest_code("ada@example.com").await;
    let live = ctx
        .store
        .find_live_token(&code, Utc::now() - chrono::Duration::minutes(10))
        .await
        .unwrap();
    assert!(live.is_some());
}

#[tokio::test]
async fn test_login_unknown_email() {
    let ctx = TestContext::new();

    let response = ctx.login("nobody@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_wrong_password_issues_no_session() {
    let ctx = TestContext::new();
    ctx.signed_in("Ada", "ada@example.com").await;

    let response = ctx.login("ada@example.com", "wrong-password").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let body = response.json();
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Invalid Password");
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_email() {
    let ctx = TestContext::new();
    ctx.signed_in("Ada", "ada@example.com").await;

    let response = ctx.login("ADA@example.com", PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_code() {
    let ctx = TestContext::new();
    ctx.register("Ada", "ada@example.com").await;

    let response = ctx
        .post("/api/auth/request-code", None, json!({ "email": "ada@example.com" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ctx.mailer.sent().await.len(), 2);

    let unknown = ctx
        .post("/api/auth/request-code", None, json!({ "email": "bob@example.com" }))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_code_when_confirmed_is_forbidden() {
    let ctx = TestContext::new();
    ctx.signed_in("Ada", "ada@example.com").await;

    let response = ctx
        .post("/api/auth/request-code", None, json!({ "email": "ada@example.com" }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json()["message"], "User is already confirmed");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let ctx = TestContext::new();
    ctx.signed_in("Ada", "ada@example.com").await;

    let forgot = ctx
        .post("/api/auth/forgot-password", None, json!({ "email": "ada@example.com" }))
        .await;
    assert_eq!(forgot.status, StatusCode::OK);

    let email = ctx.mailer.last_to("ada@example.com").await.unwrap();
    assert_eq!(email.subject, "UpTask - Reset your password");
    let code = ctx.latest_code("ada@example.com").await;

    // Validating doesn't consume the code
    for _ in 0..2 {
        let valid = ctx
            .post("/api/auth/validate-token", None, json!({ "token": code }))
            .await;
        assert_eq!(valid.status, StatusCode::OK);
    }

    let reset = ctx
        .post(
            &format!("/api/auth/update-password/{code}"),
            None,
            json!({ "password": "new-password", "password_confirmation": "new-password" }),
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);
    assert_eq!(reset.body, "Password successfully changed");

    assert_eq!(ctx.login("ada@example.com", PASSWORD).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.login("ada@example.com", "new-password").await.status, StatusCode::OK);

    // The code is gone
    let reused = ctx
        .post("/api/auth/validate-token", None, json!({ "token": code }))
        .await;
    assert_eq!(reused.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_password_with_malformed_code() {
    let ctx = TestContext::new();

    let response = ctx
        .post(
            "/api/auth/update-password/abc",
            None,
            json!({ "password": "new-password", "password_confirmation": "new-password" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["details"][0]["field"], "token");
}

#[tokio::test]
async fn test_current_user_requires_session() {
    let ctx = TestContext::new();

    let missing = ctx
        .request(axum::http::Method::GET, "/api/auth/user", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let forged = ctx.get("/api/auth/user", "not-a-jwt").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_user() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in("Ada", "ada@example.com").await;

    let response = ctx.get("/api/auth/user", &ada.token).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["id"], ada.user_id.to_string());
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["name"], "Ada");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_update_profile() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in("Ada", "ada@example.com").await;
    ctx.signed_in("Bob", "bob@example.com").await;

    let taken = ctx
        .put(
            "/api/auth/profile",
            &ada.token,
            json!({ "name": "Ada", "email": "bob@example.com" }),
        )
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);

    // Keeping one's own email is fine
    let updated = ctx
        .put(
            "/api/auth/profile",
            &ada.token,
            json!({ "name": "Ada Lovelace", "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let user = ctx.get("/api/auth/user", &ada.token).await.json();
    assert_eq!(user["name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_update_current_password() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in("Ada", "ada@example.com").await;

    let wrong = ctx
        .post(
            "/api/auth/update-password",
            Some(&ada.token),
            json!({
                "current_password": "not-my-password",
                "password": "new-password",
                "password_confirmation": "new-password",
            }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let changed = ctx
        .post(
            "/api/auth/update-password",
            Some(&ada.token),
            json!({
                "current_password": PASSWORD,
                "password": "new-password",
                "password_confirmation": "new-password",
            }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    assert_eq!(ctx.login("ada@example.com", "new-password").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_check_password() {
    let ctx = TestContext::new();
    let ada = ctx.signed_in("Ada", "ada@example.com").await;

    let ok = ctx
        .post("/api/auth/check-password", Some(&ada.token), json!({ "password": PASSWORD }))
        .await;
    assert_eq!(ok.status, StatusCode::OK);

    let wrong = ctx
        .post("/api/auth/check-password", Some(&ada.token), json!({ "password": "nope" }))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}
