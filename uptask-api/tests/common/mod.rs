//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - An app backed by the in-memory store and mailer
//! - Request helpers returning status and body
//! - Account helpers (register, read the emailed code, confirm, login)
//! - Project and task helpers

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_shared::{
    db::{memory::MemoryStore, store::Store},
    email::MemoryMailer,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "password123";

/// Response status and raw body
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("body is not JSON ({e}): {}", self.body))
    }
}

/// A signed-in user
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<MemoryMailer>,
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        Self::with_config(Config::for_testing(JWT_SECRET))
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(store.clone(), mailer.clone(), config);

        Self {
            app: build_router(state),
            store,
            mailer,
        }
    }

    /// Sends one request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            body: String::from_utf8_lossy(&bytes).to_string(),
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers an account and returns the response
    pub async fn register(&self, name: &str, email: &str) -> TestResponse {
        self.post(
            "/api/auth/create-account",
            None,
            json!({
                "name": name,
                "email": email,
                "password": PASSWORD,
                "password_confirmation": PASSWORD,
            }),
        )
        .await
    }

    /// Six digit code from the latest email sent to `email`
    pub async fn latest_code(&self, email: &str) -> String {
        let message = self
            .mailer
            .last_to(email)
            .await
            .unwrap_or_else(|| panic!("no email sent to {email}"));

        let start = message
            .text
            .find("Your code is: ")
            .expect("email carries a code")
            + "Your code is: ".len();

        message.text[start..start + 6].to_string()
    }

    /// Logs in and returns the response
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Registers, confirms through the emailed code and logs in
    pub async fn signed_in(&self, name: &str, email: &str) -> Session {
        let registered = self.register(name, email).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.body);

        let code = self.latest_code(email).await;
        let confirmed = self
            .post("/api/auth/confirm-account", None, json!({ "token": code }))
            .await;
        assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.body);

        let login = self.login(email, PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.body);

        let user = self
            .store
            .find_user_by_email(email)
            .await
            .unwrap()
            .expect("user exists");

        Session {
            user_id: user.id,
            email: email.to_string(),
            token: login.body,
        }
    }

    /// Creates a project managed by `session` and returns its id
    pub async fn create_project(&self, session: &Session, name: &str) -> Uuid {
        let created = self
            .post(
                "/api/projects",
                Some(&session.token),
                json!({
                    "projectName": name,
                    "clientName": "ACME",
                    "description": "Project description",
                }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

        let projects = self
            .store
            .list_projects_for_user(session.user_id)
            .await
            .unwrap();

        projects
            .into_iter()
            .filter(|p| p.project_name == name)
            .max_by_key(|p| p.created_at)
            .expect("project was created")
            .id
    }

    /// Creates a task in the project and returns its id
    pub async fn create_task(&self, session: &Session, project_id: Uuid, name: &str) -> Uuid {
        let created = self
            .post(
                &format!("/api/projects/{project_id}/tasks"),
                Some(&session.token),
                json!({ "name": name, "description": "Task description" }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

        let tasks = self.store.list_tasks(project_id).await.unwrap();

        tasks
            .into_iter()
            .filter(|t| t.name == name)
            .max_by_key(|t| t.created_at)
            .expect("task was created")
            .id
    }

    /// Adds `member` to the project's team as its manager
    pub async fn add_to_team(&self, manager: &Session, project_id: Uuid, member: &Session) {
        let added = self
            .post(
                &format!("/api/projects/{project_id}/team"),
                Some(&manager.token),
                json!({ "id": member.user_id }),
            )
            .await;
        assert_eq!(added.status, StatusCode::OK, "{}", added.body);
    }
}
