/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_api::{app::AppState, config::Config};
/// use uptask_shared::{db::memory::MemoryStore, email::LogMailer};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(LogMailer), config);
/// let app = uptask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, MAX_SESSION_DAYS, MAX_TOKEN_TTL_MINUTES},
    error::ApiError,
    middleware::security::security_headers,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{warn, Level};
use uptask_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::authenticate,
    },
    db::store::Store,
    email::{auth::AuthEmail, Mailer, OutboundEmail},
};
use uuid::Uuid;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Persistence
    pub store: Arc<dyn Store>,

    /// Outbound email
    pub mailer: Arc<dyn Mailer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        Self {
            store,
            mailer,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Lifetime of confirmation and reset codes
    ///
    /// An out-of-range setting yields zero, so no code is redeemable.
    pub fn token_ttl(&self) -> Duration {
        let minutes = self.config.account.token_ttl_minutes;
        if (0..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
            Duration::minutes(minutes)
        } else {
            Duration::zero()
        }
    }

    /// Templates for the account workflow emails
    pub fn auth_email(&self) -> AuthEmail {
        AuthEmail::new(
            self.config.api.frontend_url.clone(),
            self.config.account.token_ttl_minutes,
        )
    }

    /// Signs a session token for `user_id`
    pub fn issue_session(&self, user_id: Uuid) -> Result<String, ApiError> {
        let days = self.config.jwt.expiration_days;
        if !(1..=MAX_SESSION_DAYS).contains(&days) {
            return Err(ApiError::InternalError(format!(
                "Session lifetime of {days} days is out of range"
            )));
        }
        let claims = Claims::with_expiration(user_id, Duration::days(days));
        Ok(jwt::create_token(&claims, self.jwt_secret())?)
    }

    /// Sends an email, logging instead of failing when delivery doesn't work
    pub async fn send_email(&self, email: OutboundEmail) {
        let to = email.to.clone();
        if let Err(e) = self.mailer.send(email).await {
            warn!(to = %to, error = %e, "Failed to send email");
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                     # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /create-account
///     │   ├── POST /confirm-account
///     │   ├── POST /login
///     │   ├── POST /request-code
///     │   ├── POST /forgot-password
///     │   ├── POST /validate-token
///     │   ├── POST /update-password/:token
///     │   ├── GET  /user                           # authenticated
///     │   ├── PUT  /profile                        # authenticated
///     │   ├── POST /update-password                # authenticated
///     │   └── POST /check-password                 # authenticated
///     └── /projects/                               # all authenticated
///         ├── POST   /
///         ├── GET    /
///         ├── GET    /:projectId
///         ├── PUT    /:projectId                   # manager
///         ├── DELETE /:projectId                   # manager
///         ├── POST   /:projectId/tasks             # manager
///         ├── GET    /:projectId/tasks
///         ├── GET    /:projectId/tasks/:taskId
///         ├── PUT    /:projectId/tasks/:taskId     # manager
///         ├── DELETE /:projectId/tasks/:taskId     # manager
///         ├── POST   /:projectId/tasks/:taskId/status
///         ├── POST   /:projectId/team/find         # manager
///         ├── GET    /:projectId/team
///         ├── POST   /:projectId/team              # manager
///         ├── DELETE /:projectId/team/:userId      # manager
///         ├── POST   /:projectId/tasks/:taskId/notes
///         ├── GET    /:projectId/tasks/:taskId/notes
///         └── DELETE /:projectId/tasks/:taskId/notes/:noteId
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Account workflow (public)
    let public_auth_routes = Router::new()
        .route("/create-account", post(routes::auth::create_account))
        .route("/confirm-account", post(routes::auth::confirm_account))
        .route("/login", post(routes::auth::login))
        .route("/request-code", post(routes::auth::request_code))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/validate-token", post(routes::auth::validate_token))
        .route(
            "/update-password/:token",
            post(routes::auth::update_password_with_token),
        );

    // Caller's own account (require JWT authentication)
    let account_routes = Router::new()
        .route("/user", get(routes::auth::current_user))
        .route("/profile", put(routes::auth::update_profile))
        .route("/update-password", post(routes::auth::update_current_password))
        .route("/check-password", post(routes::auth::check_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:projectId",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:projectId/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:projectId/tasks/:taskId",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:projectId/tasks/:taskId/status",
            post(routes::tasks::update_status),
        )
        .route("/:projectId/team/find", post(routes::team::find_member))
        .route(
            "/:projectId/team",
            get(routes::team::list_team).post(routes::team::add_member),
        )
        .route("/:projectId/team/:userId", delete(routes::team::remove_member))
        .route(
            "/:projectId/tasks/:taskId/notes",
            post(routes::notes::create_note).get(routes::notes::list_notes),
        )
        .route(
            "/:projectId/tasks/:taskId/notes/:noteId",
            delete(routes::notes::delete_note),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(account_routes))
        .nest("/projects", project_routes);

    let cors = match state.config.api.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600)),
        Err(_) => {
            warn!(
                frontend_url = %state.config.api.frontend_url,
                "FRONTEND_URL is not a valid origin, allowing any origin"
            );
            CorsLayer::permissive()
        }
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer session token, then injects `AuthContext` into
/// request extensions. The caller's user record is loaded later by the
/// `Caller` extractor.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uptask_shared::{db::memory::MemoryStore, email::MemoryMailer};

    fn state() -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryMailer::new()),
            Config::for_testing("test-secret-key-at-least-32-bytes-long"),
        )
    }

    #[test]
    fn test_issue_session_round_trips() {
        let state = state();
        let user_id = Uuid::new_v4();

        let token = state.issue_session(user_id).unwrap();
        let claims = jwt::validate_token(&token, state.jwt_secret()).unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_token_ttl() {
        assert_eq!(state().token_ttl(), Duration::minutes(10));
    }

    #[test]
    fn test_out_of_range_lifetimes_do_not_panic() {
        let mut config = Config::for_testing("test-secret-key-at-least-32-bytes-long");
        config.jwt.expiration_days = 200_000_000_000_000;
        config.account.token_ttl_minutes = i64::MAX;
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryMailer::new()),
            config,
        );

        assert!(matches!(
            state.issue_session(Uuid::new_v4()),
            Err(ApiError::InternalError(_))
        ));
        assert_eq!(state.token_ttl(), Duration::zero());
    }
}
