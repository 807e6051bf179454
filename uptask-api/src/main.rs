//! # UpTask API Server
//!
//! Project and task management backend: account registration with email
//! confirmation, password reset, and projects with tasks, teams and notes.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Account endpoints under `/api/auth`
//! - Project, task, team and note endpoints under `/api/projects`
//! - Bearer session tokens (JWT)
//! - PostgreSQL persistence, or an in-memory store when `DATABASE_URL` is unset
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p uptask-api
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptask_api::{
    app::{build_router, AppState},
    config::Config,
};
use uptask_shared::{
    db::{
        memory::MemoryStore,
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
        postgres::PgStore,
        store::Store,
    },
    email::{
        smtp::{SmtpConfig, SmtpMailer},
        LogMailer, Mailer,
    },
};

/// How often expired confirmation and reset codes are purged
const TOKEN_PURGE_INTERVAL_SECONDS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "uptask_api=debug,uptask_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("UpTask API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let (store, pool): (Arc<dyn Store>, Option<PgPool>) = match &config.database {
        Some(database) => {
            ensure_database_exists(&database.url).await?;

            let pool = create_pool(DatabaseConfig {
                url: database.url.clone(),
                max_connections: database.max_connections,
                ..DatabaseConfig::default()
            })
            .await?;

            run_migrations(&pool).await?;
            let status = get_migration_status(&pool).await?;
            tracing::info!(
                applied = status.applied_migrations,
                schema_version = ?status.latest_version,
                "Database schema is current"
            );

            (Arc::new(PgStore::new(pool.clone())), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using the in-memory store; data is lost on restart");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Sending email through SMTP");
            Arc::new(SmtpMailer::new(SmtpConfig::from(smtp))?)
        }
        None => {
            tracing::warn!("SMTP_HOST is not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let purge = tokio::spawn(purge_expired_tokens(
        store.clone(),
        Duration::minutes(config.account.token_ttl_minutes),
    ));

    let bind_address = config.bind_address();
    let state = AppState::new(store, mailer, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge.abort();
    if let Some(pool) = pool {
        close_pool(&pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Deletes codes older than `ttl` once per interval
async fn purge_expired_tokens(store: Arc<dyn Store>, ttl: Duration) {
    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(TOKEN_PURGE_INTERVAL_SECONDS));

    loop {
        interval.tick().await;

        match store.purge_expired_tokens(Utc::now() - ttl).await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Purged expired tokens"),
            Err(e) => tracing::warn!(error = %e, "Failed to purge expired tokens"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
