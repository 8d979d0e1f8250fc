//! IAM API server
//!
//! Wires Postgres, the activity-log worker, the OTP sweeper and the optional
//! SMTP mailer into the IAM router under `/api`. Startup failures are
//! `anyhow` errors; request failures render through `iam::IamError`.

mod config;

use axum::{
    Router,
    http::{self, Method, header},
};
use iam::{ActivityLog, IamAppState, PgIamRepository, iam_router};
use platform::mailer::SmtpMailer;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ApiConfig;

/// How long the activity log may take to drain on shutdown
const LOG_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
/// Expired or revoked tokens are kept this long for auditing
const TOKEN_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,iam=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = Arc::new(PgIamRepository::new(pool.clone()));

    // Startup cleanup: errors here should not prevent server startup
    match repo.cleanup_expired_tokens(TOKEN_RETENTION).await {
        Ok(deleted) => {
            tracing::info!(tokens_deleted = deleted, "Access token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Access token cleanup failed, continuing anyway");
        }
    }

    // Activity log worker
    let (activity, worker) = ActivityLog::new(repo.clone(), config.iam.log_queue_capacity);
    let worker = tokio::spawn(worker.run());

    // IAM state
    let otp_sweep_interval = config.iam.otp_sweep_interval;
    let mut state: IamAppState<PgIamRepository, SmtpMailer> =
        IamAppState::new(repo, config.iam, activity)?;

    match &config.smtp {
        Some(smtp) => {
            state = state.with_mailer(SmtpMailer::new(smtp)?);
            tracing::info!(host = %smtp.host, port = smtp.port, "SMTP mailer configured");
        }
        None => {
            tracing::warn!("SMTP_HOST not set, OTP delivery is disabled");
        }
    }

    let sweeper = state.otp.spawn_sweeper(otp_sweep_interval);

    // Browser clients read the trace id back from x-request-id
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            http::HeaderName::from_static(iam::presentation::X_REQUEST_ID),
        ]))
        .expose_headers([http::HeaderName::from_static(iam::presentation::X_REQUEST_ID)]);

    let app = Router::new()
        .nest("/api", iam_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router (and with it every ActivityLog sender) is gone; let the
    // worker drain what is queued
    sweeper.abort();
    if tokio::time::timeout(LOG_DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("Activity log did not drain before shutdown");
    }
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
