//! HTTP server bootstrap for the book poll service.
//!
//! This module wires together:
//! - configuration
//! - database connection pool
//! - the stores, token signer, and metrics registry
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use crate::api::{ApiError, ErrorCode, HealthResponse};
use crate::auth::{AuthMiddlewareState, Authenticator, RateLimiter, TokenSigner};
use crate::infra::{PgStatusStore, PgUserStore, PgVoteStore, StatusStore, UserStore, VoteStore};
use crate::metrics::MetricsRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/bookvote".to_string());

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .expect("Invalid listen address");

        let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        Self {
            database_url,
            listen_addr,
            max_connections,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub votes: Arc<dyn VoteStore>,
    pub status: Arc<dyn StatusStore>,
    pub tokens: Arc<TokenSigner>,
    pub metrics: Arc<MetricsRegistry>,
    /// Set when backed by Postgres; `/ready` pings it.
    pub pool: Option<PgPool>,
    /// Required email suffix for registration, when configured.
    pub email_domain: Option<String>,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting bookvote v{}", env!("CARGO_PKG_VERSION"));

    // Token signing configuration. The secret has no default.
    let secret = match std::env::var("JWT_SECRET") {
        Ok(s) if !s.trim().is_empty() => s,
        _ => anyhow::bail!("JWT_SECRET must be set"),
    };
    let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bookvote".to_string());
    let audience = std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bookvote-api".to_string());
    let access_ttl = env_i64("ACCESS_TOKEN_TTL_SECS", 3600);
    let refresh_ttl = env_i64("REFRESH_TOKEN_TTL_SECS", 7 * 24 * 3600);

    let tokens = Arc::new(TokenSigner::new(
        secret.as_bytes(),
        &issuer,
        &audience,
        chrono::Duration::seconds(access_ttl),
        chrono::Duration::seconds(refresh_ttl),
    ));

    let rate_limiter = std::env::var("RATE_LIMIT_PER_MINUTE")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .map(|rpm| Arc::new(RateLimiter::new(rpm)));

    let auth_state = AuthMiddlewareState {
        authenticator: Arc::new(Authenticator::new(tokens.clone())),
        rate_limiter,
    };

    let email_domain = std::env::var("REGISTRATION_EMAIL_DOMAIN")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(domain) = &email_domain {
        info!("Registration restricted to email domain {}", domain);
    }

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);

    // Connect to PostgreSQL
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to PostgreSQL");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run_postgres(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    // Create application state
    let state = AppState {
        users: Arc::new(PgUserStore::new(pool.clone())),
        votes: Arc::new(PgVoteStore::new(pool.clone())),
        status: Arc::new(PgStatusStore::new(pool.clone())),
        tokens,
        metrics: Arc::new(MetricsRegistry::new()),
        pool: Some(pool),
        email_domain,
    };

    // Build router
    let app = build_router(auth_state)?.with_state(state);

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("bookvote is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Assemble the full route tree: public routes, token-protected routes, and
/// the service probes.
pub fn build_router(auth_state: AuthMiddlewareState) -> anyhow::Result<Router<AppState>> {
    let protected = crate::api::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::auth_middleware,
    ));

    let mut router = Router::new()
        .merge(crate::api::public_router())
        .merge(protected)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_export))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "bookvote".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check endpoint.
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(pool) = &state.pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            return Err(ApiError::new(
                ErrorCode::ServiceUnavailable,
                format!("Database unavailable: {}", e),
            ));
        }
    }

    let database = if state.pool.is_some() {
        "connected"
    } else {
        "not configured"
    };

    Ok(Json(serde_json::json!({
        "status": "ready",
        "database": database,
    })))
}

/// Prometheus text exposition endpoint.
async fn metrics_export(State(state): State<AppState>) -> String {
    state.metrics.to_prometheus().await
}

/// Install signal handlers and return a future that completes on shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
