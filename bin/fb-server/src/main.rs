//! FeatureBoard Server
//!
//! Production server for the feature board REST APIs:
//! - Feature APIs: listing, search, sorting, voting, comments
//! - User APIs: registration, login, profile, admin management
//! - Monitoring: health, metrics
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FB_API_PORT` | `8080` | HTTP API port |
//! | `FB_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `FB_MONGO_DB` | `featureboard` | MongoDB database name |
//! | `FB_JWT_SECRET` | - | HS256 signing secret (required outside dev mode) |
//! | `FB_DEV_MODE` | `false` | Allow a generated dev secret |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | `text` | `json` for structured output |

use std::sync::Arc;

use anyhow::{bail, Result};
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use fb_platform::auth::{AuthConfig, AuthService, PasswordService};
use fb_platform::feature::api::{features_router, FeaturesState};
use fb_platform::shared::indexes::initialize_indexes;
use fb_platform::shared::middleware::{AppState, AuthLayer};
use fb_platform::user::api::{users_router, UsersState};
use fb_platform::{FeatureRepository, UserRepository};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    fb_common::logging::init_logging("fb-server");

    info!("Starting FeatureBoard Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("FB_API_PORT", 8080);
    let mongo_url = env_or("FB_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("FB_MONGO_DB", "featureboard");
    let dev_mode = std::env::var("FB_DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let secret_key = match std::env::var("FB_JWT_SECRET") {
        Ok(secret) if !secret.is_empty() => secret,
        _ if dev_mode => {
            tracing::warn!("FB_JWT_SECRET not set, using a dev-only secret");
            "featureboard-dev-secret".to_string()
        }
        _ => bail!("FB_JWT_SECRET must be set (or enable FB_DEV_MODE)"),
    };

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    initialize_indexes(&db).await?;

    // Initialize repositories
    let user_repo = Arc::new(UserRepository::new(&db));
    let feature_repo = Arc::new(FeatureRepository::new(&db));
    info!("Repositories initialized");

    // Initialize services
    let auth_service = Arc::new(AuthService::new(AuthConfig {
        secret_key,
        ..AuthConfig::default()
    }));
    let password_service = Arc::new(PasswordService::default());
    info!("Auth services initialized");

    // Create AppState for the auth middleware
    let app_state = AppState {
        auth_service: auth_service.clone(),
        user_repo: user_repo.clone(),
    };

    // Build API states
    let users_state = UsersState {
        user_repo: user_repo.clone(),
        password_service,
        auth_service,
    };
    let features_state = FeaturesState {
        feature_repo,
        user_repo,
    };

    // Build API router using OpenApiRouter for auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/api/v1/users", users_router(users_state))
        .nest("/api/v1/features", features_router(features_state))
        .split_for_parts();

    openapi.info.title = "FeatureBoard API".to_string();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi.info.description =
        Some("REST APIs for feature requests, voting, and accounts".to_string());

    let app = Router::new()
        .merge(router)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FeatureBoard Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler() -> &'static str {
    "# HELP fb_server_up Server is up\n# TYPE fb_server_up gauge\nfb_server_up 1\n"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
