//! # Sprout HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Record counts and content coverage
//! - `GET /stages` - Ordered stage list with content row counts
//! - `GET /stage?birth_date=..&today=..` - Classify a birth date
//! - `GET|POST /children`, `GET|PUT|DELETE /children/{id}` - Children
//! - `GET /children/{id}/guidance` - Stage, window and content for a child
//! - `GET|POST /milestones`, `GET|PUT|DELETE /milestones/{id}` - Milestones
//! - `GET|POST /activities`, `GET|PUT|DELETE /activities/{id}` - Activities
//! - `GET|PUT /profile` - Caller profile
//! - `POST /onboarding/complete` - Complete onboarding
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `SPROUT_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `SPROUT_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `SPROUT_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{CurrentUser, USER_ID_HEADER, get_api_key_from_env};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `sprout::api::*`)
#[allow(unused_imports)]
pub use handlers::{ApiError, health_handler, stage_handler, stages_handler, status_handler};
#[allow(unused_imports)]
pub use types::{
    ActivitiesResponse, ActivityJson, ActivityResponse, AgeJson, ChildJson, ChildResponse,
    ChildrenResponse, CreateActivityRequest, CreateChildRequest, CreateMilestoneRequest,
    DeleteResponse, ErrorResponse, GuidanceQuery, GuidanceResponse, HealthResponse,
    MilestoneJson, MilestoneResponse, MilestonesResponse, OnboardingRequest, OnboardingResponse,
    ProfileResponse, StageCoverage, StageQuery, StageResponse, StagesResponse, StatusResponse,
    UpdateActivityRequest, UpdateChildRequest, UpdateMilestoneRequest, UpdateProfileRequest,
    parse_instant,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use sprout_core::{ContentTable, Registry, SproutError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the record registry and the loaded content table.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    /// Read-only after startup.
    pub content: Arc<ContentTable>,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Registry, content: ContentTable) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
            content: Arc::new(content),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

fn cors_headers() -> [HeaderName; 3] {
    [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        HeaderName::from_static(USER_ID_HEADER),
    ]
}

/// Build CORS layer from environment configuration.
///
/// Reads `SPROUT_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("SPROUT_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (SPROUT_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in SPROUT_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers(cors_headers())
            }
        }
        None => {
            tracing::info!("CORS: No SPROUT_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers(cors_headers())
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting - protects against DoS (if enabled)
/// 5. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - endpoints rely on the upstream X-User-Id header only. \
             Set SPROUT_API_KEY environment variable to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/stages", get(handlers::stages_handler))
        .route("/stage", get(handlers::stage_handler))
        .route(
            "/children",
            get(handlers::list_children_handler).post(handlers::create_child_handler),
        )
        .route(
            "/children/{id}",
            get(handlers::get_child_handler)
                .put(handlers::update_child_handler)
                .delete(handlers::delete_child_handler),
        )
        .route("/children/{id}/guidance", get(handlers::guidance_handler))
        .route(
            "/milestones",
            get(handlers::list_milestones_handler).post(handlers::create_milestone_handler),
        )
        .route(
            "/milestones/{id}",
            get(handlers::get_milestone_handler)
                .put(handlers::update_milestone_handler)
                .delete(handlers::delete_milestone_handler),
        )
        .route(
            "/activities",
            get(handlers::list_activities_handler).post(handlers::create_activity_handler),
        )
        .route(
            "/activities/{id}",
            get(handlers::get_activity_handler)
                .put(handlers::update_activity_handler)
                .delete(handlers::delete_activity_handler),
        )
        .route(
            "/profile",
            get(handlers::get_profile_handler).put(handlers::update_profile_handler),
        )
        .route("/onboarding/complete", post(handlers::onboarding_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Start the HTTP server and serve until Ctrl-C.
pub async fn run_server(
    addr: &str,
    registry: Registry,
    content: ContentTable,
) -> Result<(), SproutError> {
    let state = AppState::new(registry, content);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SproutError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Sprout HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SproutError::IoError(format!("Server error: {}", e)))
}
