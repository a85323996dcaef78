//! Application state and router builder
//!
//! Defines the shared application state and builds the Axum router with all
//! routes and middleware. The state carries the extension objects (pool,
//! config, mailer) constructed once at startup; handlers receive them via
//! Axum's `State` extractor instead of reaching for globals.
//!
//! # Router layout
//!
//! ```text
//! /
//! ├── /health                         # Health check (public)
//! └── /v1/
//!     ├── /auth/
//!     │   ├── POST /login
//!     │   ├── POST /refresh
//!     │   ├── POST /forgot-password
//!     │   └── POST /reset-password
//!     ├── /my/
//!     │   └── GET /parts              # Consigner's own inventory (JWT)
//!     └── /admin/                     # JWT + admin flag
//!         ├── GET  /parts             # Filtered, paginated unsold listing
//!         ├── POST /parts
//!         ├── PUT  /parts/:id         # Single-field update / status change
//!         ├── DELETE /parts/:id
//!         ├── GET  /consigners
//!         ├── POST /consigners
//!         ├── PUT  /consigners/:id
//!         ├── DELETE /consigners/:id
//!         ├── GET  /consigners/:id/parts
//!         ├── GET  /invoice-info
//!         ├── PUT  /invoice-info
//!         ├── POST /invoices          # Generate invoice PDF
//!         ├── POST /import/parts
//!         └── POST /import/consigners
//! ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use partledger_shared::auth::{jwt, middleware::AuthContext};
use partledger_shared::mailer::Mailer;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outgoing mail transport
    pub mailer: Arc<Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer: Arc::new(mailer),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // Consigner self-service routes (JWT, non-admin)
    let my_routes = Router::new()
        .route("/parts", get(routes::parts::my_parts))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Admin routes (JWT + admin flag)
    let admin_routes = Router::new()
        .route(
            "/parts",
            get(routes::parts::list_parts).post(routes::parts::create_part),
        )
        .route(
            "/parts/:id",
            put(routes::parts::update_part_field).delete(routes::parts::delete_part),
        )
        .route(
            "/consigners",
            get(routes::consigners::list_consigners).post(routes::consigners::create_consigner),
        )
        .route(
            "/consigners/:id",
            put(routes::consigners::update_consigner_field)
                .delete(routes::consigners::delete_consigner),
        )
        .route(
            "/consigners/:id/parts",
            get(routes::consigners::consigner_parts),
        )
        .route(
            "/invoice-info",
            get(routes::invoices::get_invoice_info).put(routes::invoices::put_invoice_info),
        )
        .route("/invoices", post(routes::invoices::generate_invoice))
        .route("/import/parts", post(routes::imports::import_parts))
        .route(
            "/import/consigners",
            post(routes::imports::import_consigners),
        )
        .layer(axum::middleware::from_fn(admin_guard))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/my", my_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the bearer token from the Authorization header,
/// then injects [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    req.extensions_mut()
        .insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Admin guard middleware
///
/// Runs after `jwt_auth_layer`; rejects authenticated non-admin users.
async fn admin_guard(req: Request, next: Next) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .copied()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    if !auth.is_admin {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
