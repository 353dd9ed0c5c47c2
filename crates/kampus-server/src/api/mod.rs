//! HTTP surface: router, shared state and the response envelope.
//!
//! Every handler locks the database, calls into [`crate::services`] and
//! wraps the result as `{"success": true, "data": ...}`. Failures become
//! `{"success": false, "message": ...}` through [`ServerError`].

mod admin;
mod auth;
mod extract;
mod messages;
mod products;
mod ratings;
mod reports;
mod users;

use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use kampus_store::Database;

use crate::auth::TokenKeys;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

pub use extract::{parse_id, Params, Payload};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub tokens: Arc<TokenKeys>,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            tokens: Arc::new(TokenKeys::new(&config.jwt_secret, config.jwt_expire_hours)),
            rate_limiter: RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst),
            config: Arc::new(config),
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<Envelope<T>>, ServerError>;
pub type Created<T> = Result<(StatusCode, Json<Envelope<T>>), ServerError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        message: None,
        data,
    }))
}

pub fn ok_with<T: Serialize>(message: &'static str, data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        message: Some(message),
        data,
    }))
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> Created<T> {
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            message: Some(message),
            data,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/", get(service_index))
        .route("/health", get(health_check))
        .nest("/api/auth", auth::routes())
        .nest("/api/users", users::routes())
        .nest("/api/products", products::routes())
        .nest("/api/messages", messages::routes())
        .nest("/api/ratings", ratings::routes())
        .nest("/api/reports", reports::routes())
        .nest("/api/admin", admin::routes())
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn service_index(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(json!({
        "name": state.config.instance_name,
        "version": env!("CARGO_PKG_VERSION"),
        "registrationOpen": state.config.registration_open,
        "endpoints": {
            "auth": "/api/auth",
            "users": "/api/users",
            "products": "/api/products",
            "messages": "/api/messages",
            "ratings": "/api/ratings",
            "reports": "/api/reports",
            "admin": "/api/admin",
            "health": "/health",
        },
    }))
}

async fn route_not_found() -> ServerError {
    ServerError::NotFound("Route not found".into())
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use kampus_shared::types::Role;
    use kampus_store::{Database, User};

    use super::{build_router, AppState};
    use crate::config::ServerConfig;

    /// A router over a fresh in-memory database.
    pub struct TestApp {
        pub state: AppState,
        router: Router,
    }

    impl TestApp {
        pub fn new() -> Self {
            Self::with_config(ServerConfig::default())
        }

        pub fn with_config(config: ServerConfig) -> Self {
            let state = AppState::new(Database::open_in_memory().unwrap(), config);
            let router = build_router(state.clone());
            Self { state, router }
        }

        /// Create an account directly in the store and sign a token for it.
        pub async fn user(&self, name: &str, role: Role) -> (User, String) {
            let db = self.state.db.lock().await;
            let user = crate::services::testing::user_with_role(&db, name, role);
            let token = self.state.tokens.issue(user.id).unwrap();
            (user, token)
        }

        pub async fn request(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            self.request(Method::GET, uri, token, None).await
        }

        pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
            self.request(Method::POST, uri, token, Some(body)).await
        }

        pub async fn put(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            self.request(Method::PUT, uri, token, body).await
        }

        pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
            self.request(Method::DELETE, uri, token, None).await
        }
    }
}
