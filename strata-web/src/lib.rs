//! Strata Web Server
//!
//! REST surface for the tiered configuration service: projects, configuration
//! documents ("jars"), clusters, machines and references, each gated by the
//! caller's permission tree.

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::StrataServer;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    Router,
};
use strata_applications::ApplicationError;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base directory for projects and users
    pub data_dir: Option<std::path::PathBuf>,
    /// Expected token audience
    pub audience: String,
    /// Expected token issuer
    pub issuer: String,
    /// Identity provider endpoint serving the signing keys
    pub jwks_url: String,
    /// Emails granted the superAdmin role
    pub super_admins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: None,
            audience: String::new(),
            issuer: String::new(),
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            super_admins: Vec::new(),
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("STRATA_HOST").unwrap_or(defaults.host),
            port: std::env::var("STRATA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: std::env::var("STRATA_DATA_DIR").ok().map(Into::into),
            audience: std::env::var("STRATA_AUDIENCE").unwrap_or(defaults.audience),
            issuer: std::env::var("STRATA_ISSUER").unwrap_or(defaults.issuer),
            jwks_url: std::env::var("STRATA_JWKS_URL").unwrap_or(defaults.jwks_url),
            super_admins: std::env::var("STRATA_SUPER_ADMINS")
                .map(|raw| {
                    raw.split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Application error: {0}")]
    Application(#[from] ApplicationError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let (status, message) = match &self {
            WebError::Application(ApplicationError::Permission { message }) => {
                (StatusCode::FORBIDDEN, message.clone())
            }
            WebError::Application(e) if e.is_not_found() => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            WebError::Application(ApplicationError::Core(
                strata_core::StrataError::AlreadyExists { .. },
            )) => (StatusCode::CONFLICT, self.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));
        (status, body).into_response()
    }
}

/// Initialize logging for the web server
pub fn init_logging() {
    let config = strata_core::LoggingConfig::default();
    if let Err(e) = strata_core::init_logging(&config) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}
