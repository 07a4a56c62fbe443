//! Authentication and authorization for the REST surface
//!
//! The trust boundary lives here: bearer tokens are validated against the
//! cached provider keys, and the resulting claims are folded together with
//! the stored user record into a typed [`Principal`] exactly once. Handlers
//! receive the principal through extractors and never look at raw claims.

pub mod jwt;
pub mod keys;

pub use jwt::{Claims, TokenValidationConfig};
pub use keys::{HttpKeyFetcher, Jwk, JwkSet, KeyFetcher, SigningKeyCache};

use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;
use strata_applications::Principal;
use tracing::{debug, warn};

/// Authentication errors surfaced by the extractors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Signing key retrieval failed: {0}")]
    KeyRetrieval(String),
    #[error("superAdmin role required")]
    Forbidden,
    #[error("Authentication backend failure: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "missing_auth_header"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired"),
            AuthError::KeyRetrieval(_) => (StatusCode::SERVICE_UNAVAILABLE, "key_retrieval"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };

        let body = Json(json!({
            "error": error_code,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

/// Extract the bearer token from the authorization header.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get("authorization")
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}

/// Build the typed principal for a validated claim set.
///
/// The permission tree comes from the token's `SecurityAccess` claim when
/// present, otherwise from the stored user record (created on first sight).
/// The avatar falls back to the email, like the display name.
async fn resolve_principal(state: &AppState, claims: Claims) -> Result<Principal, AuthError> {
    let record = state
        .application
        .load_user(&claims.sub)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let access = claims.security_access().unwrap_or(record.access);
    let super_admin = state.application.is_super_admin(claims.email.as_deref());

    if super_admin {
        debug!(principal = %claims.sub, "Authenticated super admin");
    }

    Ok(Principal {
        id: claims.sub,
        avatar: claims.picture.or_else(|| claims.email.clone()),
        email: claims.email,
        full_name: claims.name,
        first_name: claims.given_name,
        last_name: claims.family_name,
        access,
        super_admin,
    })
}

/// Authenticated caller extractor: any principal with a valid token.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let keys = state.key_cache.get_or_fetch(Utc::now()).await?;
        let claims = jwt::verify_token(token, &keys, &state.token_validation)?;

        let principal = resolve_principal(&state, claims).await?;
        Ok(Authenticated(principal))
    }
}

/// Super-admin extractor: rejects principals outside the configured admin
/// set with 403.
pub struct SuperAdmin(pub Principal);

impl<S> FromRequestParts<S> for SuperAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(principal) = Authenticated::from_request_parts(parts, state).await?;

        if principal.super_admin {
            Ok(SuperAdmin(principal))
        } else {
            warn!(principal = %principal.id, "superAdmin role required");
            Err(AuthError::Forbidden)
        }
    }
}
