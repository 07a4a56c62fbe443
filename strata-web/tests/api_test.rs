//! API surface tests: routing, health, and the authentication boundary.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use strata_applications::{
    ApplicationConfig, MemoryDocumentStore, MemoryUserStore, NoopVersionControlProvider,
    StrataApplication,
};
use strata_web::auth::{AuthError, Jwk, KeyFetcher};
use strata_web::{create_app, AppState, WebConfig};
use tower::ServiceExt;

struct EmptyKeyFetcher;

#[async_trait]
impl KeyFetcher for EmptyKeyFetcher {
    async fn fetch(&self) -> Result<(Vec<Jwk>, DateTime<Utc>), AuthError> {
        Ok((Vec::new(), Utc::now() + Duration::minutes(10)))
    }
}

fn test_state() -> AppState {
    let application = StrataApplication::builder(ApplicationConfig::default())
        .with_document_store(Arc::new(MemoryDocumentStore::new()))
        .with_user_store(Arc::new(MemoryUserStore::new()))
        .with_version_control(Arc::new(NoopVersionControlProvider))
        .build();

    AppState::with_application(
        WebConfig::default(),
        Arc::new(application),
        Arc::new(EmptyKeyFetcher),
    )
}

#[tokio::test]
async fn health_check_requires_no_authentication() {
    let app = create_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn project_listing_rejects_anonymous_callers() {
    let app = create_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_tokens_are_rejected() {
    let app = create_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/clusters/acme/billing")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_authorization_is_rejected() {
    let app = create_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_fall_through_to_404() {
    let app = create_app(test_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
