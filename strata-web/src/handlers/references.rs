//! Document reference handlers
//!
//! References are structural pointers between documents. They are listed and
//! edited here but never expanded; consumers fetch referenced documents
//! themselves.

use crate::auth::Authenticated;
use crate::{AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddReferenceRequest {
    /// Name of the referenced document
    pub reference: String,
}

/// Names of the documents referenced by this configuration.
pub async fn list_references(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, WebError> {
    let references = state
        .application
        .list_references(&principal, &project, &config)
        .await?;
    Ok(Json(references))
}

/// Add a reference to another document in the same project. The referenced
/// document must exist and be readable by the caller.
pub async fn add_reference(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config)): Path<(String, String)>,
    Json(request): Json<AddReferenceRequest>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .add_reference(&principal, &project, &config, &request.reference)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_reference(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, reference)): Path<(String, String, String)>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .remove_reference(&principal, &project, &config, &reference)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
