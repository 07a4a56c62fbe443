//! Configuration document ("jar") handlers
//!
//! Whole-document operations are restricted to super admins; the listing of
//! readable names is open to any authenticated principal and filtered by its
//! permission tree.

use crate::auth::{Authenticated, SuperAdmin};
use crate::{AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use strata_core::ConfigDocument;
use tracing::info;

/// Names of the documents the caller may read in a project.
pub async fn list_document_names(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path(project): Path<String>,
) -> Result<Json<Vec<String>>, WebError> {
    let names = state
        .application
        .list_document_names(&principal, &project)
        .await?;
    Ok(Json(names))
}

/// All documents in a project, in full.
pub async fn list_documents(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path(project): Path<String>,
) -> Result<Json<Vec<ConfigDocument>>, WebError> {
    let documents = state
        .application
        .list_documents(&principal, &project)
        .await?;
    Ok(Json(documents))
}

pub async fn get_document(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path((project, config)): Path<(String, String)>,
) -> Result<Json<ConfigDocument>, WebError> {
    let document = state
        .application
        .get_document(&principal, &project, &config)
        .await?;
    Ok(Json(document))
}

/// Create a new document. Colliding with an existing name yields 409.
pub async fn create_document(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path((project, config)): Path<(String, String)>,
    Json(document): Json<ConfigDocument>,
) -> Result<StatusCode, WebError> {
    info!(project, config, principal = %principal.id, "Creating configuration document");
    state
        .application
        .create_document(&principal, &project, &config, document)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace an existing document wholesale. A missing document yields 404.
pub async fn update_document(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path((project, config)): Path<(String, String)>,
    Json(document): Json<ConfigDocument>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .update_document(&principal, &project, &config, document)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_document(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path((project, config)): Path<(String, String)>,
) -> Result<StatusCode, WebError> {
    info!(project, config, principal = %principal.id, "Deleting configuration document");
    state
        .application
        .delete_document(&principal, &project, &config)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
