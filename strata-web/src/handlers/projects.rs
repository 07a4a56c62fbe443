//! Project management handlers

use crate::auth::{Authenticated, SuperAdmin};
use crate::{AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    /// Remote repository holding the project's configuration
    pub git_url: String,
}

/// List all projects. Any authenticated principal may enumerate them.
pub async fn list_projects(
    State(state): State<AppState>,
    Authenticated(_principal): Authenticated,
) -> Result<Json<Vec<String>>, WebError> {
    let projects = state.application.list_projects().await?;
    Ok(Json(projects))
}

/// Create a project by cloning its configuration repository.
pub async fn create_project(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path(project): Path<String>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<StatusCode, WebError> {
    info!(project, principal = %principal.id, "Creating project");
    state
        .application
        .create_project(&principal, &project, &request.git_url)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the latest configuration from the project's origin.
pub async fn update_project(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path(project): Path<String>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .update_project(&principal, &project)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a project's working copy.
pub async fn delete_project(
    State(state): State<AppState>,
    SuperAdmin(principal): SuperAdmin,
    Path(project): Path<String>,
) -> Result<StatusCode, WebError> {
    info!(project, principal = %principal.id, "Deleting project");
    state
        .application
        .delete_project(&principal, &project)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
