//! Machine handlers
//!
//! A machine read resolves all three layers: defaults, the named cluster,
//! then the machine's own overrides. Machine permission is not modeled
//! separately; reads are gated through the cluster's grant, writes through
//! the document-level grant.

use crate::auth::Authenticated;
use crate::{AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::collections::HashMap;
use strata_core::MachineConfig;

/// Names of the machines visible through the given cluster's grant.
pub async fn list_machine_names(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster)): Path<(String, String, String)>,
) -> Result<Json<Vec<String>>, WebError> {
    let names = state
        .application
        .list_machine_names(&principal, &project, &config, &cluster)
        .await?;
    Ok(Json(names))
}

/// Fully resolved settings for a machine; `null` when denied.
pub async fn get_machine(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster, machine)): Path<(String, String, String, String)>,
) -> Result<Json<Option<HashMap<String, String>>>, WebError> {
    let settings = state
        .application
        .get_machine(&principal, &project, &config, &cluster, &machine)
        .await?;
    Ok(Json(settings))
}

/// Create a machine entry from the submitted settings map.
pub async fn create_machine(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, machine)): Path<(String, String, String)>,
    Json(settings): Json<HashMap<String, String>>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .create_machine(
            &principal,
            &project,
            &config,
            MachineConfig::new(&machine, settings),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a machine's full settings map.
pub async fn update_machine(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, machine)): Path<(String, String, String)>,
    Json(settings): Json<HashMap<String, String>>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .replace_machine(
            &principal,
            &project,
            &config,
            MachineConfig::new(&machine, settings),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_machine(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, machine)): Path<(String, String, String)>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .delete_machine(&principal, &project, &config, &machine)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
