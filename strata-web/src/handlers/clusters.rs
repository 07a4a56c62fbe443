//! Cluster handlers
//!
//! Reads return the resolved view (defaults overlaid with the cluster's own
//! settings) and silently collapse to empty results when the caller lacks a
//! grant. Writes replace whole entries; PUT carries the full settings map.

use crate::auth::Authenticated;
use crate::{AppState, WebError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::collections::HashMap;
use strata_core::ClusterConfig;

/// Names of the clusters the caller may read.
pub async fn list_cluster_names(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, WebError> {
    let names = state
        .application
        .list_cluster_names(&principal, &project, &config)
        .await?;
    Ok(Json(names))
}

/// Full cluster entries the caller may read.
pub async fn list_clusters(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config)): Path<(String, String)>,
) -> Result<Json<Vec<ClusterConfig>>, WebError> {
    let clusters = state
        .application
        .list_clusters(&principal, &project, &config)
        .await?;
    Ok(Json(clusters))
}

/// Effective settings for one cluster; empty when denied or unknown.
pub async fn get_cluster(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster)): Path<(String, String, String)>,
) -> Result<Json<HashMap<String, String>>, WebError> {
    let settings = state
        .application
        .get_cluster(&principal, &project, &config, &cluster)
        .await?;
    Ok(Json(settings))
}

/// Create a cluster entry from the submitted settings map.
pub async fn create_cluster(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster)): Path<(String, String, String)>,
    Json(settings): Json<HashMap<String, String>>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .create_cluster(
            &principal,
            &project,
            &config,
            ClusterConfig::new(&cluster, settings),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a cluster's full settings map.
pub async fn update_cluster(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster)): Path<(String, String, String)>,
    Json(settings): Json<HashMap<String, String>>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .replace_cluster(
            &principal,
            &project,
            &config,
            ClusterConfig::new(&cluster, settings),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_cluster(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
    Path((project, config, cluster)): Path<(String, String, String)>,
) -> Result<StatusCode, WebError> {
    state
        .application
        .delete_cluster(&principal, &project, &config, &cluster)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
