//! Route definitions for the Strata web server
//!
//! This module defines all the routes for the web application.

use crate::{handlers, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Projects
        .route("/projects", get(handlers::list_projects))
        .route(
            "/projects/{project}",
            post(handlers::create_project).delete(handlers::delete_project),
        )
        .route("/projects/{project}/update", post(handlers::update_project))
        // Configuration documents
        .route("/jars/list/{project}", get(handlers::list_document_names))
        .route("/jars/{project}", get(handlers::list_documents))
        .route(
            "/jars/{project}/{config}",
            get(handlers::get_document)
                .post(handlers::create_document)
                .put(handlers::update_document)
                .delete(handlers::delete_document),
        )
        // Clusters
        .route(
            "/clusters/list/{project}/{config}",
            get(handlers::list_cluster_names),
        )
        .route("/clusters/{project}/{config}", get(handlers::list_clusters))
        .route(
            "/clusters/{project}/{config}/{cluster}",
            get(handlers::get_cluster)
                .post(handlers::create_cluster)
                .put(handlers::update_cluster)
                .delete(handlers::delete_cluster),
        )
        // Machines
        .route(
            "/machines/list/{project}/{config}/{cluster}",
            get(handlers::list_machine_names),
        )
        .route(
            "/machines/{project}/{config}/{cluster}/{machine}",
            get(handlers::get_machine),
        )
        .route(
            "/machines/{project}/{config}/{machine}",
            post(handlers::create_machine)
                .put(handlers::update_machine)
                .delete(handlers::delete_machine),
        )
        // References
        .route(
            "/references/{project}/{config}",
            get(handlers::list_references).post(handlers::add_reference),
        )
        .route(
            "/references/{project}/{config}/{reference}",
            delete(handlers::remove_reference),
        )
}
