//! Authorization gate
//!
//! A single pure decision function walks the requested resource path against
//! a principal's [`SecurityAccess`] tree. Every call site that needs an
//! allow/deny answer goes through [`authorize`]; nothing else inspects the
//! tree for permission checks.

use crate::access::{AccessLevel, SecurityAccess};
use serde::{Deserialize, Serialize};

/// A requested resource path plus the access required on it.
///
/// Specificity is determined by which optional segments are populated:
/// machine > cluster > configuration > project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub project: String,
    pub configuration: Option<String>,
    pub cluster: Option<String>,
    pub machine: Option<String>,
    pub access: AccessLevel,
}

impl ResourceRequest {
    pub fn project(project: &str, access: AccessLevel) -> Self {
        Self {
            project: project.to_string(),
            configuration: None,
            cluster: None,
            machine: None,
            access,
        }
    }

    pub fn configuration(project: &str, configuration: &str, access: AccessLevel) -> Self {
        Self {
            project: project.to_string(),
            configuration: Some(configuration.to_string()),
            cluster: None,
            machine: None,
            access,
        }
    }

    pub fn cluster(project: &str, configuration: &str, cluster: &str, access: AccessLevel) -> Self {
        Self {
            project: project.to_string(),
            configuration: Some(configuration.to_string()),
            cluster: Some(cluster.to_string()),
            machine: None,
            access,
        }
    }

    pub fn machine(
        project: &str,
        configuration: &str,
        cluster: &str,
        machine: &str,
        access: AccessLevel,
    ) -> Self {
        Self {
            project: project.to_string(),
            configuration: Some(configuration.to_string()),
            cluster: Some(cluster.to_string()),
            machine: Some(machine.to_string()),
            access,
        }
    }
}

/// Decide whether `access` permits the requested resource.
///
/// Walks the most specific populated path segment first. Permission is
/// checked independently at each level; a grant on a node never implies a
/// grant on its children. Machine names are not matched against the tree:
/// a machine inherits its cluster's grant.
///
/// A request naming only a project is allowed whenever the name is
/// non-empty, without consulting the tree. Project-level existence is
/// deliberately not required; see the pinning test below before changing
/// this.
pub fn authorize(access: &SecurityAccess, request: &ResourceRequest) -> bool {
    if request.machine.is_some() || request.cluster.is_some() {
        return authorize_cluster_path(access, request);
    }

    if let Some(configuration) = &request.configuration {
        return match access.find_application(&request.project, configuration) {
            Some(application) => application.access.has_access(request.access),
            None => false,
        };
    }

    !request.project.is_empty()
}

/// Shared check for the cluster and machine branches: both walk
/// project -> application -> cluster and test permission at the application
/// and cluster levels.
fn authorize_cluster_path(access: &SecurityAccess, request: &ResourceRequest) -> bool {
    let configuration = match &request.configuration {
        Some(configuration) => configuration,
        None => return false,
    };
    let cluster = match &request.cluster {
        Some(cluster) => cluster,
        None => return false,
    };

    let application = match access.find_application(&request.project, configuration) {
        Some(application) => application,
        None => return false,
    };

    if !application.access.has_access(request.access) {
        return false;
    }

    match application.find_cluster(cluster) {
        Some(grant) => grant.access.has_access(request.access),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessRule, DEFAULTS_CLUSTER};

    fn rule(project: &str, application: &str, cluster: &str, access: AccessLevel) -> AccessRule {
        AccessRule {
            project: project.to_string(),
            application: application.to_string(),
            cluster: cluster.to_string(),
            access,
        }
    }

    fn reader_on_prod() -> SecurityAccess {
        SecurityAccess::from_rules(&[
            rule("P", "A", DEFAULTS_CLUSTER, AccessLevel::READ),
            rule("P", "A", "prod", AccessLevel::READ),
        ])
    }

    #[test]
    fn read_only_principal_is_denied_write_on_its_cluster() {
        let access = reader_on_prod();
        let request = ResourceRequest::cluster("P", "A", "prod", AccessLevel::WRITE);
        assert!(!authorize(&access, &request));
    }

    #[test]
    fn read_only_principal_reads_its_cluster() {
        let access = reader_on_prod();
        let request = ResourceRequest::cluster("P", "A", "prod", AccessLevel::READ);
        assert!(authorize(&access, &request));
    }

    #[test]
    fn unknown_cluster_is_denied_outright() {
        let access = reader_on_prod();
        let request = ResourceRequest::cluster("P", "A", "staging", AccessLevel::READ);
        assert!(!authorize(&access, &request));
    }

    #[test]
    fn machine_request_checks_the_cluster_segment_only() {
        let access = SecurityAccess::from_rules(&[
            rule("P", "A", DEFAULTS_CLUSTER, AccessLevel::READ),
            rule("P", "A", "c1", AccessLevel::WRITE),
        ]);

        // Machine names never appear in the tree; any machine under an
        // authorized cluster passes.
        let request = ResourceRequest::machine("P", "A", "c1", "web-01", AccessLevel::WRITE);
        assert!(authorize(&access, &request));

        let request = ResourceRequest::machine("P", "A", "c2", "web-01", AccessLevel::READ);
        assert!(!authorize(&access, &request));
    }

    #[test]
    fn cluster_write_requires_application_level_access_too() {
        // Cluster grants write, but the application layer was never granted.
        let access = SecurityAccess::from_rules(&[rule("P", "A", "c1", AccessLevel::WRITE)]);

        let request = ResourceRequest::cluster("P", "A", "c1", AccessLevel::WRITE);
        assert!(!authorize(&access, &request));
    }

    #[test]
    fn end_to_end_rule_ingestion_and_authorization() {
        let access = SecurityAccess::from_rules(&[
            rule("P", "A", DEFAULTS_CLUSTER, AccessLevel::READ),
            rule("P", "A", "c1", AccessLevel::WRITE),
        ]);

        assert!(authorize(
            &access,
            &ResourceRequest::cluster("P", "A", "c1", AccessLevel::WRITE),
        ));
        assert!(!authorize(
            &access,
            &ResourceRequest::cluster("P", "A", "c2", AccessLevel::READ),
        ));
    }

    #[test]
    fn configuration_request_checks_application_access() {
        let access = reader_on_prod();

        assert!(authorize(
            &access,
            &ResourceRequest::configuration("P", "A", AccessLevel::READ),
        ));
        assert!(!authorize(
            &access,
            &ResourceRequest::configuration("P", "A", AccessLevel::WRITE),
        ));
        assert!(!authorize(
            &access,
            &ResourceRequest::configuration("P", "B", AccessLevel::READ),
        ));
        assert!(!authorize(
            &access,
            &ResourceRequest::configuration("Q", "A", AccessLevel::READ),
        ));
    }

    #[test]
    fn project_only_request_is_allowed_without_tree_lookup() {
        // Pins the documented behavior: project-level requests pass on a
        // non-empty name even when the tree is empty. Tightening this is a
        // policy change, not a bug fix.
        let empty = SecurityAccess::new();
        let request = ResourceRequest::project("anything", AccessLevel::WRITE);
        assert!(authorize(&empty, &request));
    }

    #[test]
    fn empty_request_is_denied() {
        let empty = SecurityAccess::new();
        let request = ResourceRequest::project("", AccessLevel::READ);
        assert!(!authorize(&empty, &request));
    }
}
