//! Hierarchical access model
//!
//! A principal's permissions form a tree mirroring the configuration
//! hierarchy: project -> application -> cluster. Each application and cluster
//! node carries an [`AccessLevel`] bit set. The tree is built from flat
//! [`AccessRule`] entries and travels with the principal as a JSON claim.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Name of the pseudo-cluster that addresses an application's default layer.
///
/// A rule targeting this name sets the application-level access instead of
/// creating a cluster grant.
pub const DEFAULTS_CLUSTER: &str = "Defaults";

/// Bit-flag access level.
///
/// Flags combine with `|` and are tested with [`AccessLevel::has_access`],
/// which requires every bit of the requested level to be present. Whole-set
/// equality is never the right way to test permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevel(u8);

impl AccessLevel {
    pub const NONE: AccessLevel = AccessLevel(0);
    pub const WRITE: AccessLevel = AccessLevel(2);
    pub const READ: AccessLevel = AccessLevel(4);

    /// True when every bit of `required` is present in `self`.
    pub fn has_access(self, required: AccessLevel) -> bool {
        (self.0 & required.0) == required.0
    }

    /// Raw bit value, as persisted in claims and user documents.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Self {
        AccessLevel(bits)
    }
}

impl BitOr for AccessLevel {
    type Output = AccessLevel;

    fn bitor(self, rhs: AccessLevel) -> AccessLevel {
        AccessLevel(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessLevel {
    fn bitor_assign(&mut self, rhs: AccessLevel) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (
            self.has_access(AccessLevel::READ),
            self.has_access(AccessLevel::WRITE),
        ) {
            (true, true) => write!(f, "read|write"),
            (true, false) => write!(f, "read"),
            (false, true) => write!(f, "write"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// A flat permission rule, as stored on a user record before tree ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessRule {
    pub project: String,
    pub application: String,
    /// Cluster name, or [`DEFAULTS_CLUSTER`] to target the application layer.
    pub cluster: String,
    pub access: AccessLevel,
}

/// Per-cluster access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterGrant {
    pub name: String,
    pub access: AccessLevel,
}

/// Per-application access grant. `access` governs the application's default
/// settings layer; clusters carry their own grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationGrant {
    pub name: String,
    #[serde(default)]
    pub access: AccessLevel,
    #[serde(default)]
    pub clusters: Vec<ClusterGrant>,
}

impl ApplicationGrant {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            access: AccessLevel::NONE,
            clusters: Vec::new(),
        }
    }

    /// Exact-name cluster lookup. Names are unique by construction; the first
    /// match wins if that invariant was violated upstream.
    pub fn find_cluster(&self, cluster: &str) -> Option<&ClusterGrant> {
        self.clusters.iter().find(|c| c.name == cluster)
    }
}

/// Per-project grant container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectGrant {
    pub name: String,
    #[serde(default)]
    pub applications: Vec<ApplicationGrant>,
}

impl ProjectGrant {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            applications: Vec::new(),
        }
    }

    pub fn find_application(&self, application: &str) -> Option<&ApplicationGrant> {
        self.applications.iter().find(|a| a.name == application)
    }
}

/// The full permission tree carried by a principal.
///
/// Serialized as JSON into the `SecurityAccess` claim and into persisted user
/// records. Insertion order is preserved but not semantically significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityAccess {
    #[serde(default)]
    pub projects: Vec<ProjectGrant>,
}

impl SecurityAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_project(&self, project: &str) -> Option<&ProjectGrant> {
        self.projects.iter().find(|p| p.name == project)
    }

    pub fn find_application(&self, project: &str, application: &str) -> Option<&ApplicationGrant> {
        self.find_project(project)
            .and_then(|p| p.find_application(application))
    }

    /// Ingest one flat rule into the tree.
    ///
    /// Project, application and cluster nodes are found-or-created, which
    /// makes repeated ingestion of the same rule idempotent. A write grant
    /// always implies read: `WRITE` is stored as `READ|WRITE`, everything
    /// else is stored as `READ`.
    pub fn add_rule(&mut self, rule: &AccessRule) {
        let granted = if rule.access.has_access(AccessLevel::WRITE) {
            AccessLevel::READ | AccessLevel::WRITE
        } else {
            AccessLevel::READ
        };

        let project_idx = match self.projects.iter().position(|p| p.name == rule.project) {
            Some(idx) => idx,
            None => {
                self.projects.push(ProjectGrant::new(&rule.project));
                self.projects.len() - 1
            }
        };
        let project = &mut self.projects[project_idx];

        let application_idx = match project
            .applications
            .iter()
            .position(|a| a.name == rule.application)
        {
            Some(idx) => idx,
            None => {
                project
                    .applications
                    .push(ApplicationGrant::new(&rule.application));
                project.applications.len() - 1
            }
        };
        let application = &mut project.applications[application_idx];

        if rule.cluster == DEFAULTS_CLUSTER {
            application.access = granted;
            return;
        }

        match application
            .clusters
            .iter()
            .position(|c| c.name == rule.cluster)
        {
            Some(idx) => application.clusters[idx].access = granted,
            None => application.clusters.push(ClusterGrant {
                name: rule.cluster.clone(),
                access: granted,
            }),
        }
    }

    /// Build a tree from a flat rule list.
    pub fn from_rules<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = &'a AccessRule>,
    {
        let mut access = SecurityAccess::new();
        for rule in rules {
            access.add_rule(rule);
        }
        access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(project: &str, application: &str, cluster: &str, access: AccessLevel) -> AccessRule {
        AccessRule {
            project: project.to_string(),
            application: application.to_string(),
            cluster: cluster.to_string(),
            access,
        }
    }

    #[test]
    fn has_access_is_reflexive() {
        for level in [
            AccessLevel::NONE,
            AccessLevel::READ,
            AccessLevel::WRITE,
            AccessLevel::READ | AccessLevel::WRITE,
        ] {
            assert!(level.has_access(level));
        }
    }

    #[test]
    fn has_access_requires_every_bit() {
        let both = AccessLevel::READ | AccessLevel::WRITE;
        assert!(!AccessLevel::READ.has_access(both));
        assert!(!AccessLevel::WRITE.has_access(both));
        assert!(both.has_access(AccessLevel::READ));
        assert!(both.has_access(AccessLevel::WRITE));
        assert!(both.has_access(both));
    }

    #[test]
    fn write_on_defaults_upgrades_to_read_write() {
        let mut access = SecurityAccess::new();
        access.add_rule(&rule("p", "app", DEFAULTS_CLUSTER, AccessLevel::WRITE));

        let app = access.find_application("p", "app").unwrap();
        assert_eq!(app.access, AccessLevel::READ | AccessLevel::WRITE);
    }

    #[test]
    fn read_on_defaults_stays_read_only() {
        let mut access = SecurityAccess::new();
        access.add_rule(&rule("p", "app", DEFAULTS_CLUSTER, AccessLevel::READ));

        let app = access.find_application("p", "app").unwrap();
        assert_eq!(app.access, AccessLevel::READ);
        assert!(!app.access.has_access(AccessLevel::WRITE));
    }

    #[test]
    fn write_on_cluster_upgrades_to_read_write() {
        let mut access = SecurityAccess::new();
        access.add_rule(&rule("p", "app", "prod", AccessLevel::WRITE));

        let cluster = access
            .find_application("p", "app")
            .unwrap()
            .find_cluster("prod")
            .unwrap();
        assert_eq!(cluster.access, AccessLevel::READ | AccessLevel::WRITE);
    }

    #[test]
    fn add_rule_is_idempotent() {
        let mut access = SecurityAccess::new();
        let r = rule("p", "app", "prod", AccessLevel::READ);
        access.add_rule(&r);
        access.add_rule(&r);

        assert_eq!(access.projects.len(), 1);
        assert_eq!(access.projects[0].applications.len(), 1);
        assert_eq!(access.projects[0].applications[0].clusters.len(), 1);
    }

    #[test]
    fn rules_for_same_application_share_nodes() {
        let access = SecurityAccess::from_rules(&[
            rule("p", "app", DEFAULTS_CLUSTER, AccessLevel::READ),
            rule("p", "app", "staging", AccessLevel::READ),
            rule("p", "app", "prod", AccessLevel::WRITE),
        ]);

        assert_eq!(access.projects.len(), 1);
        let app = access.find_application("p", "app").unwrap();
        assert_eq!(app.access, AccessLevel::READ);
        assert_eq!(app.clusters.len(), 2);
    }

    #[test]
    fn claim_json_round_trips() {
        let access = SecurityAccess::from_rules(&[
            rule("p", "app", DEFAULTS_CLUSTER, AccessLevel::WRITE),
            rule("p", "app", "prod", AccessLevel::READ),
            rule("other", "svc", "eu", AccessLevel::WRITE),
        ]);

        let json = serde_json::to_string(&access).unwrap();
        let restored: SecurityAccess = serde_json::from_str(&json).unwrap();
        assert_eq!(access, restored);
    }

    #[test]
    fn access_level_serializes_as_number() {
        let json = serde_json::to_string(&(AccessLevel::READ | AccessLevel::WRITE)).unwrap();
        assert_eq!(json, "6");
        let parsed: AccessLevel = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, AccessLevel::READ);
    }
}
