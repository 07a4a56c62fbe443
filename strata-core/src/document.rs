//! Configuration document model
//!
//! A document is the persisted unit of configuration for one application:
//! default settings, per-cluster overrides, per-machine overrides, and
//! references to other documents. Documents are loaded per request, mutated
//! wholesale, and written back; they are never held as long-lived state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cluster entry: a name plus the settings it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterConfig {
    pub name: String,
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

impl ClusterConfig {
    pub fn new(name: &str, settings: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            settings,
        }
    }
}

/// Machine entry: a name plus the settings it overrides on top of a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MachineConfig {
    pub name: String,
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

impl MachineConfig {
    pub fn new(name: &str, settings: HashMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            settings,
        }
    }
}

/// Named pointer to another document.
///
/// Persisted as a single-entry object `{"jar": "<name>"}`. References are
/// stored and round-tripped only; the resolver never dereferences them and
/// consumers fetch referenced documents themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    #[serde(rename = "jar")]
    pub jar: String,
}

impl DocumentReference {
    pub fn new(name: &str) -> Self {
        Self {
            jar: name.to_string(),
        }
    }
}

/// The persisted configuration document ("jar").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigDocument {
    pub name: String,
    #[serde(default)]
    pub defaults: HashMap<String, String>,
    #[serde(default)]
    pub clusters: Vec<ClusterConfig>,
    #[serde(default)]
    pub machines: Vec<MachineConfig>,
    #[serde(default)]
    pub references: Vec<DocumentReference>,
}

impl ConfigDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.name == name)
    }

    pub fn machine(&self, name: &str) -> Option<&MachineConfig> {
        self.machines.iter().find(|m| m.name == name)
    }

    /// Append a cluster entry if no entry with that name exists.
    ///
    /// Returns whether the document changed.
    pub fn add_cluster(&mut self, cluster: ClusterConfig) -> bool {
        if self.cluster(&cluster.name).is_some() {
            return false;
        }
        self.clusters.push(cluster);
        true
    }

    /// Replace an existing cluster entry wholesale: remove by name, append
    /// the new value. There is no partial-field patch; callers submit the
    /// full settings map. Returns whether the document changed (an absent
    /// name is a no-op).
    pub fn replace_cluster(&mut self, cluster: ClusterConfig) -> bool {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.name != cluster.name);
        if self.clusters.len() == before {
            return false;
        }
        self.clusters.push(cluster);
        true
    }

    pub fn remove_cluster(&mut self, name: &str) -> bool {
        let before = self.clusters.len();
        self.clusters.retain(|c| c.name != name);
        self.clusters.len() != before
    }

    /// Append a machine entry if no entry with that name exists.
    pub fn add_machine(&mut self, machine: MachineConfig) -> bool {
        if self.machine(&machine.name).is_some() {
            return false;
        }
        self.machines.push(machine);
        true
    }

    /// Replace an existing machine entry wholesale (same contract as
    /// [`ConfigDocument::replace_cluster`]).
    pub fn replace_machine(&mut self, machine: MachineConfig) -> bool {
        let before = self.machines.len();
        self.machines.retain(|m| m.name != machine.name);
        if self.machines.len() == before {
            return false;
        }
        self.machines.push(machine);
        true
    }

    pub fn remove_machine(&mut self, name: &str) -> bool {
        let before = self.machines.len();
        self.machines.retain(|m| m.name != name);
        self.machines.len() != before
    }

    /// Append a reference unless one already points at the same document.
    pub fn add_reference(&mut self, name: &str) -> bool {
        if self.references.iter().any(|r| r.jar == name) {
            return false;
        }
        self.references.push(DocumentReference::new(name));
        true
    }

    pub fn remove_reference(&mut self, name: &str) -> bool {
        let before = self.references.len();
        self.references.retain(|r| r.jar != name);
        self.references.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn document() -> ConfigDocument {
        let mut doc = ConfigDocument::new("billing");
        doc.defaults = settings(&[("timeout", "30")]);
        doc.add_cluster(ClusterConfig::new("prod", settings(&[("timeout", "60")])));
        doc.add_machine(MachineConfig::new("web-01", settings(&[("timeout", "90")])));
        doc
    }

    #[test]
    fn add_cluster_refuses_duplicates() {
        let mut doc = document();
        assert!(!doc.add_cluster(ClusterConfig::new("prod", HashMap::new())));
        assert_eq!(doc.clusters.len(), 1);
        // The original settings survived the rejected add.
        assert_eq!(
            doc.cluster("prod").unwrap().settings.get("timeout"),
            Some(&"60".to_string())
        );
    }

    #[test]
    fn replace_cluster_swaps_the_full_settings_map() {
        let mut doc = document();
        let changed = doc.replace_cluster(ClusterConfig::new(
            "prod",
            settings(&[("retries", "3")]),
        ));
        assert!(changed);

        let cluster = doc.cluster("prod").unwrap();
        // Wholesale replace: the old key is gone, not merged.
        assert!(cluster.settings.get("timeout").is_none());
        assert_eq!(cluster.settings.get("retries"), Some(&"3".to_string()));
    }

    #[test]
    fn replace_cluster_is_a_noop_for_unknown_names() {
        let mut doc = document();
        assert!(!doc.replace_cluster(ClusterConfig::new("staging", HashMap::new())));
        assert!(doc.cluster("staging").is_none());
    }

    #[test]
    fn remove_machine_reports_whether_anything_changed() {
        let mut doc = document();
        assert!(doc.remove_machine("web-01"));
        assert!(!doc.remove_machine("web-01"));
    }

    #[test]
    fn references_deduplicate_by_name() {
        let mut doc = document();
        assert!(doc.add_reference("shared"));
        assert!(!doc.add_reference("shared"));
        assert_eq!(doc.references.len(), 1);
        assert!(doc.remove_reference("shared"));
        assert!(doc.references.is_empty());
    }

    #[test]
    fn reference_wire_shape_is_a_jar_object() {
        let json = serde_json::to_string(&DocumentReference::new("shared")).unwrap();
        assert_eq!(json, r#"{"jar":"shared"}"#);
    }

    #[test]
    fn document_json_round_trips() {
        let mut doc = document();
        doc.add_reference("shared");

        let json = serde_json::to_string_pretty(&doc).unwrap();
        let restored: ConfigDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, restored);
    }
}
