//! Settings resolution
//!
//! Computes the effective settings map for a target by layered override:
//! defaults first, then the named cluster, then (optionally) the named
//! machine. Each layer replaces values per key; there is no deep merge,
//! values are scalar strings. Keys are case-insensitive and normalized to
//! lower case before comparison.

use crate::document::ConfigDocument;
use std::collections::HashMap;

/// Resolve the effective settings for a cluster, optionally narrowed to a
/// machine.
///
/// For key `k` the effective value is `machine[k]` if present, else
/// `cluster[k]`, else `defaults[k]`; keys set in no layer are absent from
/// the result. An unknown cluster name resolves to an empty map. A supplied
/// machine name that does not exist contributes nothing.
pub fn resolve(
    doc: &ConfigDocument,
    cluster: &str,
    machine: Option<&str>,
) -> HashMap<String, String> {
    let cluster = match doc.cluster(cluster) {
        Some(cluster) => cluster,
        None => return HashMap::new(),
    };

    let mut effective = lowercase_keys(&doc.defaults);
    overlay(&mut effective, &cluster.settings);

    if let Some(machine) = machine {
        if let Some(machine) = doc.machine(machine) {
            overlay(&mut effective, &machine.settings);
        }
    }

    effective
}

/// Resolve defaults plus one cluster layer, the shape served by the cluster
/// read endpoint.
pub fn resolve_cluster(doc: &ConfigDocument, cluster: &str) -> HashMap<String, String> {
    resolve(doc, cluster, None)
}

fn lowercase_keys(settings: &HashMap<String, String>) -> HashMap<String, String> {
    settings
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

fn overlay(base: &mut HashMap<String, String>, layer: &HashMap<String, String>) {
    for (key, value) in layer {
        base.insert(key.to_lowercase(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ClusterConfig, MachineConfig};

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn document() -> ConfigDocument {
        let mut doc = ConfigDocument::new("svc");
        doc.defaults = settings(&[("a", "1"), ("b", "2")]);
        doc.add_cluster(ClusterConfig::new(
            "prod",
            settings(&[("b", "20"), ("c", "30")]),
        ));
        doc.add_machine(MachineConfig::new("web-01", settings(&[("c", "300")])));
        doc
    }

    #[test]
    fn machine_wins_over_cluster_wins_over_defaults() {
        let doc = document();
        let effective = resolve(&doc, "prod", Some("web-01"));
        assert_eq!(
            effective,
            settings(&[("a", "1"), ("b", "20"), ("c", "300")])
        );
    }

    #[test]
    fn cluster_overlay_without_machine() {
        let doc = document();
        let effective = resolve(&doc, "prod", None);
        assert_eq!(effective, settings(&[("a", "1"), ("b", "20"), ("c", "30")]));
    }

    #[test]
    fn unknown_cluster_resolves_to_empty() {
        let doc = document();
        assert!(resolve(&doc, "staging", None).is_empty());
    }

    #[test]
    fn unknown_machine_leaves_the_cluster_view() {
        let doc = document();
        let effective = resolve(&doc, "prod", Some("ghost"));
        assert_eq!(effective, resolve_cluster(&doc, "prod"));
    }

    #[test]
    fn keys_are_normalized_to_lower_case() {
        let mut doc = ConfigDocument::new("svc");
        doc.defaults = settings(&[("TimeOut", "30")]);
        doc.add_cluster(ClusterConfig::new("prod", settings(&[("TIMEOUT", "60")])));

        let effective = resolve(&doc, "prod", None);
        assert_eq!(effective, settings(&[("timeout", "60")]));
    }
}
