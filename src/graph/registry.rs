//! Node and relationship stores.

use std::collections::HashMap;

use crate::object::{api_group, is_namespace_kind};

use super::{Node, ObjectReference, Relationship};

/// Identity of a node: the same key always names the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub scope: String,
    pub namespace: String,
    pub uid: String,
}

impl NodeKey {
    pub fn new(
        scope: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            namespace: namespace.into(),
            uid: uid.into(),
        }
    }
}

/// Flat store of nodes keyed by (scope, namespace, uid).
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeKey, Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the node stored under `key`.
    ///
    /// When a node already exists with a non-empty label set, the
    /// candidate takes over those labels before it is stored, so labels
    /// are never lost to a later insertion. All other fields are replaced
    /// by the candidate's. Core `Namespace` nodes are returned but never
    /// stored.
    pub fn get_or_create(&mut self, key: NodeKey, mut candidate: Node) -> Node {
        if let Some(existing) = self.nodes.get(&key) {
            if !existing.labels.is_empty() {
                candidate.labels = existing.labels.clone();
            }
        }

        if is_namespace_kind(api_group(&candidate.api_version), &candidate.kind) {
            return candidate;
        }

        self.nodes.insert(key, candidate.clone());
        candidate
    }

    pub fn remove(&mut self, key: &NodeKey) -> Option<Node> {
        self.nodes.remove(key)
    }

    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &Node)> {
        self.nodes.iter()
    }

    /// All entries ordered by key, for deterministic output.
    pub fn sorted(&self) -> Vec<(&NodeKey, &Node)> {
        let mut entries: Vec<_> = self.nodes.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Directed edges grouped by their source identifier.
#[derive(Debug, Clone, Default)]
pub struct RelationshipRegistry {
    edges: HashMap<String, Vec<Relationship>>,
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the edge from `from` to `to`, creating it with `label` if
    /// there is none yet. An existing edge keeps its original label.
    pub fn get_or_insert(&mut self, from: &Node, label: &str, to: &Node) -> &mut Relationship {
        let edges = self.edges.entry(from.uid.clone()).or_default();

        let index = match edges.iter().position(|r| r.to.uid == to.uid) {
            Some(index) => index,
            None => {
                edges.push(Relationship {
                    from: ObjectReference::from(from),
                    label: label.to_string(),
                    to: ObjectReference::from(to),
                    attributes: Default::default(),
                });
                edges.len() - 1
            }
        };

        &mut edges[index]
    }

    /// Move every edge touching `old` onto `new`.
    ///
    /// An edge that would duplicate an existing (from, to) pair is dropped
    /// and the existing edge kept.
    pub fn rekey(&mut self, old: &str, new: &str) {
        if let Some(moved) = self.edges.remove(old) {
            let edges = self.edges.entry(new.to_string()).or_default();
            for mut rel in moved {
                if edges.iter().any(|r| r.to.uid == rel.to.uid) {
                    continue;
                }
                rel.from.uid = new.to_string();
                edges.push(rel);
            }
        }

        for edges in self.edges.values_mut() {
            let Some(index) = edges.iter().position(|r| r.to.uid == old) else {
                continue;
            };
            if edges.iter().any(|r| r.to.uid == new) {
                edges.remove(index);
            } else {
                edges[index].to.uid = new.to_string();
            }
        }
    }

    /// Edges leaving `uid`, in insertion order.
    pub fn from(&self, uid: &str) -> &[Relationship] {
        self.edges.get(uid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All edges ordered by source identifier, then insertion order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Relationship> {
        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();
        sources.into_iter().flat_map(move |uid| self.edges[uid].iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Labels;

    fn node(kind: &str, uid: &str, labels: &[(&str, &str)]) -> Node {
        Node {
            api_version: "v1".to_string(),
            kind: kind.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Labels>(),
            name: format!("{}-name", kind.to_lowercase()),
            namespace: "shop".to_string(),
            uid: uid.to_string(),
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        registry.get_or_create(key.clone(), node("Pod", "u1", &[]));
        registry.get_or_create(key.clone(), node("Pod", "u1", &[]));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&key).is_some());
    }

    #[test]
    fn test_existing_labels_survive_empty_reinsert() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        registry.get_or_create(key.clone(), node("Pod", "u1", &[("a", "1")]));
        let resolved = registry.get_or_create(key.clone(), node("Pod", "u1", &[]));

        assert_eq!(resolved.labels.get("a").map(String::as_str), Some("1"));
        assert_eq!(
            registry.get(&key).unwrap().labels.get("a").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_existing_labels_win_over_new_labels() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        registry.get_or_create(key.clone(), node("Pod", "u1", &[("a", "1")]));
        registry.get_or_create(key.clone(), node("Pod", "u1", &[("b", "2")]));

        let stored = registry.get(&key).unwrap();
        assert_eq!(stored.labels.len(), 1);
        assert!(stored.labels.contains_key("a"));
    }

    #[test]
    fn test_labels_fill_in_when_stored_node_has_none() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        registry.get_or_create(key.clone(), node("Deployment", "u1", &[]));
        registry.get_or_create(key.clone(), node("Deployment", "u1", &[("app", "web")]));
        assert!(registry.get(&key).unwrap().labels.contains_key("app"));
    }

    #[test]
    fn test_reinsert_refreshes_other_fields() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        let mut placeholder = node("Deployment", "u1", &[]);
        placeholder.api_version = String::new();
        registry.get_or_create(key.clone(), placeholder);

        let mut real = node("Deployment", "u1", &[]);
        real.api_version = "apps/v1".to_string();
        registry.get_or_create(key.clone(), real);

        assert_eq!(registry.get(&key).unwrap().api_version, "apps/v1");
    }

    #[test]
    fn test_namespace_never_stored() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "", "ns-uid");
        let resolved = registry.get_or_create(key.clone(), node("Namespace", "ns-uid", &[]));
        assert_eq!(resolved.kind, "Namespace");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_relationship_dedup_keeps_first_label() {
        let mut registry = RelationshipRegistry::new();
        let x = node("Deployment", "x", &[]);
        let y = node("ReplicaSet", "y", &[]);
        registry.get_or_insert(&x, "L1", &y);
        registry.get_or_insert(&x, "L2", &y);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.from("x")[0].label, "L1");
    }

    #[test]
    fn test_relationship_attributes_apply_to_existing_edge() {
        let mut registry = RelationshipRegistry::new();
        let x = node("Ingress", "x", &[]);
        let y = node("Service", "y", &[]);
        registry.get_or_insert(&x, "Service", &y);
        registry
            .get_or_insert(&x, "Service", &y)
            .attribute("label", "example.com/");

        assert_eq!(
            registry.from("x")[0].attributes.get("label").map(String::as_str),
            Some("example.com/")
        );
    }

    #[test]
    fn test_iter_sorted_orders_by_source() {
        let mut registry = RelationshipRegistry::new();
        let a = node("Deployment", "a", &[]);
        let b = node("Deployment", "b", &[]);
        let c1 = node("ReplicaSet", "c1", &[]);
        let c2 = node("ReplicaSet", "c2", &[]);
        registry.get_or_insert(&b, "ReplicaSet", &c1);
        registry.get_or_insert(&a, "ReplicaSet", &c2);
        registry.get_or_insert(&a, "ReplicaSet", &c1);

        let order: Vec<(&str, &str)> = registry
            .iter_sorted()
            .map(|r| (r.from.uid.as_str(), r.to.uid.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "c2"), ("a", "c1"), ("b", "c1")]);
    }

    #[test]
    fn test_rekey_moves_both_ends() {
        let mut registry = RelationshipRegistry::new();
        let route = node("Route", "route", &[]);
        let ingress = node("Ingress", "ing", &[]);
        let synthetic = node("Service", "synthetic", &[]);
        let real = node("Service", "real", &[]);
        let pod = node("Pod", "pod", &[]);

        registry.get_or_insert(&route, "Service", &synthetic);
        registry.get_or_insert(&ingress, "Service", &synthetic);
        registry.get_or_insert(&ingress, "Service", &real);
        registry.get_or_insert(&synthetic, "Endpoints", &pod);

        registry.rekey("synthetic", "real");

        assert_eq!(registry.from("route")[0].to.uid, "real");
        assert_eq!(registry.from("ing").len(), 1);
        assert_eq!(registry.from("ing")[0].to.uid, "real");
        assert!(registry.from("synthetic").is_empty());
        assert_eq!(registry.from("real").len(), 1);
        assert_eq!(registry.from("real")[0].from.uid, "real");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_node_remove() {
        let mut registry = NodeRegistry::new();
        let key = NodeKey::new("c1", "shop", "u1");
        registry.get_or_create(key.clone(), node("Pod", "u1", &[]));
        assert!(registry.remove(&key).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_unknown_source_is_empty() {
        let registry = RelationshipRegistry::new();
        assert!(registry.from("missing").is_empty());
        assert!(registry.is_empty());
    }
}
