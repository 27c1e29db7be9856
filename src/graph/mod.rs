//! Resource relationship graph: identity, registries, ownership closure
//! and rendering.
//!
//! Nodes are deduplicated by (scope, namespace, uid). Edges point from an
//! owner or referrer toward the resource it manages or uses, and are
//! deduplicated per (from, to) pair.

mod builder;
mod registry;
mod render;
mod uid;

pub use builder::{build_graph, GraphBuilder};
pub use registry::{NodeKey, NodeRegistry, RelationshipRegistry};
pub use render::Format;
pub use uid::to_uid;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Deref;
use std::sync::OnceLock;

use regex::Regex;

use crate::object::{api_group, is_namespace_kind, ObjectMeta};

/// One resource instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub api_version: String,
    pub kind: String,
    pub labels: Labels,
    pub name: String,
    pub namespace: String,
    pub uid: String,
}

/// Resource labels, rendered as a Cypher property predicate list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(BTreeMap<String, String>);

impl Deref for Labels {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for Labels {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn property_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex pattern"))
}

/// Property name for a label key: lower-cased, non-alphanumeric runs
/// collapsed to `_`.
pub fn label_property(key: &str) -> String {
    property_pattern()
        .replace_all(&key.to_lowercase(), "_")
        .into_owned()
}

impl fmt::Display for Labels {
    /// `node.Label_<key> = "<value>"` clauses joined by `, `, sorted.
    /// Values are not escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("node.Label_{} = \"{}\"", label_property(key), value))
            .collect();
        clauses.sort();
        write!(f, "{}", clauses.join(", "))
    }
}

/// Reference to a node by identifier and kind only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    pub uid: String,
    pub kind: String,
}

impl From<&Node> for ObjectReference {
    fn from(node: &Node) -> Self {
        Self {
            uid: node.uid.clone(),
            kind: node.kind.clone(),
        }
    }
}

/// Edge attributes, only used by the Graphviz output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Deref for Attributes {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Attributes {
    /// Space separated `key="value"` pairs, sorted. Values are not escaped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", key, value))
            .collect();
        pairs.sort();
        write!(f, "{}", pairs.join(" "))
    }
}

/// A directed, labeled edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub from: ObjectReference,
    pub label: String,
    pub to: ObjectReference,
    pub attributes: Attributes,
}

impl Relationship {
    /// Set an attribute rendered in the Graphviz output.
    pub fn attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.0.insert(key.into(), value.into());
        self
    }
}

/// (scope, namespace, kind, name) of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NameKey {
    scope: String,
    namespace: String,
    kind: String,
    name: String,
}

impl NameKey {
    fn new(scope: &str, namespace: &str, kind: &str, name: &str) -> Self {
        Self {
            scope: scope.to_string(),
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

/// Nodes and relationships built from one batch of objects.
#[derive(Debug, Clone)]
pub struct Graph {
    pub nodes: NodeRegistry,
    pub relationships: RelationshipRegistry,
    scope: String,
    /// Real uid of every registered resource, by name
    known: HashMap<NameKey, String>,
    /// Synthetic uid handed out for each name-addressed reference
    named: HashMap<NameKey, String>,
}

impl Graph {
    /// Create an empty graph. `scope` is used for objects without a
    /// cluster name.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            nodes: NodeRegistry::new(),
            relationships: RelationshipRegistry::new(),
            scope: scope.into(),
            known: HashMap::new(),
            named: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Scope of an object: its cluster name, or the graph default.
    pub fn resolve_scope(&self, cluster_name: &str) -> String {
        if cluster_name.is_empty() {
            self.scope.clone()
        } else {
            cluster_name.to_string()
        }
    }

    /// Register a node and walk its owner references.
    ///
    /// Each owner becomes a node built from the reference alone (uid, name,
    /// kind, and the child's namespace and scope) and gets an edge toward
    /// the child, labeled with the child's kind. Re-registering the owner
    /// later with its full metadata keeps every edge valid since edges only
    /// hold identifiers.
    ///
    /// An object without a uid is identified by
    /// `to_uid(scope, namespace, kind, name)`, the identifier
    /// [`Graph::named_node`] gives references to it.
    pub fn node(&mut self, api_version: &str, kind: &str, meta: &ObjectMeta) -> Node {
        let scope = self.resolve_scope(&meta.cluster_name);
        if meta.uid.is_empty() {
            let uid = to_uid(&[&scope, &meta.namespace, &kind, &meta.name]);
            return self.register(&scope, api_version, kind, meta, uid);
        }

        let node = self.register(&scope, api_version, kind, meta, meta.uid.clone());
        if !is_namespace_kind(api_group(api_version), kind) {
            // Lowest uid wins when two objects share a name.
            match self.known.entry(NameKey::new(&scope, &meta.namespace, kind, &meta.name)) {
                Entry::Occupied(mut entry) => {
                    if meta.uid < *entry.get() {
                        entry.insert(meta.uid.clone());
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(meta.uid.clone());
                }
            }
        }
        node
    }

    fn register(
        &mut self,
        scope: &str,
        api_version: &str,
        kind: &str,
        meta: &ObjectMeta,
        uid: String,
    ) -> Node {
        let key = NodeKey::new(scope, meta.namespace.as_str(), uid.as_str());
        let candidate = Node {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            labels: Labels::from(meta.labels.clone()),
            name: meta.name.clone(),
            namespace: meta.namespace.clone(),
            uid,
        };

        let is_namespace = is_namespace_kind(api_group(api_version), kind);
        let node = self.nodes.get_or_create(key, candidate);
        if is_namespace {
            return node;
        }

        for owner_ref in &meta.owner_references {
            let owner_meta = ObjectMeta {
                name: owner_ref.name.clone(),
                namespace: meta.namespace.clone(),
                uid: owner_ref.uid.clone(),
                cluster_name: scope.to_string(),
                ..Default::default()
            };
            let owner = self.node(&owner_ref.api_version, &owner_ref.kind, &owner_meta);
            self.relationship(&owner, kind, &node);
        }

        node
    }

    /// Register a resource referenced only by name.
    ///
    /// The identifier is derived from (scope, namespace, kind, name), so
    /// every reference to the same name resolves to the same node.
    /// [`Graph::resolve_named_references`] later folds it into the real
    /// object of that name, if one was registered.
    pub fn named_node(
        &mut self,
        scope: &str,
        api_version: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Node {
        let uid = to_uid(&[&scope, &namespace, &kind, &name]);
        self.named
            .insert(NameKey::new(scope, namespace, kind, name), uid.clone());

        let meta = ObjectMeta {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..Default::default()
        };
        self.register(scope, api_version, kind, &meta, uid)
    }

    /// Merge every name-addressed node into the registered object with the
    /// same (scope, namespace, kind, name), moving its edges onto the real
    /// uid. Returns the number of merged nodes.
    ///
    /// Safe to call more than once; references without a matching object
    /// are kept and retried on the next call.
    pub fn resolve_named_references(&mut self) -> usize {
        let mut pending: Vec<(NameKey, String, String)> = self
            .named
            .iter()
            .filter_map(|(name, synthetic)| {
                let real = self.known.get(name)?;
                (real != synthetic).then(|| (name.clone(), synthetic.clone(), real.clone()))
            })
            .collect();
        pending.sort();

        for (name, synthetic, real) in &pending {
            self.nodes.remove(&NodeKey::new(
                name.scope.as_str(),
                name.namespace.as_str(),
                synthetic.as_str(),
            ));
            self.relationships.rekey(synthetic, real);
            self.named.remove(name);
            log::debug!(
                "Resolved {} {}/{} to {}",
                name.kind,
                name.namespace,
                name.name,
                real
            );
        }

        pending.len()
    }

    /// Add an edge, or return the existing one between the same nodes.
    pub fn relationship(&mut self, from: &Node, label: &str, to: &Node) -> &mut Relationship {
        self.relationships.get_or_insert(from, label, to)
    }
}
