//! Kind-specific extractors adding edges beyond generic ownership.
//!
//! Each extractor serves one API version. The builder looks the object's
//! apiVersion up in an [`ExtractorRegistry`]; objects without a matching
//! entry only get their generic node and owner edges.

mod core_v1;
mod discovery_v1;
mod networking_v1;
mod route_v1;

pub use core_v1::CoreV1Extractor;
pub use discovery_v1::DiscoveryV1Extractor;
pub use networking_v1::NetworkingV1Extractor;
pub use route_v1::RouteV1Extractor;

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Result;
use crate::graph::{Graph, Node};
use crate::object::{Object, ObjectMeta};

/// Adds resource-specific nodes and edges for one API version.
pub trait Extractor {
    /// The apiVersion this extractor handles
    fn api_version(&self) -> &'static str;

    /// Add supplementary relationships for `object`.
    ///
    /// Runs after the object's generic node has been registered. May add
    /// nodes and edges, never removes them.
    fn ingest(&self, graph: &mut Graph, object: &Object) -> Result<()>;
}

/// Extractor table keyed by apiVersion
pub struct ExtractorRegistry {
    extractors: HashMap<&'static str, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with all built-in extractors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(CoreV1Extractor));
        registry.register(Box::new(NetworkingV1Extractor));
        registry.register(Box::new(RouteV1Extractor));
        registry.register(Box::new(DiscoveryV1Extractor));

        registry
    }

    /// Register an extractor, replacing any previous one for its apiVersion
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.api_version(), extractor);
    }

    pub fn find(&self, api_version: &str) -> Option<&dyn Extractor> {
        self.extractors.get(api_version).map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Reference to another object as found in endpoint addresses and claims.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TargetReference {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub uid: String,
}

/// Node for a target reference: its real uid when known, otherwise the
/// name-derived identifier.
pub(crate) fn target_node(
    graph: &mut Graph,
    scope: &str,
    default_namespace: &str,
    target: &TargetReference,
) -> Option<Node> {
    if target.kind.is_empty() || (target.uid.is_empty() && target.name.is_empty()) {
        return None;
    }

    let api_version = if target.api_version.is_empty() {
        "v1"
    } else {
        target.api_version.as_str()
    };
    let namespace = if target.namespace.is_empty() {
        default_namespace
    } else {
        target.namespace.as_str()
    };

    if target.uid.is_empty() {
        return Some(graph.named_node(scope, api_version, &target.kind, namespace, &target.name));
    }

    let meta = ObjectMeta {
        name: target.name.clone(),
        namespace: namespace.to_string(),
        uid: target.uid.clone(),
        cluster_name: scope.to_string(),
        ..Default::default()
    };
    Some(graph.node(api_version, &target.kind, &meta))
}
