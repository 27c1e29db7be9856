//! `discovery.k8s.io/v1` resources.

use serde::Deserialize;

use crate::error::Result;
use crate::graph::Graph;
use crate::object::Object;

use super::{target_node, Extractor, TargetReference};

/// Links endpoint slices to the objects backing each endpoint.
///
/// The owning Service is already linked through the slice's owner
/// reference.
pub struct DiscoveryV1Extractor;

#[derive(Debug, Default, Deserialize)]
struct EndpointSlice {
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Endpoint {
    #[serde(default)]
    target_ref: Option<TargetReference>,
}

impl DiscoveryV1Extractor {
    fn endpoint_slice(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let slice: EndpointSlice = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);

        for target in slice.endpoints.iter().filter_map(|e| e.target_ref.as_ref()) {
            if let Some(to) = target_node(graph, &scope, &node.namespace, target) {
                graph.relationship(&node, &to.kind, &to);
            }
        }

        Ok(())
    }
}

impl Extractor for DiscoveryV1Extractor {
    fn api_version(&self) -> &'static str {
        "discovery.k8s.io/v1"
    }

    fn ingest(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        match object.kind.as_str() {
            "EndpointSlice" => self.endpoint_slice(graph, object),
            _ => Ok(()),
        }
    }
}
