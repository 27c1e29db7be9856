//! `route.openshift.io/v1` resources.

use serde::Deserialize;

use crate::error::Result;
use crate::graph::Graph;
use crate::object::Object;

use super::Extractor;

/// Links routes to their primary and alternate backends.
pub struct RouteV1Extractor;

#[derive(Debug, Default, Deserialize)]
struct Route {
    #[serde(default)]
    spec: RouteSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteSpec {
    #[serde(default)]
    to: Option<RouteTargetReference>,
    #[serde(default)]
    alternate_backends: Vec<RouteTargetReference>,
}

#[derive(Debug, Default, Deserialize)]
struct RouteTargetReference {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    weight: Option<i32>,
}

impl RouteV1Extractor {
    fn route(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let route: Route = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);

        let backends = route.spec.to.iter().chain(&route.spec.alternate_backends);
        for backend in backends.filter(|b| !b.name.is_empty()) {
            let kind = if backend.kind.is_empty() {
                "Service"
            } else {
                backend.kind.as_str()
            };
            let to = graph.named_node(&scope, "v1", kind, &node.namespace, &backend.name);
            let relationship = graph.relationship(&node, kind, &to);
            if let Some(weight) = backend.weight {
                relationship.attribute("weight", weight.to_string());
            }
        }

        Ok(())
    }
}

impl Extractor for RouteV1Extractor {
    fn api_version(&self) -> &'static str {
        "route.openshift.io/v1"
    }

    fn ingest(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        match object.kind.as_str() {
            "Route" => self.route(graph, object),
            _ => Ok(()),
        }
    }
}
