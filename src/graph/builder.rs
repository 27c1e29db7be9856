//! Single-pass ingestion of a batch of objects.

use crate::error::{AggregateError, KubegraphError, Result};
use crate::extract::ExtractorRegistry;
use crate::object::Object;

use super::{Graph, Node};

/// Feeds objects into a [`Graph`] one at a time.
pub struct GraphBuilder {
    graph: Graph,
    extractors: ExtractorRegistry,
}

impl GraphBuilder {
    /// Builder with the built-in extractors.
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_extractors(scope, ExtractorRegistry::with_defaults())
    }

    pub fn with_extractors(scope: impl Into<String>, extractors: ExtractorRegistry) -> Self {
        Self {
            graph: Graph::new(scope),
            extractors,
        }
    }

    /// Register the object's node and owner edges, then run the extractor
    /// for its API version, if any.
    ///
    /// The generic node is always registered, even when the extractor fails.
    pub fn ingest(&mut self, object: &Object) -> Result<Node> {
        let node = self
            .graph
            .node(&object.api_version, &object.kind, &object.metadata);

        let Some(extractor) = self.extractors.find(&object.api_version) else {
            log::debug!(
                "No extractor for {} {}/{}",
                object.api_version,
                object.metadata.namespace,
                object.metadata.name
            );
            return Ok(node);
        };

        log::debug!(
            "Extracting {} {} {}/{}",
            object.api_version,
            object.kind,
            object.metadata.namespace,
            object.metadata.name
        );
        extractor
            .ingest(&mut self.graph, object)
            .map_err(|e| KubegraphError::Extractor {
                api_version: object.api_version.clone(),
                kind: object.kind.clone(),
                namespace: object.metadata.namespace.clone(),
                name: object.metadata.name.clone(),
                source: Box::new(e),
            })?;

        Ok(node)
    }

    /// Graph so far. Name-addressed references are not resolved yet.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Resolve name-addressed references against the ingested objects and
    /// return the graph.
    pub fn finish(mut self) -> Graph {
        let merged = self.graph.resolve_named_references();
        if merged > 0 {
            log::debug!("Merged {} name-addressed references into real objects", merged);
        }
        self.graph
    }
}

/// Build a graph from `objects` in input order.
///
/// `on_processed` runs once per object after it has been ingested. Extractor
/// failures do not stop the batch; they are returned together once every
/// object has been processed.
pub fn build_graph<F>(
    scope: &str,
    objects: &[Object],
    mut on_processed: F,
) -> (Graph, Option<AggregateError>)
where
    F: FnMut(),
{
    let mut builder = GraphBuilder::new(scope);
    let mut errors = Vec::new();

    for object in objects {
        if let Err(e) = builder.ingest(object) {
            log::warn!("{}", e);
            errors.push(e);
        }
        on_processed();
    }

    let graph = builder.finish();
    log::info!(
        "Built graph from {} objects: {} nodes, {} relationships, {} errors",
        objects.len(),
        graph.nodes.len(),
        graph.relationships.len(),
        errors.len()
    );

    (graph, AggregateError::from_errors(errors))
}
