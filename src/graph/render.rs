//! Cypher and Graphviz output.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::{KubegraphError, Result};

use super::{Graph, Node, NodeKey};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Neo4j import script
    Cypher,
    /// DOT digraph
    Graphviz,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cypher => "cypher",
            Format::Graphviz => "graphviz",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = KubegraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cypher" => Ok(Format::Cypher),
            "graphviz" => Ok(Format::Graphviz),
            other => Err(KubegraphError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Graph {
    /// Render the whole graph. Output is byte-identical for equal graphs.
    pub fn render(&self, format: Format) -> String {
        match format {
            Format::Cypher => render_cypher(self),
            Format::Graphviz => render_graphviz(self),
        }
    }

    /// Render by format name.
    pub fn to_string_as(&self, format: &str) -> Result<String> {
        Ok(self.render(format.parse()?))
    }

    /// Render and write to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W, format: Format) -> Result<()> {
        w.write_all(self.render(format).as_bytes())?;
        Ok(())
    }
}

fn render_cypher(graph: &Graph) -> String {
    let mut out = String::new();

    for (key, node) in graph.nodes.sorted() {
        out.push_str(&format!(
            "MERGE (node:{} {{UID: \"{}\"}}) SET node.ClusterName = \"{}\", node.APIVersion = \"{}\", node.Namespace = \"{}\", node.Name = \"{}\"",
            node.kind, node.uid, key.scope, node.api_version, node.namespace, node.name
        ));
        if !node.labels.is_empty() {
            out.push_str(&format!(", {}", node.labels));
        }
        out.push_str(";\n");
    }

    for rel in graph.relationships.iter_sorted() {
        out.push_str(&format!(
            "MATCH (from:{} {{UID: \"{}\"}}), (to:{} {{UID: \"{}\"}}) MERGE (from)-[:{}]->(to);\n",
            rel.from.kind, rel.from.uid, rel.to.kind, rel.to.uid, rel.label
        ));
    }

    out
}

fn graphviz_node(indent: &str, node: &Node) -> String {
    format!(
        "{}\"{}\" [label=\"{}\\n{}\" tooltip=\"{}\"];\n",
        indent, node.uid, node.kind, node.name, node.api_version
    )
}

fn render_graphviz(graph: &Graph) -> String {
    let mut out = String::from("digraph {\n");
    out.push_str("  rankdir=\"LR\";\n");
    out.push_str("  node [shape=\"box\" style=\"rounded\"];\n");

    let nodes = graph.nodes.sorted();
    let mut i = 0;
    while i < nodes.len() {
        let scope = &nodes[i].0.scope;
        out.push_str(&format!("  subgraph \"cluster_{}\" {{\n", scope));
        out.push_str(&format!("    label=\"{}\";\n", scope));

        while i < nodes.len() && &nodes[i].0.scope == scope {
            let namespace = &nodes[i].0.namespace;
            let in_namespace = |key: &NodeKey| &key.scope == scope && &key.namespace == namespace;

            if namespace.is_empty() {
                while i < nodes.len() && in_namespace(nodes[i].0) {
                    out.push_str(&graphviz_node("    ", nodes[i].1));
                    i += 1;
                }
                continue;
            }

            out.push_str(&format!("    subgraph \"cluster_{}_{}\" {{\n", scope, namespace));
            out.push_str(&format!("      label=\"{}\";\n", namespace));
            while i < nodes.len() && in_namespace(nodes[i].0) {
                out.push_str(&graphviz_node("      ", nodes[i].1));
                i += 1;
            }
            out.push_str("    }\n");
        }

        out.push_str("  }\n");
    }

    for rel in graph.relationships.iter_sorted() {
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"",
            rel.from.uid, rel.to.uid, rel.label
        ));
        if !rel.attributes.is_empty() {
            out.push_str(&format!(" {}", rel.attributes));
        }
        out.push_str("];\n");
    }

    out.push_str("}\n");
    out
}
