//! Core (`v1`) resources: pods, endpoints and storage.

use serde::Deserialize;

use crate::error::Result;
use crate::graph::{Graph, Node};
use crate::object::Object;

use super::{target_node, Extractor, TargetReference};

/// Links pods to the node, service account, config and storage they use,
/// endpoints to their targets, and claims to volumes and storage classes.
pub struct CoreV1Extractor;

#[derive(Debug, Default, Deserialize)]
struct Pod {
    #[serde(default)]
    spec: PodSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    #[serde(default)]
    node_name: Option<String>,
    #[serde(default)]
    service_account_name: Option<String>,
    #[serde(default)]
    volumes: Vec<Volume>,
    #[serde(default)]
    init_containers: Vec<Container>,
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    config_map: Option<NameReference>,
    #[serde(default)]
    secret: Option<SecretVolumeSource>,
    #[serde(default)]
    persistent_volume_claim: Option<ClaimVolumeSource>,
    #[serde(default)]
    projected: Option<ProjectedVolumeSource>,
}

#[derive(Debug, Default, Deserialize)]
struct NameReference {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretVolumeSource {
    #[serde(default)]
    secret_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimVolumeSource {
    #[serde(default)]
    claim_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectedVolumeSource {
    #[serde(default)]
    sources: Vec<VolumeProjection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeProjection {
    #[serde(default)]
    config_map: Option<NameReference>,
    #[serde(default)]
    secret: Option<NameReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    #[serde(default)]
    env_from: Vec<EnvFromSource>,
    #[serde(default)]
    env: Vec<EnvVar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvFromSource {
    #[serde(default)]
    config_map_ref: Option<NameReference>,
    #[serde(default)]
    secret_ref: Option<NameReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvVar {
    #[serde(default)]
    value_from: Option<EnvVarSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvVarSource {
    #[serde(default)]
    config_map_key_ref: Option<NameReference>,
    #[serde(default)]
    secret_key_ref: Option<NameReference>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Endpoints {
    #[serde(default)]
    subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointSubset {
    #[serde(default)]
    addresses: Vec<EndpointAddress>,
    #[serde(default)]
    not_ready_addresses: Vec<EndpointAddress>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointAddress {
    #[serde(default)]
    target_ref: Option<TargetReference>,
}

#[derive(Debug, Default, Deserialize)]
struct PersistentVolumeClaim {
    #[serde(default)]
    spec: ClaimSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimSpec {
    #[serde(default)]
    volume_name: Option<String>,
    #[serde(default)]
    storage_class_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PersistentVolume {
    #[serde(default)]
    spec: VolumeSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeSpec {
    #[serde(default)]
    storage_class_name: Option<String>,
    #[serde(default)]
    claim_ref: Option<TargetReference>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Link `from` to a same-namespace `v1` resource known only by name.
fn link_named(graph: &mut Graph, scope: &str, from: &Node, kind: &str, name: &str) {
    if name.is_empty() {
        return;
    }
    let to = graph.named_node(scope, "v1", kind, &from.namespace, name);
    graph.relationship(from, kind, &to);
}

impl CoreV1Extractor {
    fn pod(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let pod: Pod = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);
        let spec = &pod.spec;

        if let Some(node_name) = non_empty(&spec.node_name) {
            let host = graph.named_node(&scope, "v1", "Node", "", node_name);
            graph.relationship(&host, &node.kind, &node);
        }

        if let Some(account) = non_empty(&spec.service_account_name) {
            link_named(graph, &scope, &node, "ServiceAccount", account);
        }

        for volume in &spec.volumes {
            if let Some(config_map) = &volume.config_map {
                link_named(graph, &scope, &node, "ConfigMap", &config_map.name);
            }
            if let Some(secret) = &volume.secret {
                link_named(graph, &scope, &node, "Secret", &secret.secret_name);
            }
            if let Some(claim) = &volume.persistent_volume_claim {
                link_named(graph, &scope, &node, "PersistentVolumeClaim", &claim.claim_name);
            }
            if let Some(projected) = &volume.projected {
                for source in &projected.sources {
                    if let Some(config_map) = &source.config_map {
                        link_named(graph, &scope, &node, "ConfigMap", &config_map.name);
                    }
                    if let Some(secret) = &source.secret {
                        link_named(graph, &scope, &node, "Secret", &secret.name);
                    }
                }
            }
        }

        for container in spec.init_containers.iter().chain(&spec.containers) {
            for env_from in &container.env_from {
                if let Some(config_map) = &env_from.config_map_ref {
                    link_named(graph, &scope, &node, "ConfigMap", &config_map.name);
                }
                if let Some(secret) = &env_from.secret_ref {
                    link_named(graph, &scope, &node, "Secret", &secret.name);
                }
            }
            for source in container.env.iter().filter_map(|e| e.value_from.as_ref()) {
                if let Some(config_map) = &source.config_map_key_ref {
                    link_named(graph, &scope, &node, "ConfigMap", &config_map.name);
                }
                if let Some(secret) = &source.secret_key_ref {
                    link_named(graph, &scope, &node, "Secret", &secret.name);
                }
            }
        }

        Ok(())
    }

    fn endpoints(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let endpoints: Endpoints = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);

        // Endpoints share their Service's name.
        if !node.name.is_empty() {
            let service = graph.named_node(&scope, "v1", "Service", &node.namespace, &node.name);
            graph.relationship(&service, &node.kind, &node);
        }

        let addresses = endpoints
            .subsets
            .iter()
            .flat_map(|s| s.addresses.iter().chain(&s.not_ready_addresses));
        for target in addresses.filter_map(|a| a.target_ref.as_ref()) {
            if let Some(to) = target_node(graph, &scope, &node.namespace, target) {
                graph.relationship(&node, &to.kind, &to);
            }
        }

        Ok(())
    }

    fn persistent_volume_claim(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let claim: PersistentVolumeClaim = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);

        if let Some(volume) = non_empty(&claim.spec.volume_name) {
            let to = graph.named_node(&scope, "v1", "PersistentVolume", "", volume);
            graph.relationship(&node, "PersistentVolume", &to);
        }
        if let Some(class) = non_empty(&claim.spec.storage_class_name) {
            let to = graph.named_node(&scope, "storage.k8s.io/v1", "StorageClass", "", class);
            graph.relationship(&node, "StorageClass", &to);
        }

        Ok(())
    }

    fn persistent_volume(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let volume: PersistentVolume = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);

        if let Some(class) = non_empty(&volume.spec.storage_class_name) {
            let to = graph.named_node(&scope, "storage.k8s.io/v1", "StorageClass", "", class);
            graph.relationship(&node, "StorageClass", &to);
        }
        if let Some(claim) = &volume.spec.claim_ref {
            if let Some(to) = target_node(graph, &scope, "", claim) {
                graph.relationship(&node, &to.kind, &to);
            }
        }

        Ok(())
    }
}

impl Extractor for CoreV1Extractor {
    fn api_version(&self) -> &'static str {
        "v1"
    }

    fn ingest(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        match object.kind.as_str() {
            "Pod" => self.pod(graph, object),
            "Endpoints" => self.endpoints(graph, object),
            "PersistentVolumeClaim" => self.persistent_volume_claim(graph, object),
            "PersistentVolume" => self.persistent_volume(graph, object),
            _ => Ok(()),
        }
    }
}
