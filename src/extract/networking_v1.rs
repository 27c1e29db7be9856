//! `networking.k8s.io/v1` resources.

use serde::Deserialize;

use crate::error::Result;
use crate::graph::Graph;
use crate::object::Object;

use super::Extractor;

/// Links ingresses to their class and backend services.
pub struct NetworkingV1Extractor;

#[derive(Debug, Default, Deserialize)]
struct Ingress {
    #[serde(default)]
    spec: IngressSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngressSpec {
    #[serde(default)]
    ingress_class_name: Option<String>,
    #[serde(default)]
    default_backend: Option<IngressBackend>,
    #[serde(default)]
    rules: Vec<IngressRule>,
}

#[derive(Debug, Default, Deserialize)]
struct IngressRule {
    #[serde(default)]
    host: String,
    #[serde(default)]
    http: Option<HttpIngressRuleValue>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpIngressRuleValue {
    #[serde(default)]
    paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpIngressPath {
    #[serde(default)]
    path: String,
    #[serde(default)]
    backend: IngressBackend,
}

#[derive(Debug, Default, Deserialize)]
struct IngressBackend {
    #[serde(default)]
    service: Option<ServiceBackend>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceBackend {
    #[serde(default)]
    name: String,
}

impl NetworkingV1Extractor {
    fn ingress(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        let ingress: Ingress = object.to_typed()?;
        let scope = graph.resolve_scope(&object.metadata.cluster_name);
        let node = graph.node(&object.api_version, &object.kind, &object.metadata);
        let spec = &ingress.spec;

        if let Some(class) = spec.ingress_class_name.as_deref().filter(|c| !c.is_empty()) {
            let to = graph.named_node(&scope, &object.api_version, "IngressClass", "", class);
            graph.relationship(&node, "IngressClass", &to);
        }

        let backend_service = |backend: &IngressBackend| {
            backend
                .service
                .as_ref()
                .map(|s| s.name.clone())
                .filter(|name| !name.is_empty())
        };

        if let Some(name) = spec.default_backend.as_ref().and_then(backend_service) {
            let to = graph.named_node(&scope, "v1", "Service", &node.namespace, &name);
            graph.relationship(&node, "Service", &to);
        }

        for rule in &spec.rules {
            let paths = rule.http.iter().flat_map(|http| &http.paths);
            for path in paths {
                let Some(name) = backend_service(&path.backend) else {
                    continue;
                };
                let to = graph.named_node(&scope, "v1", "Service", &node.namespace, &name);
                graph
                    .relationship(&node, "Service", &to)
                    .attribute("label", format!("{}{}", rule.host, path.path));
            }
        }

        Ok(())
    }
}

impl Extractor for NetworkingV1Extractor {
    fn api_version(&self) -> &'static str {
        "networking.k8s.io/v1"
    }

    fn ingest(&self, graph: &mut Graph, object: &Object) -> Result<()> {
        match object.kind.as_str() {
            "Ingress" => self.ingress(graph, object),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::to_uid;

    fn ingress() -> Object {
        serde_yaml_ng::from_str(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: shop
  namespace: shop
  uid: ing-uid
spec:
  ingressClassName: nginx
  defaultBackend:
    service:
      name: fallback
      port:
        number: 80
  rules:
    - host: shop.example.com
      http:
        paths:
          - path: /api
            pathType: Prefix
            backend:
              service:
                name: api
                port:
                  number: 8080
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 80
    - host: static.example.com
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ingress_links_class_and_services() {
        let mut graph = Graph::new("c1");
        let object = ingress();
        NetworkingV1Extractor.ingest(&mut graph, &object).unwrap();

        let edges = graph.relationships.from("ing-uid");
        let targets: Vec<(&str, &str)> = edges
            .iter()
            .map(|r| (r.label.as_str(), r.to.uid.as_str()))
            .collect();
        let api_uid = to_uid(&[&"c1", &"shop", &"Service", &"api"]);
        let web_uid = to_uid(&[&"c1", &"shop", &"Service", &"web"]);
        let fallback_uid = to_uid(&[&"c1", &"shop", &"Service", &"fallback"]);
        let class_uid = to_uid(&[&"c1", &"", &"IngressClass", &"nginx"]);
        assert_eq!(
            targets,
            vec![
                ("IngressClass", class_uid.as_str()),
                ("Service", fallback_uid.as_str()),
                ("Service", api_uid.as_str()),
                ("Service", web_uid.as_str()),
            ]
        );

        assert!(edges[1].attributes.is_empty());
        assert_eq!(
            edges[2].attributes.get("label").map(String::as_str),
            Some("shop.example.com/api")
        );
    }

    #[test]
    fn test_ingress_without_rules() {
        let mut graph = Graph::new("c1");
        let object: Object = serde_yaml_ng::from_str(
            r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: empty
  namespace: shop
  uid: ing-uid
"#,
        )
        .unwrap();
        NetworkingV1Extractor.ingest(&mut graph, &object).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.relationships.is_empty());
    }

    #[test]
    fn test_other_kinds_ignored() {
        let mut graph = Graph::new("c1");
        let object: Object = serde_yaml_ng::from_str(
            r#"
apiVersion: networking.k8s.io/v1
kind: NetworkPolicy
metadata:
  name: deny-all
  namespace: shop
  uid: np-uid
"#,
        )
        .unwrap();
        NetworkingV1Extractor.ingest(&mut graph, &object).unwrap();
        assert!(graph.nodes.is_empty());
    }
}
