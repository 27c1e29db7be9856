//! Generic resource objects as decoded from JSON or YAML.
//!
//! An [`Object`] carries the fields every resource shares (apiVersion,
//! kind and metadata) and keeps everything else verbatim, so extractors
//! can convert it into the typed view they need.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KubegraphError, Result};

/// A generically-structured resource object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Metadata shared by all resources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner_references: Vec<OwnerReference>,
}

/// Back-link to the resource managing this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// API group of an apiVersion string (`apps/v1` -> `apps`, `v1` -> ``).
pub fn api_group(api_version: &str) -> &str {
    match api_version.rsplit_once('/') {
        Some((group, _)) => group,
        None => "",
    }
}

impl Object {
    pub fn group(&self) -> &str {
        api_group(&self.api_version)
    }

    /// Core-group `Namespace` objects never become stored nodes.
    pub fn is_namespace(&self) -> bool {
        is_namespace_kind(self.group(), &self.kind)
    }

    /// Convert into a typed resource view.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        let conversion_error = |reason: String| KubegraphError::Conversion {
            from: std::any::type_name::<Object>(),
            to: std::any::type_name::<T>(),
            reason,
        };
        let value = serde_json::to_value(self).map_err(|e| conversion_error(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| conversion_error(e.to_string()))
    }

    /// Decode an object from a JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| KubegraphError::Parse(e.to_string()))
    }
}

pub(crate) fn is_namespace_kind(group: &str, kind: &str) -> bool {
    group.is_empty() && kind == "Namespace"
}
