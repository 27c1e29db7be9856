use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{KubegraphError, Result};
use crate::object::Object;

/// Load every object from a file, or from all manifest files under a
/// directory.
///
/// Directory entries are read in path order so repeated runs ingest the
/// same objects in the same order. `List` documents are flattened into
/// their items.
pub fn load_objects(path: &Path) -> Result<Vec<Object>> {
    let files = discover_manifests(path)?;
    let mut objects = Vec::new();

    for file in &files {
        let content = std::fs::read_to_string(file).map_err(KubegraphError::Io)?;
        let loaded = parse_manifests(&content, &extension_of(file))
            .map_err(|e| KubegraphError::Parse(format!("{}: {}", file.display(), e)))?;
        log::debug!("Loaded {} objects from {}", loaded.len(), file.display());
        objects.extend(loaded);
    }

    log::info!("Loaded {} objects from {}", objects.len(), path.display());
    Ok(objects)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn is_manifest(path: &Path) -> bool {
    matches!(extension_of(path).as_str(), "json" | "yaml" | "yml")
}

/// Manifest files at `path`, sorted. A single file is returned as-is
/// whatever its extension.
pub fn discover_manifests(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(KubegraphError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input path does not exist: {}", path.display()),
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_manifest(p))
        .collect();
    files.sort();

    Ok(files)
}

/// Parse JSON (`json`) or a YAML stream (anything else) into objects.
pub fn parse_manifests(content: &str, extension: &str) -> Result<Vec<Object>> {
    let documents: Vec<Value> = if extension == "json" {
        vec![serde_json::from_str(content)
            .map_err(|e| KubegraphError::Parse(format!("JSON parse error: {}", e)))?]
    } else {
        serde_yaml_ng::Deserializer::from_str(content)
            .map(|doc| {
                Value::deserialize(doc)
                    .map_err(|e| KubegraphError::Parse(format!("YAML parse error: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut objects = Vec::new();
    for document in documents {
        collect_objects(document, &mut objects)?;
    }
    Ok(objects)
}

fn collect_objects(document: Value, out: &mut Vec<Object>) -> Result<()> {
    let is_list = document
        .get("kind")
        .and_then(Value::as_str)
        .map(|kind| kind.ends_with("List"))
        .unwrap_or(false);

    match document {
        Value::Null => Ok(()),
        Value::Object(mut map) if is_list && map.get("items").map_or(false, Value::is_array) => {
            if let Some(Value::Array(items)) = map.remove("items") {
                for item in items {
                    collect_objects(item, out)?;
                }
            }
            Ok(())
        }
        Value::Object(_) => {
            out.push(Object::from_value(document)?);
            Ok(())
        }
        other => Err(KubegraphError::Parse(format!(
            "expected a resource object, found: {}",
            other
        ))),
    }
}
