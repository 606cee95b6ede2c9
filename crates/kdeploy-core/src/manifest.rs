//! Extract rollout-capable workloads from manifest files.
//!
//! Only local files and directories are read. Remote manifests are applied by
//! kubectl directly and are skipped here with a warning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{KdeployError, Result};

/// Kinds `kubectl rollout` can act on.
pub const ROLLOUT_KINDS: &[&str] = &["Deployment", "StatefulSet", "DaemonSet"];

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload {
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectHeader {
    kind: Option<String>,
    metadata: ObjectMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectMeta {
    name: Option<String>,
    namespace: Option<String>,
}

fn is_remote(manifest: &str) -> bool {
    manifest.starts_with("http://") || manifest.starts_with("https://")
}

/// Parse every document in `content` and keep the rollout-capable workloads.
pub fn parse_workloads(content: &str, source: &Path) -> Result<Vec<Workload>> {
    let to_err = |e: serde_yaml::Error| KdeployError::Manifest {
        path: source.to_path_buf(),
        reason: e.to_string(),
    };

    let mut workloads = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(doc).map_err(to_err)?;
        if value.is_null() {
            continue;
        }
        let header: ObjectHeader = serde_yaml::from_value(value).map_err(to_err)?;
        let (Some(kind), Some(name)) = (header.kind, header.metadata.name) else {
            continue;
        };
        if ROLLOUT_KINDS.contains(&kind.as_str()) {
            workloads.push(Workload {
                kind,
                name,
                namespace: header.metadata.namespace,
            });
        }
    }
    Ok(workloads)
}

fn manifest_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| MANIFEST_EXTENSIONS.contains(&e))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Workloads declared by `manifests`, in manifest order, without duplicates.
/// Relative paths resolve against `workdir` when one is given.
pub fn read_workloads(manifests: &[String], workdir: Option<&Path>) -> Result<Vec<Workload>> {
    let mut workloads: Vec<Workload> = Vec::new();
    for manifest in manifests {
        if is_remote(manifest) {
            warn!(%manifest, "skipping remote manifest when collecting workloads");
            continue;
        }
        let path = match workdir {
            Some(dir) => dir.join(manifest),
            None => PathBuf::from(manifest),
        };
        for file in manifest_files(&path)? {
            let content =
                std::fs::read_to_string(&file).map_err(|e| KdeployError::Manifest {
                    path: file.clone(),
                    reason: e.to_string(),
                })?;
            for w in parse_workloads(&content, &file)? {
                if !workloads.contains(&w) {
                    workloads.push(w);
                }
            }
        }
    }
    Ok(workloads)
}
