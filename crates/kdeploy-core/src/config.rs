use crate::error::{KdeployError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_RELEASE_BASE_URL: &str = "https://dl.k8s.io/release";
pub const DEFAULT_CONTEXT_ENV_VAR: &str = "KUBECONFIG";

/// Relative to the home directory when no cache root is configured.
pub const HOME_TOOL_CACHE_DIR: &str = ".kdeploy/tool-cache";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Host-level settings. Everything has a default so the file is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Root of the tool cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_cache_dir: Option<PathBuf>,
    /// Release channel serving `stable.txt` and versioned kubectl binaries.
    #[serde(default = "default_release_base_url")]
    pub release_base_url: String,
    /// Compare downloads against the published `.sha256` file.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,
    /// Environment variable whose presence signals a configured cluster context.
    #[serde(default = "default_context_env_var")]
    pub context_env_var: String,
}

fn default_release_base_url() -> String {
    DEFAULT_RELEASE_BASE_URL.to_string()
}

fn default_verify_checksum() -> bool {
    true
}

fn default_context_env_var() -> String {
    DEFAULT_CONTEXT_ENV_VAR.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool_cache_dir: None,
            release_base_url: default_release_base_url(),
            verify_checksum: default_verify_checksum(),
            context_env_var: default_context_env_var(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    /// An explicit path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Err(KdeployError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Pick the tool cache root.
    ///
    /// Priority:
    /// 1. `explicit` (`--tool-cache` flag / `RUNNER_TOOL_CACHE`)
    /// 2. `tool_cache_dir` from the settings file
    /// 3. `~/.kdeploy/tool-cache`
    pub fn tool_cache_root(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        if let Some(p) = &self.tool_cache_dir {
            return Ok(p.clone());
        }
        let home = home::home_dir().ok_or(KdeployError::HomeNotFound)?;
        Ok(home.join(HOME_TOOL_CACHE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_without_path_is_default() {
        let s = Settings::load(None).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.release_base_url, "https://dl.k8s.io/release");
        assert!(s.verify_checksum);
        assert_eq!(s.context_env_var, "KUBECONFIG");
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(matches!(err, KdeployError::ConfigNotFound(_)));
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kdeploy.yaml");
        std::fs::write(&path, "verify_checksum: false\ntool_cache_dir: /opt/cache\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert!(!s.verify_checksum);
        assert_eq!(s.tool_cache_dir, Some(PathBuf::from("/opt/cache")));
        assert_eq!(s.release_base_url, DEFAULT_RELEASE_BASE_URL);
    }

    #[test]
    fn load_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kdeploy.yaml");
        std::fs::write(&path, "verify_checksums: false\n").unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(KdeployError::Yaml(_))
        ));
    }

    #[test]
    fn explicit_cache_root_wins() {
        let s = Settings {
            tool_cache_dir: Some(PathBuf::from("/from/file")),
            ..Settings::default()
        };
        assert_eq!(
            s.tool_cache_root(Some(Path::new("/from/flag"))).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(s.tool_cache_root(None).unwrap(), PathBuf::from("/from/file"));
    }
}
