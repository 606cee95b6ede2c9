use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KdeployError {
    // -- resolution ---------------------------------------------------------
    #[error(
        "Kubectl is not installed, either add install-kubectl action or provide \"kubectl-version\" input to download kubectl"
    )]
    NotInstalled,

    #[error("{0} is not an executable file")]
    NotExecutable(PathBuf),

    // -- install ------------------------------------------------------------
    #[error("invalid kubectl version '{0}'")]
    InvalidVersion(String),

    #[error("failed to resolve the stable kubectl version: {0}")]
    StableVersion(String),

    #[error("failed to download kubectl from {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // -- validation ---------------------------------------------------------
    #[error("No manifests supplied to deploy")]
    NoManifests,

    // -- actions ------------------------------------------------------------
    #[error("deployment strategy '{0}' is not supported; use 'none' or 'basic'")]
    UnsupportedStrategy(String),

    #[error("kubectl {command} failed ({code}): {stderr}")]
    KubectlFailed {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("failed to read manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    // -- configuration ------------------------------------------------------
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("home directory not found: set HOME or pass --tool-cache")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, KdeployError>;
