//! kubectl installation from the upstream release channel.
//!
//! # Release channel layout
//! - `<base>/stable.txt` — the current stable tag, e.g. `v1.30.2`
//! - `<base>/<tag>/bin/<os>/<arch>/kubectl[.exe]` — the binary
//! - `<binary url>.sha256` — hex SHA-256 of the binary
//!
//! Nothing here retries; a failed request surfaces to the caller as-is.

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{KdeployError, Result};
use crate::io;
use crate::platform::{self, KUBECTL};
use crate::tool_cache::{cache_key, clean_version, FsToolCache, ToolCache};

pub const LATEST: &str = "latest";

/// Installs a kubectl version and returns the path of the binary.
pub trait Installer {
    fn install(&self, version: &str) -> Result<PathBuf>;
}

/// Release tag for a version: `1.30.2` → `v1.30.2`. Non-semver input is
/// passed through untouched.
pub fn release_tag(version: &str) -> String {
    let cleaned = clean_version(version);
    if semver::Version::parse(&cleaned).is_ok() {
        format!("v{cleaned}")
    } else {
        cleaned
    }
}

// ---------------------------------------------------------------------------
// ReleaseClient
// ---------------------------------------------------------------------------

pub struct ReleaseClient {
    base_url: String,
    os: &'static str,
    arch: &'static str,
    http: reqwest::blocking::Client,
}

impl ReleaseClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("kdeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| KdeployError::Download {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url,
            os: platform::download_os(),
            arch: platform::download_arch(),
            http,
        })
    }

    pub fn stable_url(&self) -> String {
        format!("{}/stable.txt", self.base_url)
    }

    pub fn binary_url(&self, version: &str) -> String {
        format!(
            "{}/{}/bin/{}/{}/{}",
            self.base_url,
            release_tag(version),
            self.os,
            self.arch,
            platform::binary_name(KUBECTL)
        )
    }

    /// Resolve the `latest` alias to a concrete tag.
    pub fn stable_version(&self) -> Result<String> {
        let url = self.stable_url();
        let body = self
            .fetch(&url)
            .map_err(|e| KdeployError::StableVersion(e.to_string()))?;
        let version = String::from_utf8_lossy(&body).trim().to_string();
        if version.is_empty() {
            return Err(KdeployError::StableVersion(format!(
                "empty response from {url}"
            )));
        }
        debug!(%version, "resolved stable kubectl version");
        Ok(version)
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let to_err = |e: reqwest::Error| KdeployError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let resp = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(to_err)?;
        let bytes = resp.bytes().map_err(to_err)?;
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// VersionInstaller
// ---------------------------------------------------------------------------

pub struct VersionInstaller {
    client: ReleaseClient,
    cache: FsToolCache,
    verify_checksum: bool,
}

impl VersionInstaller {
    pub fn new(client: ReleaseClient, cache: FsToolCache) -> Self {
        Self {
            client,
            cache,
            verify_checksum: true,
        }
    }

    pub fn verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Download `version` into the cache and return the binary path.
    pub fn download(&self, version: &str) -> Result<PathBuf> {
        if cache_key(version).is_none() {
            return Err(KdeployError::InvalidVersion(version.to_string()));
        }
        let file_name = platform::binary_name(KUBECTL);
        if let Some(dir) = self.cache.find(KUBECTL, version) {
            let path = dir.join(&file_name);
            if io::is_executable(&path) {
                debug!(path = %path.display(), "kubectl already cached, skipping download");
                return Ok(path);
            }
        }

        let url = self.client.binary_url(version);
        info!(%url, "downloading kubectl");
        let data = self.client.fetch(&url)?;
        if data.is_empty() {
            return Err(KdeployError::Download {
                url,
                reason: "empty response body".to_string(),
            });
        }
        if self.verify_checksum {
            self.check_sha256(&url, &data)?;
        }

        let dir = self.cache.cache_file(&data, &file_name, KUBECTL, version)?;
        let path = dir.join(&file_name);
        if !io::is_executable(&path) {
            return Err(KdeployError::NotExecutable(path));
        }
        info!(path = %path.display(), "installed kubectl");
        Ok(path)
    }

    fn check_sha256(&self, url: &str, data: &[u8]) -> Result<()> {
        let published = self.client.fetch(&format!("{url}.sha256"))?;
        let expected = String::from_utf8_lossy(&published)
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let actual = format!("{:x}", Sha256::digest(data));
        if expected != actual {
            return Err(KdeployError::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl Installer for VersionInstaller {
    fn install(&self, version: &str) -> Result<PathBuf> {
        let version = if version.trim().eq_ignore_ascii_case(LATEST) {
            self.client.stable_version()?
        } else {
            version.trim().to_string()
        };
        self.download(&version)
    }
}
