//! Host-local tool cache indexed by (tool, version, arch).
//!
//! Layout, shared with other pipeline tooling on the same runner:
//!
//! ```text
//! <root>/<tool>/<version>/<arch>/          ← cached files
//! <root>/<tool>/<version>/<arch>.complete  ← written last; entries without it are ignored
//! ```

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{KdeployError, Result};
use crate::{io, platform};

/// Lookup side of the tool cache, as seen by the executable locator.
pub trait ToolCache {
    /// Directory holding `tool` at exactly `version`, if a complete entry exists.
    fn find(&self, tool: &str, version: &str) -> Option<PathBuf>;

    /// Every complete cached version of `tool`, ascending by semantic version.
    fn find_all_versions(&self, tool: &str) -> Vec<String>;
}

/// Normalize a version string the way cache keys are written: `v1.30.2` and
/// `=1.30.2` both become `1.30.2`. Non-semver strings are only trimmed.
pub fn clean_version(version: &str) -> String {
    let trimmed = version.trim();
    let stripped = trimmed.trim_start_matches(&['v', '='][..]);
    match semver::Version::parse(stripped) {
        Ok(v) => v.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// The cache key for `version`, or `None` when the cleaned version is not a
/// single plain path component (separators, `.`, `..`, absolute paths).
pub fn cache_key(version: &str) -> Option<String> {
    let key = clean_version(version);
    if key.contains(['/', '\\']) {
        return None;
    }
    let mut parts = Path::new(&key).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(_)), None) => Some(key),
        _ => None,
    }
}

/// Total order over cache keys: valid semver sorts above anything else, and
/// ties between non-semver keys fall back to lexicographic order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

// ---------------------------------------------------------------------------
// FsToolCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FsToolCache {
    root: PathBuf,
    arch: String,
}

impl FsToolCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            arch: platform::cache_arch().to_string(),
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // `key` must come from `cache_key`.
    fn entry_dir(&self, tool: &str, key: &str) -> PathBuf {
        self.root.join(tool).join(key).join(&self.arch)
    }

    fn marker(&self, tool: &str, key: &str) -> PathBuf {
        self.root
            .join(tool)
            .join(key)
            .join(format!("{}.complete", self.arch))
    }

    fn is_complete(&self, tool: &str, key: &str) -> bool {
        self.entry_dir(tool, key).is_dir() && self.marker(tool, key).is_file()
    }

    /// Store `data` as `<entry>/<file_name>`, mark it executable and complete
    /// the entry. Returns the entry directory.
    pub fn cache_file(
        &self,
        data: &[u8],
        file_name: &str,
        tool: &str,
        version: &str,
    ) -> Result<PathBuf> {
        let key =
            cache_key(version).ok_or_else(|| KdeployError::InvalidVersion(version.into()))?;
        let dir = self.entry_dir(tool, &key);
        let marker = self.marker(tool, &key);
        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        io::ensure_dir(&dir)?;

        let dest = dir.join(file_name);
        io::atomic_write(&dest, data)?;
        io::make_executable(&dest)?;
        io::atomic_write(&marker, b"")?;

        debug!(tool, version = %key, dir = %dir.display(), "cached tool");
        Ok(dir)
    }
}

impl ToolCache for FsToolCache {
    fn find(&self, tool: &str, version: &str) -> Option<PathBuf> {
        let Some(key) = cache_key(version) else {
            debug!(tool, version, "not a cacheable version");
            return None;
        };
        if self.is_complete(tool, &key) {
            let dir = self.entry_dir(tool, &key);
            debug!(tool, version, dir = %dir.display(), "tool cache hit");
            Some(dir)
        } else {
            debug!(tool, version, "tool cache miss");
            None
        }
    }

    fn find_all_versions(&self, tool: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root.join(tool)) else {
            return Vec::new();
        };
        let mut versions: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|v| self.is_complete(tool, v))
            .collect();
        versions.sort_by(|a, b| compare_versions(a, b));
        versions
    }
}
