//! Resolve which kubectl binary a run uses.
//!
//! Resolution order:
//! 1. A declared version: the cached copy, else install it.
//! 2. `kubectl` on the executable search path.
//! 3. The highest cached version.
//! 4. Otherwise fail with [`KdeployError::NotInstalled`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{KdeployError, Result};
use crate::installer::Installer;
use crate::io;
use crate::platform::{self, KUBECTL};
use crate::tool_cache::{compare_versions, ToolCache};

// ---------------------------------------------------------------------------
// ToolReference
// ---------------------------------------------------------------------------

/// Absolute path to an existing, executable kubectl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolReference {
    path: PathBuf,
}

impl ToolReference {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let mut path = path.into();
        if path.is_relative() {
            path = std::env::current_dir()?.join(path);
        }
        if !io::is_executable(&path) {
            return Err(KdeployError::NotExecutable(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// ExecutableSearch
// ---------------------------------------------------------------------------

pub trait ExecutableSearch {
    fn which(&self, name: &str) -> Option<PathBuf>;
}

/// Searches `PATH`, or an explicit search path when one is given.
#[derive(Debug, Clone, Default)]
pub struct PathSearch {
    paths: Option<OsString>,
}

impl PathSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paths(paths: impl Into<OsString>) -> Self {
        Self {
            paths: Some(paths.into()),
        }
    }
}

impl ExecutableSearch for PathSearch {
    fn which(&self, name: &str) -> Option<PathBuf> {
        match &self.paths {
            None => which::which(name).ok(),
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(name, Some(paths), cwd).ok()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ExecutableLocator
// ---------------------------------------------------------------------------

pub struct ExecutableLocator {
    cache: Box<dyn ToolCache>,
    search: Box<dyn ExecutableSearch>,
    installer: Box<dyn Installer>,
}

impl ExecutableLocator {
    pub fn new(
        cache: impl ToolCache + 'static,
        search: impl ExecutableSearch + 'static,
        installer: impl Installer + 'static,
    ) -> Self {
        Self {
            cache: Box::new(cache),
            search: Box::new(search),
            installer: Box::new(installer),
        }
    }

    pub fn resolve(&self, declared: Option<&str>) -> Result<ToolReference> {
        let binary = platform::binary_name(KUBECTL);

        if let Some(version) = declared.map(str::trim).filter(|v| !v.is_empty()) {
            if let Some(dir) = self.cache.find(KUBECTL, version) {
                info!(version, "using cached kubectl");
                return ToolReference::new(dir.join(&binary));
            }
            info!(version, "kubectl version not cached, installing");
            return ToolReference::new(self.installer.install(version)?);
        }

        if let Some(path) = self.search.which(KUBECTL) {
            info!(path = %path.display(), "using kubectl from PATH");
            return ToolReference::new(path);
        }

        let versions = self.cache.find_all_versions(KUBECTL);
        let version = versions
            .iter()
            .max_by(|a, b| compare_versions(a, b))
            .ok_or(KdeployError::NotInstalled)?;
        let dir = self
            .cache
            .find(KUBECTL, version)
            .ok_or(KdeployError::NotInstalled)?;
        info!(version = %version, "using highest cached kubectl");
        ToolReference::new(dir.join(binary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default, Clone)]
    struct Calls {
        cache: Rc<Cell<usize>>,
        search: Rc<Cell<usize>>,
        installs: Rc<RefCell<Vec<String>>>,
    }

    struct FakeCache {
        entries: HashMap<String, PathBuf>,
        calls: Calls,
    }

    impl ToolCache for FakeCache {
        fn find(&self, _tool: &str, version: &str) -> Option<PathBuf> {
            self.calls.cache.set(self.calls.cache.get() + 1);
            self.entries.get(version).cloned()
        }

        fn find_all_versions(&self, _tool: &str) -> Vec<String> {
            self.calls.cache.set(self.calls.cache.get() + 1);
            // Unordered on purpose: the locator must not rely on enumeration order.
            let mut v: Vec<String> = self.entries.keys().cloned().collect();
            v.sort_by(|a, b| b.cmp(a));
            v
        }
    }

    struct FakeSearch {
        found: Option<PathBuf>,
        calls: Calls,
    }

    impl ExecutableSearch for FakeSearch {
        fn which(&self, _name: &str) -> Option<PathBuf> {
            self.calls.search.set(self.calls.search.get() + 1);
            self.found.clone()
        }
    }

    struct FakeInstaller {
        result: Option<PathBuf>,
        calls: Calls,
    }

    impl Installer for FakeInstaller {
        fn install(&self, version: &str) -> Result<PathBuf> {
            self.calls.installs.borrow_mut().push(version.to_string());
            self.result.clone().ok_or_else(|| KdeployError::Download {
                url: "https://dl.k8s.io".into(),
                reason: "offline".into(),
            })
        }
    }

    fn fake_binary(dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(platform::binary_name(KUBECTL));
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        io::make_executable(&path).unwrap();
        path
    }

    fn locator(
        cached: &[(&str, PathBuf)],
        on_path: Option<PathBuf>,
        installed: Option<PathBuf>,
    ) -> (ExecutableLocator, Calls) {
        let calls = Calls::default();
        let cache = FakeCache {
            entries: cached
                .iter()
                .map(|(v, p)| (v.to_string(), p.clone()))
                .collect(),
            calls: calls.clone(),
        };
        let search = FakeSearch {
            found: on_path,
            calls: calls.clone(),
        };
        let installer = FakeInstaller {
            result: installed,
            calls: calls.clone(),
        };
        (ExecutableLocator::new(cache, search, installer), calls)
    }

    #[test]
    fn declared_cached_version_skips_installer() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("kubectl/1.30.2/x64");
        let bin = fake_binary(&dir);
        let (loc, calls) = locator(&[("1.30.2", dir)], None, None);

        let tool = loc.resolve(Some("1.30.2")).unwrap();
        assert_eq!(tool.path(), bin);
        assert!(calls.installs.borrow().is_empty());
        assert_eq!(calls.search.get(), 0);
    }

    #[test]
    fn declared_uncached_version_installs_once() {
        let tmp = TempDir::new().unwrap();
        let bin = fake_binary(&tmp.path().join("fresh"));
        let (loc, calls) = locator(&[], None, Some(bin.clone()));

        let tool = loc.resolve(Some(" 1.29.1 ")).unwrap();
        assert_eq!(tool.path(), bin);
        assert_eq!(*calls.installs.borrow(), vec!["1.29.1".to_string()]);
        assert_eq!(calls.search.get(), 0);
    }

    #[test]
    fn install_failure_propagates_unchanged() {
        let (loc, calls) = locator(&[], None, None);
        let err = loc.resolve(Some("latest")).unwrap_err();
        assert!(matches!(err, KdeployError::Download { .. }));
        assert_eq!(*calls.installs.borrow(), vec!["latest".to_string()]);
    }

    #[test]
    fn path_binary_wins_without_touching_cache() {
        let tmp = TempDir::new().unwrap();
        let on_path = fake_binary(&tmp.path().join("usr/bin"));
        let cached = fake_binary(&tmp.path().join("cache"));
        let (loc, calls) = locator(&[("1.30.0", cached)], Some(on_path.clone()), None);

        let tool = loc.resolve(None).unwrap();
        assert_eq!(tool.path(), on_path);
        assert_eq!(calls.cache.get(), 0);
        assert!(calls.installs.borrow().is_empty());
    }

    #[test]
    fn blank_declared_version_counts_as_absent() {
        let tmp = TempDir::new().unwrap();
        let on_path = fake_binary(&tmp.path().join("usr/bin"));
        let (loc, calls) = locator(&[], Some(on_path.clone()), None);

        assert_eq!(loc.resolve(Some("   ")).unwrap().path(), on_path);
        assert!(calls.installs.borrow().is_empty());
    }

    #[test]
    fn falls_back_to_highest_cached_version() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("kubectl/1.9.0/x64");
        let new = tmp.path().join("kubectl/1.10.0/x64");
        fake_binary(&old);
        let newest = fake_binary(&new);
        let (loc, calls) = locator(&[("1.9.0", old), ("1.10.0", new)], None, None);

        let tool = loc.resolve(None).unwrap();
        assert_eq!(tool.path(), newest);
        assert_eq!(calls.search.get(), 1);
        assert!(calls.installs.borrow().is_empty());
    }

    #[test]
    fn nothing_anywhere_is_not_installed() {
        let (loc, calls) = locator(&[], None, None);
        let err = loc.resolve(None).unwrap_err();
        assert!(matches!(err, KdeployError::NotInstalled));
        assert!(err.to_string().contains("kubectl-version"));
        assert!(calls.installs.borrow().is_empty());
    }

    #[test]
    fn cached_entry_without_binary_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("kubectl/1.30.2/x64");
        std::fs::create_dir_all(&dir).unwrap();
        let (loc, _) = locator(&[("1.30.2", dir)], None, None);

        assert!(matches!(
            loc.resolve(Some("1.30.2")),
            Err(KdeployError::NotExecutable(_))
        ));
    }

    #[test]
    fn path_search_honours_explicit_paths() {
        let tmp = TempDir::new().unwrap();
        let bin = fake_binary(tmp.path());
        let search = PathSearch::with_paths(tmp.path().as_os_str());
        assert_eq!(search.which(KUBECTL), Some(bin));

        let empty = TempDir::new().unwrap();
        let search = PathSearch::with_paths(empty.path().as_os_str());
        assert_eq!(search.which(KUBECTL), None);
    }
}
