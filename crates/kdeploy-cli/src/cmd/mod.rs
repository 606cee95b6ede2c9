pub mod cache;
pub mod resolve;
pub mod run;

use anyhow::Context;
use kdeploy_core::config::Settings;
use kdeploy_core::installer::{ReleaseClient, VersionInstaller};
use kdeploy_core::locator::{ExecutableLocator, PathSearch};
use kdeploy_core::tool_cache::FsToolCache;
use std::path::Path;

pub fn tool_cache(settings: &Settings, explicit: Option<&Path>) -> anyhow::Result<FsToolCache> {
    let root = settings
        .tool_cache_root(explicit)
        .context("failed to locate the tool cache")?;
    Ok(FsToolCache::new(root))
}

pub fn installer(settings: &Settings, cache: FsToolCache) -> anyhow::Result<VersionInstaller> {
    let client = ReleaseClient::new(settings.release_base_url.as_str())?;
    Ok(VersionInstaller::new(client, cache).verify_checksum(settings.verify_checksum))
}

/// Locator wired to the on-disk cache, `PATH`, and the release channel.
pub fn locator(settings: &Settings, explicit: Option<&Path>) -> anyhow::Result<ExecutableLocator> {
    let cache = tool_cache(settings, explicit)?;
    let installer = installer(settings, cache.clone())?;
    Ok(ExecutableLocator::new(cache, PathSearch::new(), installer))
}
