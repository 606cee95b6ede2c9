use anyhow::Context;
use clap::Subcommand;
use kdeploy_core::{
    config::Settings,
    installer::Installer,
    platform::{self, KUBECTL},
    tool_cache::ToolCache,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::output::{print_json, print_table};

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// List cached kubectl versions
    List,

    /// Download a kubectl version into the cache
    Install {
        /// Version to install ("latest" resolves the stable release)
        version: String,
    },
}

#[derive(Serialize)]
struct CachedVersion {
    version: String,
    path: PathBuf,
}

pub fn run(
    subcmd: CacheSubcommand,
    settings: &Settings,
    tool_cache: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        CacheSubcommand::List => list(settings, tool_cache, json),
        CacheSubcommand::Install { version } => install(settings, tool_cache, &version, json),
    }
}

fn list(settings: &Settings, tool_cache: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let cache = super::tool_cache(settings, tool_cache)?;
    let binary = platform::binary_name(KUBECTL);
    let entries: Vec<CachedVersion> = cache
        .find_all_versions(KUBECTL)
        .into_iter()
        .filter_map(|version| {
            let dir = cache.find(KUBECTL, &version)?;
            Some(CachedVersion {
                path: dir.join(&binary),
                version,
            })
        })
        .collect();

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No cached kubectl versions in {}", cache.root().display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .rev()
        .map(|e| vec![e.version.clone(), e.path.display().to_string()])
        .collect();
    print_table(&["VERSION", "PATH"], &rows);
    Ok(())
}

fn install(
    settings: &Settings,
    tool_cache: Option<&Path>,
    version: &str,
    json: bool,
) -> anyhow::Result<()> {
    let cache = super::tool_cache(settings, tool_cache)?;
    let installer = super::installer(settings, cache)?;
    let path = installer
        .install(version)
        .with_context(|| format!("failed to install kubectl {version}"))?;

    if json {
        print_json(&serde_json::json!({ "path": path }))?;
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
