use anyhow::Context;
use kdeploy_core::{config::Settings, inputs::non_empty};
use std::path::Path;

use crate::output::print_json;

/// `kdeploy resolve` — run only the locator and print the kubectl path.
pub fn run(
    kubectl_version: Option<&str>,
    settings: &Settings,
    tool_cache: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let locator = super::locator(settings, tool_cache)?;
    let tool = locator
        .resolve(non_empty(kubectl_version))
        .context("failed to resolve kubectl")?;

    if json {
        print_json(&serde_json::json!({ "path": tool.path() }))?;
    } else {
        println!("{}", tool.path().display());
    }
    Ok(())
}
