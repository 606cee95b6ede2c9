use clap::Args;
use kdeploy_core::{
    actions::KubectlActions,
    advisory::ContextAdvisory,
    config::Settings,
    dispatch::Dispatcher,
    inputs::RawConfig,
    report::WorkflowReporter,
};
use std::path::{Path, PathBuf};

use crate::output::print_json;
use crate::workdir::resolve_workdir;

// ---------------------------------------------------------------------------
// RunExit — failure already reported to the pipeline, exit without re-printing
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RunExit {
    #[error("run failed")]
    Failed,
}

impl RunExit {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunExit::Failed => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Step inputs
// ---------------------------------------------------------------------------

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// kubectl version to use ("latest" resolves the stable release)
    #[arg(long = "kubectl-version", env = "INPUT_KUBECTL-VERSION")]
    pub kubectl_version: Option<String>,

    /// Manifests to apply, separated by newlines, commas or semicolons
    #[arg(long, env = "INPUT_MANIFESTS")]
    pub manifests: Option<String>,

    /// Target namespace (default: "default")
    #[arg(long, env = "INPUT_NAMESPACE")]
    pub namespace: Option<String>,

    /// deploy, promote or reject
    #[arg(long, env = "INPUT_ACTION")]
    pub action: Option<String>,

    /// Deployment strategy, read for deploy only
    #[arg(long, env = "INPUT_STRATEGY")]
    pub strategy: Option<String>,

    /// Directory relative manifest paths resolve against
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workdir: Option<PathBuf>,
}

impl RunArgs {
    pub fn raw_config(&self) -> RawConfig {
        RawConfig {
            kubectl_version: self.kubectl_version.clone(),
            manifests: self.manifests.clone(),
            namespace: self.namespace.clone(),
            action: self.action.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(
    args: RunArgs,
    settings: &Settings,
    tool_cache: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let reporter = WorkflowReporter::stdout();
    let locator = super::locator(settings, tool_cache)?;
    let actions = KubectlActions::new(&reporter);
    let advisory = ContextAdvisory::from_env(&settings.context_env_var);
    let workdir = resolve_workdir(args.workdir.as_deref());

    let outcome = Dispatcher::new(advisory, &locator, &actions, &reporter)
        .with_workdir(workdir)
        .execute(&args.raw_config());

    if json {
        print_json(&outcome)?;
    }
    if outcome.failed {
        return Err(RunExit::Failed.into());
    }
    Ok(())
}
