//! The three operations a run can dispatch to.
//!
//! [`Actions`] is the seam the dispatcher calls through. [`KubectlActions`] is
//! the built-in implementation: a plain `kubectl apply` rollout, with promote
//! and reject driven by `kubectl rollout`. Progressive strategies (canary,
//! blue-green) are not implemented here and are rejected up front.

use tracing::info;

use crate::error::{KdeployError, Result};
use crate::kubectl::Kubectl;
use crate::manifest::{read_workloads, Workload};
use crate::report::Reporter;

/// Strategy names that mean "apply the manifests as they are".
pub const BASIC_STRATEGIES: &[&str] = &["none", "basic"];

pub trait Actions {
    fn deploy(&self, kubectl: &Kubectl, manifests: &[String], strategy: Option<&str>) -> Result<()>;
    fn promote(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<()>;
    fn reject(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<()>;
}

pub fn is_basic_strategy(strategy: Option<&str>) -> bool {
    match strategy.map(str::trim) {
        None | Some("") => true,
        Some(s) => BASIC_STRATEGIES.iter().any(|b| b.eq_ignore_ascii_case(s)),
    }
}

// ---------------------------------------------------------------------------
// KubectlActions
// ---------------------------------------------------------------------------

pub struct KubectlActions<'a> {
    reporter: &'a dyn Reporter,
}

impl<'a> KubectlActions<'a> {
    pub fn new(reporter: &'a dyn Reporter) -> Self {
        Self { reporter }
    }

    fn echo(&self, output: &str) {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            self.reporter.info(line);
        }
    }

    fn workloads(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<Vec<Workload>> {
        let workloads = read_workloads(manifests, kubectl.workdir())?;
        if workloads.is_empty() {
            self.reporter
                .warning("No Deployment, StatefulSet or DaemonSet found in the supplied manifests");
        }
        Ok(workloads)
    }

    fn scoped(kubectl: &Kubectl, workload: &Workload) -> Kubectl {
        match &workload.namespace {
            Some(ns) => kubectl.in_namespace(ns.as_str()),
            None => kubectl.clone(),
        }
    }

    fn apply_and_wait(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<()> {
        self.echo(&kubectl.apply(manifests)?);
        for w in self.workloads(kubectl, manifests)? {
            info!(kind = %w.kind, name = %w.name, "waiting for rollout");
            self.echo(&Self::scoped(kubectl, &w).rollout_status(&w.kind, &w.name)?);
        }
        Ok(())
    }
}

impl Actions for KubectlActions<'_> {
    fn deploy(
        &self,
        kubectl: &Kubectl,
        manifests: &[String],
        strategy: Option<&str>,
    ) -> Result<()> {
        if !is_basic_strategy(strategy) {
            return Err(KdeployError::UnsupportedStrategy(
                strategy.unwrap_or_default().trim().to_string(),
            ));
        }
        self.apply_and_wait(kubectl, manifests)
    }

    fn promote(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<()> {
        self.apply_and_wait(kubectl, manifests)
    }

    fn reject(&self, kubectl: &Kubectl, manifests: &[String]) -> Result<()> {
        for w in self.workloads(kubectl, manifests)? {
            info!(kind = %w.kind, name = %w.name, "rolling back");
            self.echo(&Self::scoped(kubectl, &w).rollout_undo(&w.kind, &w.name)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_strategy_names() {
        assert!(is_basic_strategy(None));
        assert!(is_basic_strategy(Some("  ")));
        assert!(is_basic_strategy(Some("None")));
        assert!(is_basic_strategy(Some("basic")));
        assert!(!is_basic_strategy(Some("canary")));
        assert!(!is_basic_strategy(Some("blue-green")));
    }

    #[cfg(unix)]
    mod with_fake_kubectl {
        use super::super::*;
        use crate::io;
        use crate::locator::ToolReference;
        use crate::report::WorkflowReporter;
        use tempfile::TempDir;

        const APP: &str = "kind: Deployment\nmetadata:\n  name: web\n---\n\
                           kind: StatefulSet\nmetadata:\n  name: db\n  namespace: data\n";

        struct Fixture {
            dir: TempDir,
            kubectl: Kubectl,
        }

        impl Fixture {
            fn new() -> Self {
                let dir = TempDir::new().unwrap();
                let log = dir.path().join("calls.log");
                let bin = dir.path().join("kubectl");
                std::fs::write(
                    &bin,
                    format!("#!/bin/sh\necho \"$@\" >> '{}'\n", log.display()),
                )
                .unwrap();
                io::make_executable(&bin).unwrap();
                std::fs::write(dir.path().join("app.yaml"), APP).unwrap();
                let kubectl = Kubectl::new(&ToolReference::new(bin).unwrap(), "default")
                    .with_workdir(dir.path());
                Self { dir, kubectl }
            }

            fn calls(&self) -> Vec<String> {
                std::fs::read_to_string(self.dir.path().join("calls.log"))
                    .unwrap_or_default()
                    .lines()
                    .map(str::to_string)
                    .collect()
            }
        }

        fn manifests() -> Vec<String> {
            vec!["app.yaml".to_string()]
        }

        #[test]
        fn deploy_applies_then_waits_for_each_workload() {
            let fx = Fixture::new();
            let reporter = WorkflowReporter::new(Vec::new());
            KubectlActions::new(&reporter)
                .deploy(&fx.kubectl, &manifests(), Some("basic"))
                .unwrap();
            assert_eq!(
                fx.calls(),
                vec![
                    "apply -f app.yaml --namespace default",
                    "rollout status deployment/web --namespace default",
                    "rollout status statefulset/db --namespace data",
                ]
            );
        }

        #[test]
        fn deploy_rejects_progressive_strategies_before_running_kubectl() {
            let fx = Fixture::new();
            let reporter = WorkflowReporter::new(Vec::new());
            let err = KubectlActions::new(&reporter)
                .deploy(&fx.kubectl, &manifests(), Some("canary"))
                .unwrap_err();
            assert!(matches!(err, KdeployError::UnsupportedStrategy(s) if s == "canary"));
            assert!(fx.calls().is_empty());
        }

        #[test]
        fn reject_undoes_every_workload() {
            let fx = Fixture::new();
            let reporter = WorkflowReporter::new(Vec::new());
            KubectlActions::new(&reporter)
                .reject(&fx.kubectl, &manifests())
                .unwrap();
            assert_eq!(
                fx.calls(),
                vec![
                    "rollout undo deployment/web --namespace default",
                    "rollout undo statefulset/db --namespace data",
                ]
            );
        }

        #[test]
        fn reject_without_workloads_warns() {
            let fx = Fixture::new();
            std::fs::write(
                fx.dir.path().join("svc.yaml"),
                "kind: Service\nmetadata:\n  name: web\n",
            )
            .unwrap();
            let reporter = WorkflowReporter::new(Vec::new());
            KubectlActions::new(&reporter)
                .reject(&fx.kubectl, &["svc.yaml".to_string()])
                .unwrap();
            let out = String::from_utf8(reporter.into_inner()).unwrap();
            assert!(out.starts_with("::warning::No Deployment"));
            assert!(fx.calls().is_empty());
        }
    }
}
