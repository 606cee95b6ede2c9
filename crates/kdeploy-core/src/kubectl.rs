//! Subprocess wrapper around a resolved kubectl binary.
//!
//! Every invocation is scoped to the run's namespace. stdout is returned to
//! the caller; a non-zero exit becomes [`KdeployError::KubectlFailed`] carrying
//! the tail of stderr.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{KdeployError, Result};
use crate::locator::ToolReference;

const STDERR_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct Kubectl {
    path: PathBuf,
    namespace: String,
    workdir: Option<PathBuf>,
}

impl Kubectl {
    pub fn new(tool: &ToolReference, namespace: impl Into<String>) -> Self {
        Self {
            path: tool.path().to_path_buf(),
            namespace: namespace.into(),
            workdir: None,
        }
    }

    /// Run kubectl from `dir` so relative manifest paths resolve against it.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Same binary and workdir, scoped to another namespace.
    pub fn in_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..self.clone()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// `kubectl apply -f <m1> -f <m2> …`, applied in the given order.
    pub fn apply(&self, manifests: &[String]) -> Result<String> {
        let mut args = vec!["apply"];
        for m in manifests {
            args.push("-f");
            args.push(m.as_str());
        }
        self.execute(&args)
    }

    pub fn rollout_status(&self, kind: &str, name: &str) -> Result<String> {
        let target = format!("{}/{}", kind.to_ascii_lowercase(), name);
        self.execute(&["rollout", "status", &target])
    }

    pub fn rollout_undo(&self, kind: &str, name: &str) -> Result<String> {
        let target = format!("{}/{}", kind.to_ascii_lowercase(), name);
        self.execute(&["rollout", "undo", &target])
    }

    pub fn execute(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.path);
        cmd.args(args)
            .arg("--namespace")
            .arg(&self.namespace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        debug!(
            kubectl = %self.path.display(),
            ?args,
            namespace = %self.namespace,
            "running kubectl"
        );
        let output = cmd.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr.trim().chars().take(STDERR_LIMIT).collect();
            return Err(KdeployError::KubectlFailed {
                command: args.join(" "),
                code: output
                    .status
                    .code()
                    .map(|c| format!("exit {c}"))
                    .unwrap_or_else(|| "terminated by signal".to_string()),
                stderr: tail,
            });
        }
        Ok(stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::io;
    use tempfile::TempDir;

    fn script(dir: &TempDir, body: &str) -> ToolReference {
        let path = dir.path().join("kubectl");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        io::make_executable(&path).unwrap();
        ToolReference::new(path).unwrap()
    }

    #[test]
    fn apply_passes_manifests_in_order_with_namespace() {
        let dir = TempDir::new().unwrap();
        let k = Kubectl::new(&script(&dir, r#"echo "$@""#), "staging");
        let out = k
            .apply(&["a.yaml".to_string(), "b.yaml".to_string()])
            .unwrap();
        assert_eq!(out.trim(), "apply -f a.yaml -f b.yaml --namespace staging");
    }

    #[test]
    fn rollout_targets_lowercase_kind() {
        let dir = TempDir::new().unwrap();
        let k = Kubectl::new(&script(&dir, r#"echo "$@""#), "default");
        let out = k.rollout_undo("Deployment", "web").unwrap();
        assert_eq!(out.trim(), "rollout undo deployment/web --namespace default");
    }

    #[test]
    fn runs_in_workdir() {
        let dir = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let k = Kubectl::new(&script(&dir, "pwd"), "default").with_workdir(work.path());
        let out = k.execute(&["version"]).unwrap();
        let expected = std::fs::canonicalize(work.path()).unwrap();
        assert_eq!(
            std::fs::canonicalize(out.trim()).unwrap(),
            expected
        );
    }

    #[test]
    fn non_zero_exit_is_an_error_with_stderr() {
        let dir = TempDir::new().unwrap();
        let k = Kubectl::new(
            &script(&dir, "echo 'error: no such resource' >&2\nexit 3"),
            "default",
        );
        match k.rollout_status("Deployment", "web") {
            Err(KdeployError::KubectlFailed {
                command,
                code,
                stderr,
            }) => {
                assert_eq!(command, "rollout status deployment/web");
                assert_eq!(code, "exit 3");
                assert_eq!(stderr, "error: no such resource");
            }
            other => panic!("expected KubectlFailed, got {other:?}"),
        }
    }
}
