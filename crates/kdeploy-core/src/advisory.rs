//! Cluster-context advisory.
//!
//! kubectl needs a cluster context, normally supplied by a set-context step
//! that exports `KUBECONFIG`. Its absence is worth a warning but never a
//! failure: the runner may still have a usable `~/.kube/config`.

use std::ffi::OsString;

use crate::report::Reporter;

pub const MISSING_CONTEXT_WARNING: &str = "KUBECONFIG env is not explicitly set. Ensure cluster context is set by using k8s-set-context / aks-set-context action.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAdvisory {
    signal: Option<OsString>,
}

impl ContextAdvisory {
    /// Snapshot `var` from the process environment.
    pub fn from_env(var: &str) -> Self {
        Self::with_signal(std::env::var_os(var))
    }

    pub fn with_signal(signal: Option<OsString>) -> Self {
        Self { signal }
    }

    pub fn is_set(&self) -> bool {
        self.signal.as_ref().is_some_and(|v| !v.is_empty())
    }

    /// Warn through `reporter` when no cluster context is signalled.
    pub fn check(&self, reporter: &dyn Reporter) {
        if !self.is_set() {
            reporter.warning(MISSING_CONTEXT_WARNING);
        }
    }
}
