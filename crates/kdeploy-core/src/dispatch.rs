//! Run dispatcher: one pipeline invocation, start to finish.
//!
//! ```text
//! Start
//!   │  ContextAdvisory::check        (warns, never fails)
//!   ▼
//! AdvisoryDone
//!   │  ExecutableLocator::resolve    (Err → propagated, fatal)
//!   ▼
//! ExecutableResolved
//!   │  inputs::validate              (NoManifests → reported, Failed)
//!   ▼
//! InputsValidated
//!   │  match ActionRequest
//!   ├─ Deploy  → Deploying  ─┐
//!   ├─ Promote → Promoting  ─┤       (collaborator Err → propagated)
//!   ├─ Reject  → Rejecting  ─┤
//!   └─ Invalid → Failed     ─┤       (reported)
//!                            ▼
//!                        Terminal
//! ```
//!
//! All run state lives in a [`RunContext`] created per call; the dispatcher
//! itself holds only its collaborators.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::actions::Actions;
use crate::advisory::ContextAdvisory;
use crate::error::{KdeployError, Result};
use crate::inputs::{self, invalid_action_message, ActionRequest, RawConfig};
use crate::kubectl::Kubectl;
use crate::locator::{ExecutableLocator, ToolReference};
use crate::report::Reporter;
use crate::types::{ActionKind, RunState};

// ---------------------------------------------------------------------------
// RunOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub state: RunState,
    /// Every state visited, starting with `Start`.
    pub trace: Vec<RunState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubectl: Option<PathBuf>,
    pub failed: bool,
}

// ---------------------------------------------------------------------------
// RunContext
// ---------------------------------------------------------------------------

struct RunContext {
    trace: Vec<RunState>,
    kubectl: Option<ToolReference>,
    action: Option<ActionKind>,
    failed: bool,
}

impl RunContext {
    fn new() -> Self {
        Self {
            trace: vec![RunState::Start],
            kubectl: None,
            action: None,
            failed: false,
        }
    }

    fn state(&self) -> RunState {
        self.trace.last().copied().unwrap_or(RunState::Start)
    }

    fn advance(&mut self, next: RunState) {
        debug!(from = %self.state(), to = %next, "run state");
        self.trace.push(next);
    }

    fn fail(&mut self, reporter: &dyn Reporter, message: &str) {
        reporter.set_failed(message);
        self.failed = true;
        if self.state() != RunState::Failed {
            self.advance(RunState::Failed);
        }
    }

    fn finish(mut self) -> RunOutcome {
        self.advance(RunState::Terminal);
        RunOutcome {
            state: RunState::Terminal,
            trace: self.trace,
            action: self.action,
            kubectl: self.kubectl.map(|t| t.path().to_path_buf()),
            failed: self.failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<'a> {
    advisory: ContextAdvisory,
    locator: &'a ExecutableLocator,
    actions: &'a dyn Actions,
    reporter: &'a dyn Reporter,
    workdir: Option<PathBuf>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        advisory: ContextAdvisory,
        locator: &'a ExecutableLocator,
        actions: &'a dyn Actions,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            advisory,
            locator,
            actions,
            reporter,
            workdir: None,
        }
    }

    /// Directory kubectl runs from; relative manifest paths resolve against it.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Drive one run. Resolution and collaborator errors are returned as
    /// `Err`; missing manifests and unknown actions are reported and come back
    /// as a failed [`RunOutcome`].
    pub fn run(&self, raw: &RawConfig) -> Result<RunOutcome> {
        let mut ctx = RunContext::new();
        self.drive(&mut ctx, raw)?;
        Ok(ctx.finish())
    }

    /// Like [`run`](Self::run), but a propagated error is reported as the
    /// run's failure instead of being returned.
    pub fn execute(&self, raw: &RawConfig) -> RunOutcome {
        let mut ctx = RunContext::new();
        if let Err(e) = self.drive(&mut ctx, raw) {
            ctx.fail(self.reporter, &e.to_string());
        }
        ctx.finish()
    }

    fn drive(&self, ctx: &mut RunContext, raw: &RawConfig) -> Result<()> {
        self.advisory.check(self.reporter);
        ctx.advance(RunState::AdvisoryDone);

        let tool = self.locator.resolve(raw.declared_version())?;
        ctx.kubectl = Some(tool.clone());
        ctx.advance(RunState::ExecutableResolved);

        let inputs = match inputs::validate(raw) {
            Ok(v) => v,
            Err(KdeployError::NoManifests) => {
                ctx.fail(self.reporter, &KdeployError::NoManifests.to_string());
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        ctx.advance(RunState::InputsValidated);

        let mut kubectl = Kubectl::new(&tool, inputs.namespace.as_str());
        if let Some(dir) = &self.workdir {
            kubectl = kubectl.with_workdir(dir);
        }

        ctx.action = inputs.action.kind();
        if let Some(kind) = ctx.action {
            ctx.advance(RunState::for_action(kind));
        }

        match &inputs.action {
            ActionRequest::Deploy { strategy } => {
                self.reporter
                    .info(&format!("strategy: {}", strategy.as_deref().unwrap_or("")));
                self.actions
                    .deploy(&kubectl, &inputs.manifests, strategy.as_deref())?;
            }
            ActionRequest::Promote => self.actions.promote(&kubectl, &inputs.manifests)?,
            ActionRequest::Reject => self.actions.reject(&kubectl, &inputs.manifests)?,
            ActionRequest::Invalid { action } => {
                warn!(%action, "unknown action");
                ctx.fail(self.reporter, &invalid_action_message());
            }
        }
        Ok(())
    }
}
