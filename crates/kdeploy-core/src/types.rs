use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Deploy,
    Promote,
    Reject,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[ActionKind::Deploy, ActionKind::Promote, ActionKind::Reject]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Deploy => "deploy",
            ActionKind::Promote => "promote",
            ActionKind::Reject => "reject",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deploy" => Ok(ActionKind::Deploy),
            "promote" => Ok(ActionKind::Promote),
            "reject" => Ok(ActionKind::Reject),
            _ => Err(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Dispatcher states, in the order a successful run visits them:
/// `Start → AdvisoryDone → ExecutableResolved → InputsValidated →
/// Deploying | Promoting | Rejecting → Terminal`. Reported failures pass
/// through `Failed` before `Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Start,
    AdvisoryDone,
    ExecutableResolved,
    InputsValidated,
    Deploying,
    Promoting,
    Rejecting,
    Failed,
    Terminal,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Start => "start",
            RunState::AdvisoryDone => "advisory_done",
            RunState::ExecutableResolved => "executable_resolved",
            RunState::InputsValidated => "inputs_validated",
            RunState::Deploying => "deploying",
            RunState::Promoting => "promoting",
            RunState::Rejecting => "rejecting",
            RunState::Failed => "failed",
            RunState::Terminal => "terminal",
        }
    }

    /// The state entered when dispatching `kind`.
    pub fn for_action(kind: ActionKind) -> RunState {
        match kind {
            ActionKind::Deploy => RunState::Deploying,
            ActionKind::Promote => RunState::Promoting,
            ActionKind::Reject => RunState::Rejecting,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
