//! Pipeline inputs and their validation.
//!
//! Raw inputs arrive as optional strings (flags or `INPUT_*` variables).
//! [`validate`] turns them into a [`ValidatedInputs`] with the action decoded
//! once into a closed [`ActionRequest`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{KdeployError, Result};
use crate::types::ActionKind;

pub const DEFAULT_NAMESPACE: &str = "default";

// ---------------------------------------------------------------------------
// RawConfig
// ---------------------------------------------------------------------------

/// Unvalidated pipeline inputs. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    pub kubectl_version: Option<String>,
    pub manifests: Option<String>,
    pub namespace: Option<String>,
    pub action: Option<String>,
    pub strategy: Option<String>,
}

impl RawConfig {
    /// The declared kubectl version, if one was given.
    pub fn declared_version(&self) -> Option<&str> {
        non_empty(self.kubectl_version.as_deref())
    }
}

/// Trim `value` and drop it when nothing is left.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// ActionRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRequest {
    Deploy { strategy: Option<String> },
    Promote,
    Reject,
    /// The action input named none of the known actions.
    Invalid { action: String },
}

impl ActionRequest {
    /// Decode the action discriminator. The strategy is only read for deploy.
    pub fn decode(action: Option<&str>, strategy: Option<&str>) -> Self {
        let action = non_empty(action).unwrap_or_default();
        match action.parse::<ActionKind>() {
            Ok(ActionKind::Deploy) => ActionRequest::Deploy {
                strategy: non_empty(strategy).map(str::to_string),
            },
            Ok(ActionKind::Promote) => ActionRequest::Promote,
            Ok(ActionKind::Reject) => ActionRequest::Reject,
            Err(other) => ActionRequest::Invalid { action: other },
        }
    }

    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            ActionRequest::Deploy { .. } => Some(ActionKind::Deploy),
            ActionRequest::Promote => Some(ActionKind::Promote),
            ActionRequest::Reject => Some(ActionKind::Reject),
            ActionRequest::Invalid { .. } => None,
        }
    }
}

/// Failure message for an unknown action, listing every valid one.
pub fn invalid_action_message() -> String {
    let names: Vec<&str> = ActionKind::all().iter().map(|k| k.as_str()).collect();
    format!(
        "Not a valid action. The allowed actions are {}",
        names.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedInputs {
    pub manifests: Vec<String>,
    pub namespace: String,
    pub action: ActionRequest,
}

static SEPARATOR_RE: OnceLock<Regex> = OnceLock::new();

fn separator_re() -> &'static Regex {
    SEPARATOR_RE.get_or_init(|| Regex::new(r"[\n,;]+").unwrap())
}

/// Split a delimiter-joined manifest list. Order is preserved; blank segments
/// are dropped and every entry is trimmed.
pub fn split_manifests(raw: &str) -> Vec<String> {
    separator_re()
        .split(raw)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate(raw: &RawConfig) -> Result<ValidatedInputs> {
    let manifests_input = non_empty(raw.manifests.as_deref()).ok_or(KdeployError::NoManifests)?;
    let manifests = split_manifests(manifests_input);
    if manifests.is_empty() {
        return Err(KdeployError::NoManifests);
    }

    let namespace = non_empty(raw.namespace.as_deref())
        .unwrap_or(DEFAULT_NAMESPACE)
        .to_string();
    let action = ActionRequest::decode(raw.action.as_deref(), raw.strategy.as_deref());

    Ok(ValidatedInputs {
        manifests,
        namespace,
        action,
    })
}
