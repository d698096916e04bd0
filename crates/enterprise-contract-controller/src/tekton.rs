// crates/enterprise-contract-controller/src/tekton.rs
// ============================================================================
// Module: Tekton Resource Types
// Description: Minimal tekton.dev/v1 PipelineRun and TaskRun models.
// Purpose: Typed access to the Tekton fields the reconciler reads and writes.
// Dependencies: kube, serde, serde_json
// ============================================================================

//! ## Overview
//! Tekton owns the `PipelineRun` and `TaskRun` definitions; this module models
//! only the fields the controller touches. Everything else is carried through
//! flattened maps so objects fetched from the cluster deserialize without loss
//! of the parts we ignore.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use kube::CustomResource;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Condition type reporting overall run success.
pub const CONDITION_SUCCEEDED: &str = "Succeeded";
/// Condition status meaning the condition holds.
pub const CONDITION_STATUS_TRUE: &str = "True";

// ============================================================================
// SECTION: Shared Types
// ============================================================================

/// Value of a Tekton parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Plain string value.
    String(String),
    /// Array of strings.
    Array(Vec<String>),
    /// Object with string values.
    Object(BTreeMap<String, String>),
}

impl ParamValue {
    /// Returns the value when it is a plain string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            Self::Array(_) | Self::Object(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Named parameter passed to a task or resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter value.
    pub value: ParamValue,
}

impl Param {
    /// Creates a string-valued parameter.
    #[must_use]
    pub fn string(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: ParamValue::String(value.into()),
        }
    }
}

/// Knative-style status condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `Succeeded`.
    #[serde(rename = "type")]
    pub type_: String,
    /// `True`, `False`, or `Unknown`.
    pub status: String,
    /// Machine-readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// SECTION: PipelineRun
// ============================================================================

/// Spec of a Tekton `PipelineRun`; opaque to the controller.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "tekton.dev",
    version = "v1",
    kind = "PipelineRun",
    namespaced,
    status = "PipelineRunStatus",
    schema = "disabled"
)]
pub struct PipelineRunSpec {
    /// Spec fields preserved verbatim.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Observed state of a `PipelineRun`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunStatus {
    /// Status conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Named pipeline results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PipelineRunResult>,
    /// Remaining status fields preserved verbatim.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Named result emitted by a `PipelineRun`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRunResult {
    /// Result name.
    pub name: String,
    /// Result value.
    pub value: ParamValue,
}

impl PipelineRun {
    /// Returns the condition of the given type, if reported.
    #[must_use]
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.status.as_ref()?.conditions.iter().find(|condition| condition.type_ == type_)
    }

    /// Returns the string value of a named result.
    ///
    /// When a name is reported more than once the last entry wins. Empty and
    /// non-string values count as absent.
    #[must_use]
    pub fn string_result(&self, name: &str) -> Option<&str> {
        self.status
            .as_ref()?
            .results
            .iter()
            .rfind(|result| result.name == name)
            .and_then(|result| result.value.as_str())
            .filter(|value| !value.is_empty())
    }
}

// ============================================================================
// SECTION: TaskRun
// ============================================================================

/// Spec of a Tekton `TaskRun`.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(group = "tekton.dev", version = "v1", kind = "TaskRun", namespaced, schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSpec {
    /// Reference to the task definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,
    /// Task parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// Execution timeout in Go duration notation, e.g. `10m0s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Task reference, either by name or through a remote resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// In-cluster task name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Remote resolver, e.g. `git`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<String>,
    /// Resolver parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
}

impl TaskRef {
    /// Returns the string value of a resolver parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|param| param.name == name).and_then(|param| param.value.as_str())
    }
}

impl TaskRun {
    /// Returns the string value of a task parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.spec.params.iter().find(|param| param.name == name).and_then(|param| param.value.as_str())
    }
}
