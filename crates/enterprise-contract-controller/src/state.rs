// crates/enterprise-contract-controller/src/state.rs
// ============================================================================
// Module: PipelineRun State
// Description: Classifies an observed PipelineRun for reconciliation.
// Purpose: Keep the trigger predicates pure and independently testable.
// Dependencies: crate::tekton
// ============================================================================

//! ## Overview
//! A `PipelineRun` is in exactly one [`PipelineRunState`]. The completion
//! marker wins over everything else, so a run that was marked and later lost
//! its signature is still `Done`.

use crate::tekton::CONDITION_STATUS_TRUE;
use crate::tekton::CONDITION_SUCCEEDED;
use crate::tekton::PipelineRun;

// ============================================================================
// SECTION: Annotations
// ============================================================================

/// Set by Tekton Chains once the run's provenance is signed.
pub const ANNOTATION_CHAINS_SIGNED: &str = "chains.tekton.dev/signed";
/// Completion marker written after the verification task is triggered.
pub const ANNOTATION_VSA_COMPLETE: &str = "enterprise-contract.redhat.com/vsa-complete";
/// Optional pointer to a source-data artifact forwarded to the task.
pub const ANNOTATION_SOURCE_DATA: &str = "conforma/source-data";
/// Annotation value meaning "set".
pub const ANNOTATION_TRUE: &str = "true";

// ============================================================================
// SECTION: State
// ============================================================================

/// Reconciliation state derived from a `PipelineRun`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRunState {
    /// Not yet signed or not yet succeeded.
    Pending,
    /// Signed, succeeded, and not yet processed.
    ReadyToTrigger,
    /// Completion marker present.
    Done,
}

impl PipelineRunState {
    /// Derives the state of a `PipelineRun`.
    #[must_use]
    pub fn observe(pipeline_run: &PipelineRun) -> Self {
        if is_complete(pipeline_run) {
            Self::Done
        } else if is_signed(pipeline_run) && is_succeeded(pipeline_run) {
            Self::ReadyToTrigger
        } else {
            Self::Pending
        }
    }

    /// Stable label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReadyToTrigger => "ready_to_trigger",
            Self::Done => "done",
        }
    }
}

fn annotation<'a>(pipeline_run: &'a PipelineRun, key: &str) -> Option<&'a str> {
    pipeline_run.metadata.annotations.as_ref()?.get(key).map(String::as_str)
}

/// Returns true when Chains reported the run as signed.
#[must_use]
pub fn is_signed(pipeline_run: &PipelineRun) -> bool {
    annotation(pipeline_run, ANNOTATION_CHAINS_SIGNED) == Some(ANNOTATION_TRUE)
}

/// Returns true when the `Succeeded` condition is `True`.
#[must_use]
pub fn is_succeeded(pipeline_run: &PipelineRun) -> bool {
    pipeline_run
        .condition(CONDITION_SUCCEEDED)
        .is_some_and(|condition| condition.status == CONDITION_STATUS_TRUE)
}

/// Returns true when the completion marker is set.
#[must_use]
pub fn is_complete(pipeline_run: &PipelineRun) -> bool {
    annotation(pipeline_run, ANNOTATION_VSA_COMPLETE) == Some(ANNOTATION_TRUE)
}

/// Returns the source-data artifact reference, if annotated.
#[must_use]
pub fn source_data_artifact(pipeline_run: &PipelineRun) -> Option<&str> {
    annotation(pipeline_run, ANNOTATION_SOURCE_DATA).filter(|value| !value.is_empty())
}
