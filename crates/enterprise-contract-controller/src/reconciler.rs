// crates/enterprise-contract-controller/src/reconciler.rs
// ============================================================================
// Module: PipelineRun Reconciler
// Description: Triggers verification for signed, successful PipelineRuns.
// Purpose: Drive each PipelineRun to its terminal state exactly once.
// Dependencies: thiserror, tracing, crate::cluster, crate::params
// ============================================================================

//! ## Overview
//! [`PipelineRunReconciler::reconcile`] fetches one `PipelineRun`, derives its
//! [`PipelineRunState`], and for `ReadyToTrigger` creates the verification
//! `TaskRun` before writing the completion marker.
//!
//! Invariants:
//! - At most one verification `TaskRun` exists per `PipelineRun` identity.
//! - The marker is written only after the `TaskRun` exists.
//! - An existing `TaskRun` is reused only when its labels name this run.
//! - A run that is not found, pending, or done is left untouched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::cluster::ClusterClient;
use crate::cluster::ClusterError;
use crate::params::ParamsProvider;
use crate::state::ANNOTATION_TRUE;
use crate::state::ANNOTATION_VSA_COMPLETE;
use crate::state::PipelineRunState;
use crate::taskrun::ImageReference;
use crate::taskrun::build_task_run;
use crate::taskrun::is_owned_by;
use crate::tekton::PipelineRun;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reconciliation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A required `PipelineRun` result is absent or empty.
    #[error("{result} result not found in PipelineRun {pipeline_run}")]
    MissingResult {
        /// Result name.
        result: String,
        /// `PipelineRun` name.
        pipeline_run: String,
    },
    /// Kubernetes API failure.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
    /// The deterministic `TaskRun` name is held by another `PipelineRun`'s run.
    #[error("TaskRun {task_run} belongs to another PipelineRun than {pipeline_run}")]
    TaskRunConflict {
        /// Conflicting `TaskRun` name.
        task_run: String,
        /// `PipelineRun` name.
        pipeline_run: String,
    },
    /// The watched object lacks identifying metadata.
    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl ReconcileError {
    /// Returns true when retrying cannot succeed without an external edit.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::MissingResult { .. } | Self::TaskRunConflict { .. } | Self::InvalidObject(_)
        )
    }
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of a successful reconcile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The `PipelineRun` no longer exists.
    NotFound,
    /// Not yet signed or not yet succeeded.
    Pending,
    /// Already carries the completion marker.
    AlreadyComplete,
    /// Verification was triggered and the marker written.
    Triggered {
        /// Name of the verification `TaskRun`.
        task_run: String,
        /// False when the `TaskRun` already existed from an earlier attempt.
        created: bool,
    },
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Reconciles `PipelineRun` objects.
pub struct PipelineRunReconciler {
    /// Kubernetes operations.
    cluster: Arc<dyn ClusterClient>,
    /// Verification parameter source.
    params: Arc<dyn ParamsProvider>,
    /// Namespace receiving verification `TaskRun`s.
    namespace: String,
}

impl PipelineRunReconciler {
    /// Creates a reconciler that places `TaskRun`s in `namespace`.
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        params: Arc<dyn ParamsProvider>,
        namespace: impl Into<String>,
    ) -> Self {
        Self { cluster, params, namespace: namespace.into() }
    }

    /// Reconciles the `PipelineRun` `namespace/name`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when a required result is missing or a
    /// cluster call fails. Nothing is marked complete on error.
    #[instrument(skip(self), fields(task_namespace = %self.namespace))]
    pub async fn reconcile(&self, namespace: &str, name: &str) -> Result<Outcome, ReconcileError> {
        let Some(pipeline_run) = self.cluster.get_pipeline_run(namespace, name).await? else {
            info!("pipeline run not found; nothing to do");
            return Ok(Outcome::NotFound);
        };

        let state = PipelineRunState::observe(&pipeline_run);
        match state {
            PipelineRunState::Pending => {
                info!(state = state.as_str(), "pipeline run not signed and succeeded; skipping");
                return Ok(Outcome::Pending);
            }
            PipelineRunState::Done => {
                info!(state = state.as_str(), "pipeline run already processed; skipping");
                return Ok(Outcome::AlreadyComplete);
            }
            PipelineRunState::ReadyToTrigger => {}
        }

        let image = ImageReference::from_pipeline_run(&pipeline_run)?;
        let params = self.params.params().await?;
        let task_run = build_task_run(&pipeline_run, &image, &params, &self.namespace);
        let task_run_name = task_run.metadata.name.clone().unwrap_or_default();

        let created = match self.cluster.create_task_run(&task_run).await {
            Ok(_) => {
                info!(task_run = %task_run_name, image = %image.container_image(), "verification task run created");
                true
            }
            Err(ClusterError::AlreadyExists(_)) => {
                self.confirm_existing(&pipeline_run, &task_run_name).await?;
                info!(task_run = %task_run_name, "verification task run already exists");
                false
            }
            Err(err) => return Err(err.into()),
        };

        self.cluster
            .annotate_pipeline_run(namespace, name, ANNOTATION_VSA_COMPLETE, ANNOTATION_TRUE)
            .await?;
        info!(task_run = %task_run_name, "pipeline run marked complete");
        Ok(Outcome::Triggered { task_run: task_run_name, created })
    }

    /// Checks that the `TaskRun` occupying `task_run_name` belongs to `pipeline_run`.
    async fn confirm_existing(
        &self,
        pipeline_run: &PipelineRun,
        task_run_name: &str,
    ) -> Result<(), ReconcileError> {
        let existing = self.cluster.get_task_run(&self.namespace, task_run_name).await?;
        match existing {
            Some(existing) if is_owned_by(&existing, pipeline_run) => Ok(()),
            Some(_) => {
                warn!(task_run = %task_run_name, "task run name is held by another pipeline run");
                Err(ReconcileError::TaskRunConflict {
                    task_run: task_run_name.to_string(),
                    pipeline_run: pipeline_run.metadata.name.clone().unwrap_or_default(),
                })
            }
            None => Err(ClusterError::NotFound(format!(
                "taskruns.tekton.dev \"{task_run_name}\" reported as existing but not found"
            ))
            .into()),
        }
    }
}
