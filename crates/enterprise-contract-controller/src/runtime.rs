// crates/enterprise-contract-controller/src/runtime.rs
// ============================================================================
// Module: Controller Runtime
// Description: Watch loop wiring the reconciler into kube-runtime.
// Purpose: Run reconciliation for every PipelineRun with per-error requeue.
// Dependencies: kube (runtime), futures, tracing
// ============================================================================

//! ## Overview
//! The kube-runtime [`Controller`] serializes reconciles per object and runs
//! different objects concurrently. Errors requeue after the configured
//! transient or permanent delay; successful reconciles wait for the next
//! change event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use futures::StreamExt;
use kube::Api;
use kube::runtime::Controller;
use kube::runtime::controller::Action;
use kube::runtime::watcher;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cluster::ClusterClient;
use crate::cluster::ClusterError;
use crate::cluster::KubeCluster;
use crate::config::ControllerConfig;
use crate::config::ControllerSettings;
use crate::params::ConfigMapParams;
use crate::reconciler::PipelineRunReconciler;
use crate::reconciler::ReconcileError;
use crate::tekton::PipelineRun;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Controller startup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The kube client could not be created.
    #[error("controller startup failed: {0}")]
    Startup(#[from] ClusterError),
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Shared state handed to every reconcile call.
pub struct ControllerContext {
    /// Reconciliation logic.
    reconciler: PipelineRunReconciler,
    /// Requeue delays.
    settings: ControllerSettings,
}

impl ControllerContext {
    /// Creates a context.
    #[must_use]
    pub const fn new(reconciler: PipelineRunReconciler, settings: ControllerSettings) -> Self {
        Self { reconciler, settings }
    }
}

// ============================================================================
// SECTION: Callbacks
// ============================================================================

/// Reconciles one watched `PipelineRun`.
///
/// # Errors
///
/// Returns [`ReconcileError::InvalidObject`] when the object lacks a
/// namespace or name, and otherwise whatever the reconciler reports.
pub async fn reconcile_pipeline_run(
    pipeline_run: Arc<PipelineRun>,
    context: Arc<ControllerContext>,
) -> Result<Action, ReconcileError> {
    let namespace = pipeline_run
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| ReconcileError::InvalidObject("pipeline run has no namespace".to_string()))?;
    let name = pipeline_run
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ReconcileError::InvalidObject("pipeline run has no name".to_string()))?;
    let outcome = context.reconciler.reconcile(namespace, name).await?;
    debug!(namespace, name, outcome = ?outcome, "reconcile finished");
    Ok(Action::await_change())
}

/// Chooses the requeue delay for a failed reconcile.
#[must_use]
pub fn error_policy(
    pipeline_run: Arc<PipelineRun>,
    error: &ReconcileError,
    context: Arc<ControllerContext>,
) -> Action {
    let namespace = pipeline_run.metadata.namespace.as_deref().unwrap_or_default();
    let name = pipeline_run.metadata.name.as_deref().unwrap_or_default();
    if error.is_permanent() {
        warn!(namespace, name, error = %error, "reconcile failed permanently");
        Action::requeue(context.settings.permanent_requeue())
    } else {
        warn!(namespace, name, error = %error, "reconcile failed; retrying");
        Action::requeue(context.settings.transient_requeue())
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the controller until a shutdown signal arrives.
///
/// # Errors
///
/// Returns [`RuntimeError`] when no kube client can be built.
pub async fn run(config: &ControllerConfig) -> Result<(), RuntimeError> {
    let kube_cluster = KubeCluster::try_default().await?;
    let client = kube_cluster.client();
    let cluster: Arc<dyn ClusterClient> = Arc::new(kube_cluster);

    let namespace = config.controller.resolve_namespace();
    let params = Arc::new(ConfigMapParams::new(
        Arc::clone(&cluster),
        namespace.clone(),
        config.controller.params_config_map.clone(),
    ));
    let reconciler = PipelineRunReconciler::new(cluster, params, namespace.clone());
    let context = Arc::new(ControllerContext::new(reconciler, config.controller.clone()));

    info!(
        namespace = %namespace,
        params_config_map = %config.controller.params_config_map,
        "starting pipeline run controller"
    );
    let pipeline_runs: Api<PipelineRun> = Api::all(client);
    Controller::new(pipeline_runs, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_pipeline_run, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(object = %object, "reconciled"),
                Err(err) => debug!(error = %err, "reconcile loop error"),
            }
        })
        .await;
    info!("pipeline run controller stopped");
    Ok(())
}
