// crates/enterprise-contract-controller/src/lib.rs
// ============================================================================
// Module: Enterprise Contract Controller Library
// Description: PipelineRun reconciler that triggers image verification.
// Purpose: Turn signed, successful builds into verification TaskRuns.
// Dependencies: kube, k8s-openapi, tracing, tokio
// ============================================================================

//! ## Overview
//! The controller watches Tekton `PipelineRun`s. Once a run has succeeded and
//! Tekton Chains has signed it, [`PipelineRunReconciler`] creates a
//! verification `TaskRun` for the built image and marks the run with
//! `enterprise-contract.redhat.com/vsa-complete=true`.
//!
//! Cluster access goes through [`ClusterClient`], so the same reconciler runs
//! against [`KubeCluster`] in production and [`InMemoryCluster`] in tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cluster;
pub mod config;
pub mod params;
pub mod reconciler;
pub mod runtime;
pub mod state;
pub mod taskrun;
pub mod tekton;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cluster::ClusterClient;
pub use cluster::ClusterError;
pub use cluster::ClusterOperation;
pub use cluster::InMemoryCluster;
pub use cluster::KubeCluster;
pub use config::ConfigError;
pub use config::ControllerConfig;
pub use config::ControllerSettings;
pub use config::LogFormat;
pub use config::LoggingConfig;
pub use params::ConfigMapParams;
pub use params::ConformaParams;
pub use params::ParamsProvider;
pub use params::StaticParams;
pub use reconciler::Outcome;
pub use reconciler::PipelineRunReconciler;
pub use reconciler::ReconcileError;
pub use runtime::ControllerContext;
pub use runtime::RuntimeError;
pub use state::PipelineRunState;
pub use taskrun::ImageReference;
pub use tekton::PipelineRun;
pub use tekton::TaskRun;
pub use telemetry::TelemetryError;
pub use telemetry::init_tracing;
