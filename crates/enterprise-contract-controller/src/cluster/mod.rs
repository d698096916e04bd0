// crates/enterprise-contract-controller/src/cluster/mod.rs
// ============================================================================
// Module: Cluster Interface
// Description: The Kubernetes operations the reconciler depends on.
// Purpose: Decouple reconciliation logic from the live API server.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! [`ClusterClient`] is the narrow seam between the reconciler and the
//! Kubernetes API. [`KubeCluster`] talks to a real API server;
//! [`InMemoryCluster`] backs tests and supports fault injection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::tekton::PipelineRun;
use crate::tekton::TaskRun;

pub mod kube_client;
pub mod memory;

pub use self::kube_client::KubeCluster;
pub use self::memory::ClusterOperation;
pub use self::memory::InMemoryCluster;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by cluster operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// The object to create already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// The target object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other API failure.
    #[error("cluster api error: {0}")]
    Api(String),
}

// ============================================================================
// SECTION: Client Trait
// ============================================================================

/// Kubernetes operations used by the reconciler.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetches a `PipelineRun`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when the API call fails.
    async fn get_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PipelineRun>, ClusterError>;

    /// Fetches a `TaskRun`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when the API call fails.
    async fn get_task_run(&self, namespace: &str, name: &str) -> Result<Option<TaskRun>, ClusterError>;

    /// Creates a `TaskRun` and returns the stored object.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::AlreadyExists`] when the name is taken and
    /// [`ClusterError::Api`] for other failures.
    async fn create_task_run(&self, task_run: &TaskRun) -> Result<TaskRun, ClusterError>;

    /// Merges a single annotation into a `PipelineRun`.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when the patch fails.
    async fn annotate_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ClusterError>;

    /// Fetches the data of a `ConfigMap`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when the API call fails.
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, ClusterError>;
}
