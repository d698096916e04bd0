// crates/enterprise-contract-controller/src/cluster/kube_client.rs
// ============================================================================
// Module: Live Cluster Client
// Description: ClusterClient backed by the kube API client.
// Purpose: Execute reconciler operations against a real API server.
// Dependencies: kube, k8s-openapi, serde_json
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use kube::Client;
use kube::api::Patch;
use kube::api::PatchParams;
use kube::api::PostParams;
use serde_json::json;

use super::ClusterClient;
use super::ClusterError;
use crate::tekton::PipelineRun;
use crate::tekton::TaskRun;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HTTP status returned for name conflicts.
const STATUS_CONFLICT: u16 = 409;
/// HTTP status returned for missing objects.
const STATUS_NOT_FOUND: u16 = 404;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Cluster client talking to a Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    /// Shared kube client.
    client: Client,
}

impl KubeCluster {
    /// Wraps an existing kube client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient kubeconfig or in-cluster environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Api`] when no usable configuration is found.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await.map_err(map_kube_error)?;
        Ok(Self::new(client))
    }

    /// Returns the underlying kube client.
    #[must_use]
    pub fn client(&self) -> Client {
        self.client.clone()
    }
}

/// Maps kube errors onto [`ClusterError`] by HTTP status.
fn map_kube_error(err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(response) if response.code == STATUS_CONFLICT => {
            ClusterError::AlreadyExists(response.message)
        }
        kube::Error::Api(response) if response.code == STATUS_NOT_FOUND => {
            ClusterError::NotFound(response.message)
        }
        other => ClusterError::Api(other.to_string()),
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PipelineRun>, ClusterError> {
        let api: Api<PipelineRun> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(map_kube_error)
    }

    async fn get_task_run(&self, namespace: &str, name: &str) -> Result<Option<TaskRun>, ClusterError> {
        let api: Api<TaskRun> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await.map_err(map_kube_error)
    }

    async fn create_task_run(&self, task_run: &TaskRun) -> Result<TaskRun, ClusterError> {
        let namespace = task_run
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| ClusterError::Api("task run has no namespace".to_string()))?;
        let api: Api<TaskRun> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), task_run).await.map_err(map_kube_error)
    }

    async fn annotate_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ClusterError> {
        let api: Api<PipelineRun> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "metadata": { "annotations": { key: value } } });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, ClusterError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let config_map = api.get_opt(name).await.map_err(map_kube_error)?;
        Ok(config_map.map(|config_map| config_map.data.unwrap_or_default()))
    }
}
