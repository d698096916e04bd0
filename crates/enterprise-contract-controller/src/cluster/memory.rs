// crates/enterprise-contract-controller/src/cluster/memory.rs
// ============================================================================
// Module: In-Memory Cluster
// Description: Process-local ClusterClient with fault injection.
// Purpose: Exercise reconciliation without a live API server.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! Objects are keyed by `(namespace, name)`. Faults registered with
//! [`InMemoryCluster::inject_fault`] fail every call of that operation until
//! cleared, and each call is counted whether or not it fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;

use super::ClusterClient;
use super::ClusterError;
use crate::tekton::PipelineRun;
use crate::tekton::TaskRun;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Cluster operations that can be faulted and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClusterOperation {
    /// `get_pipeline_run`.
    GetPipelineRun,
    /// `get_task_run`.
    GetTaskRun,
    /// `create_task_run`.
    CreateTaskRun,
    /// `annotate_pipeline_run`.
    AnnotatePipelineRun,
    /// `get_config_map`.
    GetConfigMap,
}

type ObjectKey = (String, String);

#[derive(Default)]
struct ClusterState {
    pipeline_runs: BTreeMap<ObjectKey, PipelineRun>,
    task_runs: BTreeMap<ObjectKey, TaskRun>,
    config_maps: BTreeMap<ObjectKey, BTreeMap<String, String>>,
    faults: BTreeMap<ClusterOperation, ClusterError>,
    calls: BTreeMap<ClusterOperation, usize>,
    next_uid: u64,
}

/// In-memory cluster for tests and offline runs.
#[derive(Default)]
pub struct InMemoryCluster {
    /// Guarded object store.
    state: Mutex<ClusterState>,
}

fn key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

impl InMemoryCluster {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ClusterState>, ClusterError> {
        self.state.lock().map_err(|_| ClusterError::Api("cluster state poisoned".to_string()))
    }

    /// Records a call and returns the injected fault, if any.
    fn enter(
        state: &mut ClusterState,
        operation: ClusterOperation,
    ) -> Result<(), ClusterError> {
        *state.calls.entry(operation).or_insert(0) += 1;
        state.faults.get(&operation).map_or(Ok(()), |fault| Err(fault.clone()))
    }

    /// Stores or replaces a `PipelineRun`. Objects without a namespace land in `default`.
    pub fn insert_pipeline_run(&self, pipeline_run: PipelineRun) {
        if let Ok(mut state) = self.lock() {
            let namespace = pipeline_run.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
            let name = pipeline_run.metadata.name.clone().unwrap_or_default();
            state.pipeline_runs.insert((namespace, name), pipeline_run);
        }
    }

    /// Stores or replaces `TaskRun`s directly, bypassing create semantics.
    pub fn insert_task_run(&self, task_run: TaskRun) {
        if let Ok(mut state) = self.lock() {
            let namespace = task_run.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
            let name = task_run.metadata.name.clone().unwrap_or_default();
            state.task_runs.insert((namespace, name), task_run);
        }
    }

    /// Removes a `PipelineRun`.
    pub fn remove_pipeline_run(&self, namespace: &str, name: &str) {
        if let Ok(mut state) = self.lock() {
            state.pipeline_runs.remove(&key(namespace, name));
        }
    }

    /// Stores or replaces a `ConfigMap`'s data.
    pub fn insert_config_map(&self, namespace: &str, name: &str, data: BTreeMap<String, String>) {
        if let Ok(mut state) = self.lock() {
            state.config_maps.insert(key(namespace, name), data);
        }
    }

    /// Returns a stored `PipelineRun`.
    #[must_use]
    pub fn pipeline_run(&self, namespace: &str, name: &str) -> Option<PipelineRun> {
        self.lock().ok()?.pipeline_runs.get(&key(namespace, name)).cloned()
    }

    /// Returns all stored `TaskRun`s ordered by namespace and name.
    #[must_use]
    pub fn task_runs(&self) -> Vec<TaskRun> {
        self.lock().map(|state| state.task_runs.values().cloned().collect()).unwrap_or_default()
    }

    /// Fails every subsequent call of `operation` with `error`.
    pub fn inject_fault(&self, operation: ClusterOperation, error: ClusterError) {
        if let Ok(mut state) = self.lock() {
            state.faults.insert(operation, error);
        }
    }

    /// Clears all injected faults.
    pub fn clear_faults(&self) {
        if let Ok(mut state) = self.lock() {
            state.faults.clear();
        }
    }

    /// Number of calls made to `operation`, including failed ones.
    #[must_use]
    pub fn calls(&self, operation: ClusterOperation) -> usize {
        self.lock().map(|state| state.calls.get(&operation).copied().unwrap_or(0)).unwrap_or(0)
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn get_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PipelineRun>, ClusterError> {
        let mut state = self.lock()?;
        Self::enter(&mut state, ClusterOperation::GetPipelineRun)?;
        Ok(state.pipeline_runs.get(&key(namespace, name)).cloned())
    }

    async fn get_task_run(&self, namespace: &str, name: &str) -> Result<Option<TaskRun>, ClusterError> {
        let mut state = self.lock()?;
        Self::enter(&mut state, ClusterOperation::GetTaskRun)?;
        Ok(state.task_runs.get(&key(namespace, name)).cloned())
    }

    async fn create_task_run(&self, task_run: &TaskRun) -> Result<TaskRun, ClusterError> {
        let mut state = self.lock()?;
        Self::enter(&mut state, ClusterOperation::CreateTaskRun)?;
        let namespace = task_run
            .metadata
            .namespace
            .clone()
            .ok_or_else(|| ClusterError::Api("task run has no namespace".to_string()))?;
        let name = task_run
            .metadata
            .name
            .clone()
            .ok_or_else(|| ClusterError::Api("task run has no name".to_string()))?;
        let object_key = (namespace, name);
        if state.task_runs.contains_key(&object_key) {
            return Err(ClusterError::AlreadyExists(format!(
                "taskruns.tekton.dev \"{}\" already exists",
                object_key.1
            )));
        }
        state.next_uid += 1;
        let mut stored = task_run.clone();
        stored.metadata.uid = Some(format!("taskrun-{}", state.next_uid));
        state.task_runs.insert(object_key, stored.clone());
        Ok(stored)
    }

    async fn annotate_pipeline_run(
        &self,
        namespace: &str,
        name: &str,
        annotation: &str,
        value: &str,
    ) -> Result<(), ClusterError> {
        let mut state = self.lock()?;
        Self::enter(&mut state, ClusterOperation::AnnotatePipelineRun)?;
        let pipeline_run = state.pipeline_runs.get_mut(&key(namespace, name)).ok_or_else(|| {
            ClusterError::NotFound(format!("pipelineruns.tekton.dev \"{name}\" not found"))
        })?;
        pipeline_run
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(annotation.to_string(), value.to_string());
        Ok(())
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<BTreeMap<String, String>>, ClusterError> {
        let mut state = self.lock()?;
        Self::enter(&mut state, ClusterOperation::GetConfigMap)?;
        Ok(state.config_maps.get(&key(namespace, name)).cloned())
    }
}
