// crates/enterprise-contract-controller/src/params.rs
// ============================================================================
// Module: Verification Parameters
// Description: Static parameters forwarded to the verification TaskRun.
// Purpose: Provide parameter values from a ConfigMap or fixed configuration.
// Dependencies: async-trait, crate::cluster
// ============================================================================

//! ## Overview
//! The verification task takes five operator-controlled parameters. A
//! [`ParamsProvider`] is consulted once per trigger, so edits to the backing
//! `ConfigMap` apply to the next run without a restart. Missing keys and a
//! missing `ConfigMap` both produce empty strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cluster::ClusterClient;
use crate::cluster::ClusterError;
use crate::tekton::Param;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default name of the parameter `ConfigMap`.
pub const PARAMS_CONFIG_MAP: &str = "enterprise-contract-conforma-params";
/// `IGNORE_REKOR` parameter key.
pub const PARAM_IGNORE_REKOR: &str = "IGNORE_REKOR";
/// `TIMEOUT` parameter key.
pub const PARAM_TIMEOUT: &str = "TIMEOUT";
/// `WORKERS` parameter key.
pub const PARAM_WORKERS: &str = "WORKERS";
/// `POLICY_CONFIGURATION` parameter key.
pub const PARAM_POLICY_CONFIGURATION: &str = "POLICY_CONFIGURATION";
/// `PUBLIC_KEY` parameter key.
pub const PARAM_PUBLIC_KEY: &str = "PUBLIC_KEY";

// ============================================================================
// SECTION: Parameter Set
// ============================================================================

/// Operator-controlled verification parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformaParams {
    /// Skip Rekor transparency log checks.
    pub ignore_rekor: String,
    /// Verification timeout passed to the task.
    pub timeout: String,
    /// Number of verification workers.
    pub workers: String,
    /// Policy configuration reference.
    pub policy_configuration: String,
    /// Public key used to verify signatures.
    pub public_key: String,
}

impl ConformaParams {
    /// Reads parameters from `ConfigMap` data; absent keys become empty strings.
    #[must_use]
    pub fn from_data(data: &BTreeMap<String, String>) -> Self {
        let value = |key: &str| data.get(key).cloned().unwrap_or_default();
        Self {
            ignore_rekor: value(PARAM_IGNORE_REKOR),
            timeout: value(PARAM_TIMEOUT),
            workers: value(PARAM_WORKERS),
            policy_configuration: value(PARAM_POLICY_CONFIGURATION),
            public_key: value(PARAM_PUBLIC_KEY),
        }
    }

    /// Task parameters in their canonical order.
    #[must_use]
    pub fn to_params(&self) -> Vec<Param> {
        vec![
            Param::string(PARAM_IGNORE_REKOR, self.ignore_rekor.clone()),
            Param::string(PARAM_TIMEOUT, self.timeout.clone()),
            Param::string(PARAM_WORKERS, self.workers.clone()),
            Param::string(PARAM_POLICY_CONFIGURATION, self.policy_configuration.clone()),
            Param::string(PARAM_PUBLIC_KEY, self.public_key.clone()),
        ]
    }
}

// ============================================================================
// SECTION: Providers
// ============================================================================

/// Source of verification parameters.
#[async_trait]
pub trait ParamsProvider: Send + Sync {
    /// Returns the parameters for the next verification run.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError`] when the backing store cannot be read.
    async fn params(&self) -> Result<ConformaParams, ClusterError>;
}

/// Reads parameters from a `ConfigMap` on every call.
pub struct ConfigMapParams {
    /// Cluster used to fetch the `ConfigMap`.
    cluster: Arc<dyn ClusterClient>,
    /// Namespace holding the `ConfigMap`.
    namespace: String,
    /// `ConfigMap` name.
    name: String,
}

impl ConfigMapParams {
    /// Creates a provider for the named `ConfigMap`.
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self { cluster, namespace: namespace.into(), name: name.into() }
    }
}

#[async_trait]
impl ParamsProvider for ConfigMapParams {
    async fn params(&self) -> Result<ConformaParams, ClusterError> {
        match self.cluster.get_config_map(&self.namespace, &self.name).await {
            Ok(Some(data)) => Ok(ConformaParams::from_data(&data)),
            Ok(None) | Err(ClusterError::NotFound(_)) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    config_map = %self.name,
                    "params config map not found; using empty values"
                );
                Ok(ConformaParams::default())
            }
            Err(err) => Err(err),
        }
    }
}

/// Fixed parameters.
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    /// Parameters returned on every call.
    params: ConformaParams,
}

impl StaticParams {
    /// Wraps a fixed parameter set.
    #[must_use]
    pub const fn new(params: ConformaParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl ParamsProvider for StaticParams {
    async fn params(&self) -> Result<ConformaParams, ClusterError> {
        Ok(self.params.clone())
    }
}
