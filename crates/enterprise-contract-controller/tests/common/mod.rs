// crates/enterprise-contract-controller/tests/common/mod.rs
// =============================================================================
// Module: Controller Test Helpers
// Description: PipelineRun fixtures and reconciler wiring for integration tests.
// Purpose: Reduce duplication across controller test suites.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::collections::BTreeMap;
use std::sync::Arc;

use enterprise_contract_controller::ClusterClient;
use enterprise_contract_controller::ConfigMapParams;
use enterprise_contract_controller::InMemoryCluster;
use enterprise_contract_controller::PipelineRun;
use enterprise_contract_controller::PipelineRunReconciler;
use enterprise_contract_controller::params::PARAMS_CONFIG_MAP;
use enterprise_contract_controller::tekton::Condition;
use enterprise_contract_controller::tekton::ParamValue;
use enterprise_contract_controller::tekton::PipelineRunResult;
use enterprise_contract_controller::tekton::PipelineRunSpec;
use enterprise_contract_controller::tekton::PipelineRunStatus;

/// Namespace holding fixture `PipelineRun`s.
pub const BUILD_NAMESPACE: &str = "builds";
/// Namespace the reconciler places `TaskRun`s in.
pub const CONTROLLER_NAMESPACE: &str = "enterprise-contract";
/// Image repository reported by fixture builds.
pub const IMAGE_URL: &str = "quay.io/acme/app";
/// Image digest reported by fixture builds.
pub const IMAGE_DIGEST: &str = "sha256:0123456789abcdef";

/// Builder for fixture `PipelineRun`s.
pub struct PipelineRunFixture {
    run: PipelineRun,
}

impl PipelineRunFixture {
    /// Unsigned run with no status.
    pub fn new(name: &str) -> Self {
        let mut run = PipelineRun::new(name, PipelineRunSpec::default());
        run.metadata.namespace = Some(BUILD_NAMESPACE.to_string());
        run.metadata.uid = Some(format!("uid-{name}"));
        Self { run }
    }

    /// Signed, succeeded run reporting both image results.
    pub fn ready(name: &str) -> Self {
        Self::new(name)
            .annotation("chains.tekton.dev/signed", "true")
            .succeeded("True")
            .result("IMAGE_URL", IMAGE_URL)
            .result("IMAGE_DIGEST", IMAGE_DIGEST)
    }

    pub fn annotation(mut self, key: &str, value: &str) -> Self {
        self.run
            .metadata
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn succeeded(mut self, status: &str) -> Self {
        self.status().conditions.push(Condition {
            type_: "Succeeded".to_string(),
            status: status.to_string(),
            reason: None,
            message: None,
        });
        self
    }

    pub fn result(mut self, name: &str, value: &str) -> Self {
        self.status().results.push(PipelineRunResult {
            name: name.to_string(),
            value: ParamValue::from(value),
        });
        self
    }

    fn status(&mut self) -> &mut PipelineRunStatus {
        self.run.status.get_or_insert_with(PipelineRunStatus::default)
    }

    pub fn build(self) -> PipelineRun {
        self.run
    }
}

/// Parameter data for the params `ConfigMap`.
pub fn params_data() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("IGNORE_REKOR".to_string(), "false".to_string()),
        ("TIMEOUT".to_string(), "60m".to_string()),
        ("WORKERS".to_string(), "4".to_string()),
        ("POLICY_CONFIGURATION".to_string(), "enterprise-contract/default".to_string()),
        ("PUBLIC_KEY".to_string(), "k8s://openshift-pipelines/public-key".to_string()),
    ])
}

/// Reconciler wired to `cluster` with `ConfigMap`-backed params.
pub fn reconciler(cluster: &Arc<InMemoryCluster>) -> PipelineRunReconciler {
    let client: Arc<dyn ClusterClient> = Arc::clone(cluster) as Arc<dyn ClusterClient>;
    let params = Arc::new(ConfigMapParams::new(
        Arc::clone(&client),
        CONTROLLER_NAMESPACE,
        PARAMS_CONFIG_MAP,
    ));
    PipelineRunReconciler::new(client, params, CONTROLLER_NAMESPACE)
}

/// Cluster seeded with the params `ConfigMap` and the given runs.
pub fn cluster_with(runs: Vec<PipelineRun>) -> Arc<InMemoryCluster> {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.insert_config_map(CONTROLLER_NAMESPACE, PARAMS_CONFIG_MAP, params_data());
    for run in runs {
        cluster.insert_pipeline_run(run);
    }
    cluster
}
