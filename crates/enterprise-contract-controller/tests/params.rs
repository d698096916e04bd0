// crates/enterprise-contract-controller/tests/params.rs
// =============================================================================
// Module: Params Provider Tests
// Description: ConfigMap and static parameter sources.
// Purpose: Ensure missing data degrades to empty values and API errors surface.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::CONTROLLER_NAMESPACE;
use common::params_data;
use enterprise_contract_controller::ClusterClient;
use enterprise_contract_controller::ClusterError;
use enterprise_contract_controller::ClusterOperation;
use enterprise_contract_controller::ConfigMapParams;
use enterprise_contract_controller::ConformaParams;
use enterprise_contract_controller::InMemoryCluster;
use enterprise_contract_controller::ParamsProvider;
use enterprise_contract_controller::StaticParams;
use enterprise_contract_controller::params::PARAMS_CONFIG_MAP;

fn provider(cluster: &Arc<InMemoryCluster>) -> ConfigMapParams {
    let client: Arc<dyn ClusterClient> = Arc::clone(cluster) as Arc<dyn ClusterClient>;
    ConfigMapParams::new(client, CONTROLLER_NAMESPACE, PARAMS_CONFIG_MAP)
}

#[tokio::test]
async fn config_map_values_are_read() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.insert_config_map(CONTROLLER_NAMESPACE, PARAMS_CONFIG_MAP, params_data());
    let params = provider(&cluster).params().await.unwrap();
    assert_eq!(params.ignore_rekor, "false");
    assert_eq!(params.timeout, "60m");
    assert_eq!(params.workers, "4");
    assert_eq!(params.policy_configuration, "enterprise-contract/default");
    assert_eq!(params.public_key, "k8s://openshift-pipelines/public-key");
}

#[tokio::test]
async fn missing_config_map_yields_empty_values() {
    let cluster = Arc::new(InMemoryCluster::new());
    let params = provider(&cluster).params().await.unwrap();
    assert_eq!(params, ConformaParams::default());
}

#[tokio::test]
async fn missing_keys_yield_empty_values() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.insert_config_map(
        CONTROLLER_NAMESPACE,
        PARAMS_CONFIG_MAP,
        BTreeMap::from([("WORKERS".to_string(), "8".to_string())]),
    );
    let params = provider(&cluster).params().await.unwrap();
    assert_eq!(params.workers, "8");
    assert_eq!(params.public_key, "");
    assert_eq!(params.ignore_rekor, "");
}

#[tokio::test]
async fn config_map_in_other_namespace_is_ignored() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.insert_config_map("elsewhere", PARAMS_CONFIG_MAP, params_data());
    let params = provider(&cluster).params().await.unwrap();
    assert_eq!(params, ConformaParams::default());
}

#[tokio::test]
async fn edits_apply_to_the_next_read() {
    let cluster = Arc::new(InMemoryCluster::new());
    let provider = provider(&cluster);
    assert_eq!(provider.params().await.unwrap().workers, "");
    cluster.insert_config_map(CONTROLLER_NAMESPACE, PARAMS_CONFIG_MAP, params_data());
    assert_eq!(provider.params().await.unwrap().workers, "4");
}

#[tokio::test]
async fn api_errors_surface() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.inject_fault(ClusterOperation::GetConfigMap, ClusterError::Api("forbidden".to_string()));
    let err = provider(&cluster).params().await.unwrap_err();
    assert_eq!(err, ClusterError::Api("forbidden".to_string()));
}

#[tokio::test]
async fn not_found_errors_degrade_to_empty_values() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.inject_fault(ClusterOperation::GetConfigMap, ClusterError::NotFound("configmap".to_string()));
    assert_eq!(provider(&cluster).params().await.unwrap(), ConformaParams::default());
}

#[tokio::test]
async fn static_params_are_returned_verbatim() {
    let fixed = ConformaParams { workers: "2".to_string(), ..ConformaParams::default() };
    let params = StaticParams::new(fixed.clone()).params().await.unwrap();
    assert_eq!(params, fixed);
}

#[test]
fn params_render_in_canonical_order() {
    let params = ConformaParams::from_data(&params_data());
    let names: Vec<String> = params.to_params().into_iter().map(|param| param.name).collect();
    assert_eq!(names, vec!["IGNORE_REKOR", "TIMEOUT", "WORKERS", "POLICY_CONFIGURATION", "PUBLIC_KEY"]);
}
