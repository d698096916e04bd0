// crates/enterprise-contract-controller/tests/reconcile.rs
// =============================================================================
// Module: Reconcile Tests
// Description: End-to-end reconciliation against the in-memory cluster.
// Purpose: Ensure triggers happen exactly once and only for ready runs.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use common::BUILD_NAMESPACE;
use common::CONTROLLER_NAMESPACE;
use common::IMAGE_DIGEST;
use common::IMAGE_URL;
use common::PipelineRunFixture;
use common::cluster_with;
use common::reconciler;
use enterprise_contract_controller::ClusterError;
use enterprise_contract_controller::ConformaParams;
use enterprise_contract_controller::ImageReference;
use enterprise_contract_controller::ClusterOperation;
use enterprise_contract_controller::InMemoryCluster;
use enterprise_contract_controller::Outcome;
use enterprise_contract_controller::ReconcileError;
use enterprise_contract_controller::state::ANNOTATION_VSA_COMPLETE;
use enterprise_contract_controller::state::is_complete;
use enterprise_contract_controller::taskrun::build_task_run;
use enterprise_contract_controller::taskrun::task_run_name;
use serde_json::Value;
use serde_json::json;

fn assert_untouched(cluster: &InMemoryCluster, name: &str) {
    assert!(cluster.task_runs().is_empty(), "no task run expected");
    assert_eq!(cluster.calls(ClusterOperation::CreateTaskRun), 0);
    assert_eq!(cluster.calls(ClusterOperation::AnnotatePipelineRun), 0);
    let run = cluster.pipeline_run(BUILD_NAMESPACE, name).unwrap();
    assert!(!is_complete(&run));
}

// ============================================================================
// SECTION: No-Op States
// ============================================================================

#[tokio::test]
async fn missing_pipeline_run_is_success() {
    let cluster = cluster_with(Vec::new());
    let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "gone").await.unwrap();
    assert_eq!(outcome, Outcome::NotFound);
    assert!(cluster.task_runs().is_empty());
}

#[tokio::test]
async fn unsigned_run_is_skipped() {
    let run = PipelineRunFixture::new("build")
        .succeeded("True")
        .result("IMAGE_URL", IMAGE_URL)
        .result("IMAGE_DIGEST", IMAGE_DIGEST)
        .build();
    let cluster = cluster_with(vec![run]);
    let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::Pending);
    assert_untouched(&cluster, "build");
}

#[tokio::test]
async fn signed_annotation_must_be_exactly_true() {
    for value in ["false", "True", "", "yes"] {
        let run = PipelineRunFixture::new("build")
            .annotation("chains.tekton.dev/signed", value)
            .succeeded("True")
            .build();
        let cluster = cluster_with(vec![run]);
        let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
        assert_eq!(outcome, Outcome::Pending, "signed={value:?}");
        assert_untouched(&cluster, "build");
    }
}

#[tokio::test]
async fn unsucceeded_run_is_skipped() {
    for status in ["False", "Unknown", "true"] {
        let run = PipelineRunFixture::new("build")
            .annotation("chains.tekton.dev/signed", "true")
            .succeeded(status)
            .build();
        let cluster = cluster_with(vec![run]);
        let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
        assert_eq!(outcome, Outcome::Pending, "succeeded={status:?}");
        assert_untouched(&cluster, "build");
    }
}

#[tokio::test]
async fn run_without_conditions_is_skipped() {
    let run = PipelineRunFixture::new("build").annotation("chains.tekton.dev/signed", "true").build();
    let cluster = cluster_with(vec![run]);
    let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::Pending);
}

#[tokio::test]
async fn completed_run_is_skipped_regardless_of_predicates() {
    let run = PipelineRunFixture::new("build").annotation(ANNOTATION_VSA_COMPLETE, "true").build();
    let cluster = cluster_with(vec![run]);
    let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::AlreadyComplete);
    assert!(cluster.task_runs().is_empty());
    assert_eq!(cluster.calls(ClusterOperation::AnnotatePipelineRun), 0);
}

// ============================================================================
// SECTION: Trigger
// ============================================================================

#[tokio::test]
async fn ready_run_triggers_one_task_run_and_is_marked() {
    let run = PipelineRunFixture::new("build")
        .annotation("chains.tekton.dev/signed", "true")
        .succeeded("True")
        .result("IMAGE_URL", "quay.io/test/image")
        .result("IMAGE_DIGEST", "sha256:1234567890")
        .build();
    let expected_name = task_run_name(&run);
    let cluster = cluster_with(vec![run]);

    let outcome = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::Triggered { task_run: expected_name.clone(), created: true });

    let task_runs = cluster.task_runs();
    assert_eq!(task_runs.len(), 1);
    let task_run = &task_runs[0];
    assert_eq!(task_run.metadata.name.as_deref(), Some(expected_name.as_str()));
    assert_eq!(task_run.metadata.namespace.as_deref(), Some(CONTROLLER_NAMESPACE));
    let images: Value = serde_json::from_str(task_run.param("IMAGES").unwrap()).unwrap();
    assert_eq!(
        images,
        json!({ "components": [{
            "name": "quay.io/test/image",
            "containerImage": "quay.io/test/image@sha256:1234567890"
        }] })
    );

    let marked = cluster.pipeline_run(BUILD_NAMESPACE, "build").unwrap();
    assert!(is_complete(&marked));
}

#[tokio::test]
async fn task_run_carries_config_map_params() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    let task_run = &cluster.task_runs()[0];
    assert_eq!(task_run.param("IGNORE_REKOR"), Some("false"));
    assert_eq!(task_run.param("TIMEOUT"), Some("60m"));
    assert_eq!(task_run.param("WORKERS"), Some("4"));
    assert_eq!(task_run.param("POLICY_CONFIGURATION"), Some("enterprise-contract/default"));
    assert_eq!(task_run.param("PUBLIC_KEY"), Some("k8s://openshift-pipelines/public-key"));
    assert_eq!(task_run.param("SOURCE_DATA_ARTIFACT"), None);
}

#[tokio::test]
async fn missing_config_map_yields_empty_params() {
    let cluster = Arc::new(InMemoryCluster::new());
    cluster.insert_pipeline_run(PipelineRunFixture::ready("build").build());
    reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    let task_run = &cluster.task_runs()[0];
    for key in ["IGNORE_REKOR", "TIMEOUT", "WORKERS", "POLICY_CONFIGURATION", "PUBLIC_KEY"] {
        assert_eq!(task_run.param(key), Some(""), "{key}");
    }
}

#[tokio::test]
async fn source_data_annotation_is_forwarded() {
    let run = PipelineRunFixture::ready("build")
        .annotation("conforma/source-data", "oci://quay.io/acme/source@sha256:feed")
        .build();
    let cluster = cluster_with(vec![run]);
    reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    let task_run = &cluster.task_runs()[0];
    assert_eq!(task_run.param("SOURCE_DATA_ARTIFACT"), Some("oci://quay.io/acme/source@sha256:feed"));
}

// ============================================================================
// SECTION: Missing Results
// ============================================================================

#[tokio::test]
async fn missing_image_url_fails_without_task_run() {
    let run = PipelineRunFixture::new("build")
        .annotation("chains.tekton.dev/signed", "true")
        .succeeded("True")
        .result("IMAGE_DIGEST", IMAGE_DIGEST)
        .build();
    let cluster = cluster_with(vec![run]);
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(err.to_string().contains("IMAGE_URL result not found"), "{err}");
    assert!(err.is_permanent());
    assert_untouched(&cluster, "build");
}

#[tokio::test]
async fn missing_image_digest_fails_without_task_run() {
    let run = PipelineRunFixture::new("build")
        .annotation("chains.tekton.dev/signed", "true")
        .succeeded("True")
        .result("IMAGE_URL", IMAGE_URL)
        .build();
    let cluster = cluster_with(vec![run]);
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert_eq!(
        err,
        ReconcileError::MissingResult {
            result: "IMAGE_DIGEST".to_string(),
            pipeline_run: "build".to_string(),
        }
    );
    assert_eq!(err.to_string(), "IMAGE_DIGEST result not found in PipelineRun build");
    assert_untouched(&cluster, "build");
}

// ============================================================================
// SECTION: Idempotence
// ============================================================================

#[tokio::test]
async fn second_reconcile_creates_nothing() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    let reconciler = reconciler(&cluster);
    reconciler.reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    let outcome = reconciler.reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::AlreadyComplete);
    assert_eq!(cluster.task_runs().len(), 1);
    assert_eq!(cluster.calls(ClusterOperation::CreateTaskRun), 1);
}

#[tokio::test]
async fn retry_after_failed_mark_reuses_existing_task_run() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    let reconciler = reconciler(&cluster);
    cluster.inject_fault(ClusterOperation::AnnotatePipelineRun, ClusterError::Api("timeout".to_string()));

    let err = reconciler.reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(!err.is_permanent());
    assert_eq!(cluster.task_runs().len(), 1);
    assert!(!is_complete(&cluster.pipeline_run(BUILD_NAMESPACE, "build").unwrap()));

    cluster.clear_faults();
    let outcome = reconciler.reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert!(matches!(outcome, Outcome::Triggered { created: false, .. }));
    assert_eq!(cluster.calls(ClusterOperation::GetTaskRun), 1);
    assert_eq!(cluster.task_runs().len(), 1);
    assert!(is_complete(&cluster.pipeline_run(BUILD_NAMESPACE, "build").unwrap()));
}

#[tokio::test]
async fn task_run_name_held_by_other_run_is_a_conflict() {
    let run = PipelineRunFixture::ready("build").build();
    let mut other = run.clone();
    other.metadata.uid = Some("uid-other-build".to_string());
    let image = ImageReference { url: IMAGE_URL.to_string(), digest: IMAGE_DIGEST.to_string() };
    let mut squatter = build_task_run(&other, &image, &ConformaParams::default(), CONTROLLER_NAMESPACE);
    squatter.metadata.name = Some(task_run_name(&run));

    let cluster = cluster_with(vec![run]);
    cluster.insert_task_run(squatter);
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();

    assert!(matches!(err, ReconcileError::TaskRunConflict { .. }), "{err:?}");
    assert!(err.is_permanent());
    assert_eq!(cluster.task_runs().len(), 1);
    assert_eq!(cluster.calls(ClusterOperation::AnnotatePipelineRun), 0);
    assert!(!is_complete(&cluster.pipeline_run(BUILD_NAMESPACE, "build").unwrap()));
}

#[tokio::test]
async fn conflict_without_visible_task_run_is_transient() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    cluster.inject_fault(
        ClusterOperation::CreateTaskRun,
        ClusterError::AlreadyExists("taskruns.tekton.dev already exists".to_string()),
    );
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Cluster(ClusterError::NotFound(_))), "{err:?}");
    assert!(!err.is_permanent());
    assert_eq!(cluster.calls(ClusterOperation::GetTaskRun), 1);
    assert_eq!(cluster.calls(ClusterOperation::AnnotatePipelineRun), 0);
}

#[tokio::test]
async fn distinct_runs_get_distinct_task_runs() {
    let cluster = cluster_with(vec![
        PipelineRunFixture::ready("build-a").build(),
        PipelineRunFixture::ready("build-b").build(),
    ]);
    let reconciler = reconciler(&cluster);
    reconciler.reconcile(BUILD_NAMESPACE, "build-a").await.unwrap();
    reconciler.reconcile(BUILD_NAMESPACE, "build-b").await.unwrap();
    assert_eq!(cluster.task_runs().len(), 2);
}

// ============================================================================
// SECTION: Cluster Failures
// ============================================================================

#[tokio::test]
async fn fetch_failure_is_transient() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    cluster.inject_fault(ClusterOperation::GetPipelineRun, ClusterError::Api("unavailable".to_string()));
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert_eq!(err, ReconcileError::Cluster(ClusterError::Api("unavailable".to_string())));
    assert!(!err.is_permanent());
}

#[tokio::test]
async fn create_failure_leaves_run_unmarked() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    cluster.inject_fault(ClusterOperation::CreateTaskRun, ClusterError::Api("forbidden".to_string()));
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Cluster(_)));
    assert!(cluster.task_runs().is_empty());
    assert_eq!(cluster.calls(ClusterOperation::AnnotatePipelineRun), 0);
    assert!(!is_complete(&cluster.pipeline_run(BUILD_NAMESPACE, "build").unwrap()));
}

#[tokio::test]
async fn config_map_read_failure_prevents_trigger() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    cluster.inject_fault(ClusterOperation::GetConfigMap, ClusterError::Api("forbidden".to_string()));
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Cluster(ClusterError::Api(_))));
    assert_eq!(cluster.calls(ClusterOperation::CreateTaskRun), 0);
}

#[tokio::test]
async fn run_removed_between_reconciles_is_not_found() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    let reconciler = reconciler(&cluster);
    cluster.remove_pipeline_run(BUILD_NAMESPACE, "build");
    let outcome = reconciler.reconcile(BUILD_NAMESPACE, "build").await.unwrap();
    assert_eq!(outcome, Outcome::NotFound);
    assert!(cluster.task_runs().is_empty());
}

#[tokio::test]
async fn run_deleted_before_mark_surfaces_error() {
    let cluster = cluster_with(vec![PipelineRunFixture::ready("build").build()]);
    cluster.inject_fault(
        ClusterOperation::AnnotatePipelineRun,
        ClusterError::NotFound("pipelineruns.tekton.dev \"build\" not found".to_string()),
    );
    let err = reconciler(&cluster).reconcile(BUILD_NAMESPACE, "build").await.unwrap_err();
    assert!(matches!(err, ReconcileError::Cluster(ClusterError::NotFound(_))));
    assert_eq!(cluster.task_runs().len(), 1);
}
