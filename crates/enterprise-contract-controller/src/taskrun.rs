// crates/enterprise-contract-controller/src/taskrun.rs
// ============================================================================
// Module: Verification TaskRun
// Description: Builds the TaskRun that verifies a PipelineRun's image.
// Purpose: Keep TaskRun shape, naming, and image extraction deterministic.
// Dependencies: sha2, serde_json, crate::tekton
// ============================================================================

//! ## Overview
//! The verification `TaskRun` resolves its task from git and receives the
//! built image as a one-component snapshot. Its name is a pure function of the
//! `PipelineRun` identity, so a retried trigger collides with the earlier
//! create instead of producing a second run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use kube::api::ObjectMeta;
use serde_json::json;
use sha2::Digest;
use sha2::Sha256;

use crate::params::ConformaParams;
use crate::reconciler::ReconcileError;
use crate::state::source_data_artifact;
use crate::tekton::Param;
use crate::tekton::PipelineRun;
use crate::tekton::TaskRef;
use crate::tekton::TaskRun;
use crate::tekton::TaskRunSpec;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix shared by every verification `TaskRun` name.
pub const TASK_RUN_NAME_PREFIX: &str = "conforma-verify-";
/// Kubernetes label-compatible name length limit.
pub const MAX_TASK_RUN_NAME_LEN: usize = 63;
/// Hex characters of the identity digest kept in the name.
const NAME_HASH_LEN: usize = 16;

/// Resolver used to fetch the verification task.
pub const TASK_RESOLVER: &str = "git";
/// Repository holding the verification task.
pub const TASK_REPOSITORY_URL: &str = "https://github.com/enterprise-contract/ec-cli";
/// Repository revision of the verification task.
pub const TASK_REVISION: &str = "main";
/// Task definition path inside the repository.
pub const TASK_PATH_IN_REPO: &str =
    "tasks/verify-enterprise-contract/0.1/verify-enterprise-contract.yaml";
/// Verification timeout.
pub const TASK_RUN_TIMEOUT: &str = "10m0s";

/// Label identifying the creator of the `TaskRun`.
pub const LABEL_CREATED_BY: &str = "app.kubernetes.io/created-by";
/// Value of [`LABEL_CREATED_BY`].
pub const CREATED_BY: &str = "enterprise-contract-controller";
/// Label naming the originating `PipelineRun`.
pub const LABEL_PIPELINE_RUN: &str = "enterprise-contract.redhat.com/pipelinerun";
/// Label carrying the UID of the originating `PipelineRun`.
pub const LABEL_PIPELINE_RUN_UID: &str = "enterprise-contract.redhat.com/pipelinerun-uid";

/// `PipelineRun` result holding the image repository.
pub const RESULT_IMAGE_URL: &str = "IMAGE_URL";
/// `PipelineRun` result holding the image digest.
pub const RESULT_IMAGE_DIGEST: &str = "IMAGE_DIGEST";

/// Snapshot parameter name.
pub const PARAM_IMAGES: &str = "IMAGES";
/// Source-data artifact parameter name.
pub const PARAM_SOURCE_DATA_ARTIFACT: &str = "SOURCE_DATA_ARTIFACT";

// ============================================================================
// SECTION: Image Reference
// ============================================================================

/// Image built by a `PipelineRun`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Repository URL without tag or digest.
    pub url: String,
    /// Content digest, e.g. `sha256:...`.
    pub digest: String,
}

impl ImageReference {
    /// Extracts the image from the `IMAGE_URL` and `IMAGE_DIGEST` results.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingResult`] for the first absent or empty result.
    pub fn from_pipeline_run(pipeline_run: &PipelineRun) -> Result<Self, ReconcileError> {
        let missing = |result: &str| ReconcileError::MissingResult {
            result: result.to_string(),
            pipeline_run: pipeline_run.metadata.name.clone().unwrap_or_default(),
        };
        let url = pipeline_run.string_result(RESULT_IMAGE_URL).ok_or_else(|| missing(RESULT_IMAGE_URL))?;
        let digest =
            pipeline_run.string_result(RESULT_IMAGE_DIGEST).ok_or_else(|| missing(RESULT_IMAGE_DIGEST))?;
        Ok(Self { url: url.to_string(), digest: digest.to_string() })
    }

    /// Digest-pinned reference, `<url>@<digest>`.
    #[must_use]
    pub fn container_image(&self) -> String {
        format!("{}@{}", self.url, self.digest)
    }

    /// One-component snapshot document passed as `IMAGES`.
    #[must_use]
    pub fn snapshot_json(&self) -> String {
        json!({
            "components": [
                { "name": self.url, "containerImage": self.container_image() }
            ]
        })
        .to_string()
    }
}

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Deterministic `TaskRun` name for a `PipelineRun`.
///
/// The digest covers the UID when present and `namespace/name` otherwise, so
/// recreated runs with the same name get a fresh `TaskRun`.
#[must_use]
pub fn task_run_name(pipeline_run: &PipelineRun) -> String {
    let name = pipeline_run.metadata.name.as_deref().unwrap_or_default();
    let identity = match pipeline_run_uid(pipeline_run) {
        Some(uid) => uid.to_string(),
        None => format!("{}/{name}", pipeline_run.metadata.namespace.as_deref().unwrap_or_default()),
    };
    let digest = Sha256::digest(identity.as_bytes());
    let hash: String =
        digest.iter().take(NAME_HASH_LEN / 2).map(|byte| format!("{byte:02x}")).collect();

    let budget = MAX_TASK_RUN_NAME_LEN - TASK_RUN_NAME_PREFIX.len() - NAME_HASH_LEN - 1;
    let stem: String = name.chars().take(budget).collect();
    let stem = stem.trim_end_matches(|ch: char| !ch.is_ascii_alphanumeric());
    if stem.is_empty() {
        format!("{TASK_RUN_NAME_PREFIX}{hash}")
    } else {
        format!("{TASK_RUN_NAME_PREFIX}{stem}-{hash}")
    }
}

/// Returns true when `task_run` was built for `pipeline_run`.
///
/// Ownership is read from the originating name and UID labels. A `TaskRun`
/// whose name merely collides with the expected one does not match.
#[must_use]
pub fn is_owned_by(task_run: &TaskRun, pipeline_run: &PipelineRun) -> bool {
    let label = |key: &str| {
        task_run.metadata.labels.as_ref().and_then(|labels| labels.get(key)).map(String::as_str)
    };
    label(LABEL_PIPELINE_RUN) == pipeline_run.metadata.name.as_deref()
        && label(LABEL_PIPELINE_RUN_UID) == pipeline_run_uid(pipeline_run)
}

fn pipeline_run_uid(pipeline_run: &PipelineRun) -> Option<&str> {
    pipeline_run.metadata.uid.as_deref().filter(|uid| !uid.is_empty())
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the verification `TaskRun` for `pipeline_run` in `namespace`.
#[must_use]
pub fn build_task_run(
    pipeline_run: &PipelineRun,
    image: &ImageReference,
    params: &ConformaParams,
    namespace: &str,
) -> TaskRun {
    let pipeline_run_name = pipeline_run.metadata.name.clone().unwrap_or_default();
    let mut labels = BTreeMap::from([
        (LABEL_CREATED_BY.to_string(), CREATED_BY.to_string()),
        (LABEL_PIPELINE_RUN.to_string(), pipeline_run_name),
    ]);
    if let Some(uid) = pipeline_run_uid(pipeline_run) {
        labels.insert(LABEL_PIPELINE_RUN_UID.to_string(), uid.to_string());
    }

    let mut task_params = vec![Param::string(PARAM_IMAGES, image.snapshot_json())];
    task_params.extend(params.to_params());
    if let Some(artifact) = source_data_artifact(pipeline_run) {
        task_params.push(Param::string(PARAM_SOURCE_DATA_ARTIFACT, artifact));
    }

    TaskRun {
        metadata: ObjectMeta {
            name: Some(task_run_name(pipeline_run)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..ObjectMeta::default()
        },
        spec: TaskRunSpec {
            task_ref: Some(TaskRef {
                name: None,
                resolver: Some(TASK_RESOLVER.to_string()),
                params: vec![
                    Param::string("url", TASK_REPOSITORY_URL),
                    Param::string("revision", TASK_REVISION),
                    Param::string("pathInRepo", TASK_PATH_IN_REPO),
                ],
            }),
            params: task_params,
            timeout: Some(TASK_RUN_TIMEOUT.to_string()),
        },
    }
}
