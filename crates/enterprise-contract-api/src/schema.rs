// crates/enterprise-contract-api/src/schema.rs
// ============================================================================
// Module: Policy Schemas
// Description: CRD manifest and JSON schema builders for the policy resource.
// Purpose: Provide canonical schema artifacts derived from the Rust types.
// Dependencies: kube, schemars, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Two schema artifacts are derived from [`crate::policy`]:
//! - the `CustomResourceDefinition` manifest installed into clusters, and
//! - a standalone JSON schema of `EnterpriseContractPolicySpec` consumed by
//!   tooling that validates policy documents outside Kubernetes.
//!
//! Both are deterministic so generated files can be checked for drift.

use kube::CustomResourceExt;
use schemars::schema_for;
use serde_json::Value;

use crate::artifacts::GenerationError;
use crate::policy::EnterpriseContractPolicy;
use crate::policy::EnterpriseContractPolicySpec;

/// Default file name for the exported policy spec schema.
pub const POLICY_SPEC_SCHEMA_FILE: &str = "policy_spec.json";

/// Default file name for the CRD manifest.
pub const CRD_MANIFEST_FILE: &str = "appstudio.redhat.com_enterprisecontractpolicies.yaml";

/// Returns the CRD manifest as YAML.
///
/// # Errors
///
/// Returns [`GenerationError::Serialization`] when YAML encoding fails.
pub fn crd_yaml() -> Result<String, GenerationError> {
    serde_yaml::to_string(&EnterpriseContractPolicy::crd())
        .map_err(|err| GenerationError::Serialization(err.to_string()))
}

/// Returns the JSON schema of `EnterpriseContractPolicySpec`.
///
/// # Errors
///
/// Returns [`GenerationError::Serialization`] when the schema cannot be encoded.
pub fn policy_spec_schema() -> Result<Value, GenerationError> {
    serde_json::to_value(schema_for!(EnterpriseContractPolicySpec))
        .map_err(|err| GenerationError::Serialization(err.to_string()))
}

/// Returns the policy spec schema as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`GenerationError::Serialization`] when the schema cannot be encoded.
pub fn policy_spec_schema_json() -> Result<String, GenerationError> {
    let schema = policy_spec_schema()?;
    let mut text = serde_json::to_string_pretty(&schema)
        .map_err(|err| GenerationError::Serialization(err.to_string()))?;
    text.push('\n');
    Ok(text)
}
