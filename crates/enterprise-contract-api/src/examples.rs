// crates/enterprise-contract-api/src/examples.rs
// ============================================================================
// Module: Policy Examples
// Description: Canonical example policy documents.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: kube, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Canonical examples for the policy resource: a bare spec rendered as JSON
//! and a full Kubernetes manifest rendered as YAML. Outputs are deterministic
//! and kept in sync with the schema by the artifact tests.

use crate::artifacts::GenerationError;
use crate::policy::EnterpriseContractPolicy;
use crate::policy::EnterpriseContractPolicyExceptions;
use crate::policy::EnterpriseContractPolicySpec;
use crate::policy::Source;

/// File name of the JSON spec example.
pub const SPEC_EXAMPLE_FILE: &str = "spec-example.json";
/// File name of the Kubernetes manifest example.
pub const K8S_EXAMPLE_FILE: &str = "k8s-example.yaml";

/// Returns the canonical example policy spec.
#[must_use]
pub fn simple_policy() -> EnterpriseContractPolicySpec {
    EnterpriseContractPolicySpec {
        description: Some("ACME & co policy".to_string()),
        sources: vec![Source {
            name: Some("ACME policies".to_string()),
            policy: vec!["git::https://github.com/acme/ec-policy.git//policy?ref=prod".to_string()],
            ..Source::default()
        }],
        exceptions: Some(EnterpriseContractPolicyExceptions {
            non_blocking: vec!["friday_policy".to_string(), "room_temperature".to_string()],
        }),
        ..EnterpriseContractPolicySpec::default()
    }
}

/// Returns the canonical example resource, named `ec-policy` in namespace `acme`.
#[must_use]
pub fn simple_policy_resource() -> EnterpriseContractPolicy {
    let mut policy = EnterpriseContractPolicy::new("ec-policy", simple_policy());
    policy.metadata.namespace = Some("acme".to_string());
    policy
}

/// Renders the example spec as indented JSON with a trailing newline.
///
/// # Errors
///
/// Returns [`GenerationError::Serialization`] when encoding fails.
pub fn spec_example_json() -> Result<String, GenerationError> {
    let mut text = serde_json::to_string_pretty(&simple_policy())
        .map_err(|err| GenerationError::Serialization(err.to_string()))?;
    text.push('\n');
    Ok(text)
}

/// Renders the example resource as a Kubernetes YAML manifest.
///
/// # Errors
///
/// Returns [`GenerationError::Serialization`] when encoding fails.
pub fn k8s_example_yaml() -> Result<String, GenerationError> {
    serde_yaml::to_string(&simple_policy_resource())
        .map_err(|err| GenerationError::Serialization(err.to_string()))
}
