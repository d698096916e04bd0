// crates/enterprise-contract-api/src/validation.rs
// ============================================================================
// Module: Policy Validation
// Description: Validates policy documents against the generated CRD schema.
// Purpose: Apply the same structural checks the API server applies, offline.
// Dependencies: jsonschema, kube, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The CRD's `openAPIV3Schema` is generated from the Rust types in
//! [`crate::policy`]. [`PolicyValidator`] compiles that schema once and checks
//! policy documents against it, so CLI tooling and tests reject the same
//! inputs the API server would (missing sources, malformed image URLs).

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use jsonschema::Validator;
use kube::CustomResourceExt;
use serde_json::Value;
use thiserror::Error;

use crate::policy::EnterpriseContractPolicy;
use crate::policy::EnterpriseContractPolicySpec;
use crate::policy::VERSION;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while validating policy documents.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The generated CRD has no schema for the served version.
    #[error("crd schema unavailable: {0}")]
    SchemaUnavailable(String),
    /// The generated schema failed to compile.
    #[error("invalid crd schema: {0}")]
    InvalidSchema(String),
    /// The document could not be converted to JSON.
    #[error("policy serialization failed: {0}")]
    Serialization(String),
    /// The document violates the schema.
    #[error("policy rejected: {}", .0.join("; "))]
    Rejected(Vec<String>),
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Schema validator for `EnterpriseContractPolicy` documents.
pub struct PolicyValidator {
    /// Compiled `openAPIV3Schema` of the served version.
    validator: Validator,
}

impl PolicyValidator {
    /// Compiles the validator from the generated CRD.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the CRD schema is missing or invalid.
    pub fn new() -> Result<Self, ValidationError> {
        let schema = crd_openapi_schema()?;
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|err| ValidationError::InvalidSchema(err.to_string()))?;
        Ok(Self {
            validator,
        })
    }

    /// Validates a full resource document (`apiVersion`, `kind`, `metadata`, `spec`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Rejected`] listing every violation.
    pub fn validate_value(&self, document: &Value) -> Result<(), ValidationError> {
        let violations: Vec<String> =
            self.validator.iter_errors(document).map(|err| err.to_string()).collect();
        if violations.is_empty() { Ok(()) } else { Err(ValidationError::Rejected(violations)) }
    }

    /// Validates a typed policy resource.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when serialization fails or the policy is rejected.
    pub fn validate(&self, policy: &EnterpriseContractPolicy) -> Result<(), ValidationError> {
        let document = serde_json::to_value(policy)
            .map_err(|err| ValidationError::Serialization(err.to_string()))?;
        self.validate_value(&document)
    }

    /// Validates a bare policy spec by wrapping it in a resource envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when serialization fails or the policy is rejected.
    pub fn validate_spec(&self, spec: &EnterpriseContractPolicySpec) -> Result<(), ValidationError> {
        self.validate(&EnterpriseContractPolicy::new("validation", spec.clone()))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the `openAPIV3Schema` of the served CRD version as JSON.
///
/// # Errors
///
/// Returns [`ValidationError::SchemaUnavailable`] when the CRD lacks a schema.
pub fn crd_openapi_schema() -> Result<Value, ValidationError> {
    let crd = EnterpriseContractPolicy::crd();
    let version = crd
        .spec
        .versions
        .iter()
        .find(|candidate| candidate.name == VERSION)
        .ok_or_else(|| ValidationError::SchemaUnavailable(format!("version {VERSION} missing")))?;
    let schema = version
        .schema
        .as_ref()
        .and_then(|validation| validation.open_api_v3_schema.as_ref())
        .ok_or_else(|| ValidationError::SchemaUnavailable("openAPIV3Schema missing".to_string()))?;
    serde_json::to_value(schema).map_err(|err| ValidationError::Serialization(err.to_string()))
}
