// crates/enterprise-contract-api/src/lib.rs
// ============================================================================
// Module: Enterprise Contract API Library
// Description: Policy resource model, validation, and artifact generation.
// Purpose: Single source of truth for the EnterpriseContractPolicy CRD.
// Dependencies: jsonschema, kube, schemars, serde
// ============================================================================

//! ## Overview
//! `enterprise-contract-api` defines the `EnterpriseContractPolicy` custom
//! resource (`appstudio.redhat.com/v1alpha1`). The CRD manifest, the exported
//! JSON schema, and the docs examples are all generated from these types, and
//! [`PolicyValidator`] checks documents against the same schema the API server
//! enforces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod artifacts;
pub mod examples;
pub mod policy;
pub mod schema;
pub mod validation;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use artifacts::Artifact;
pub use artifacts::ArtifactSet;
pub use artifacts::GenerationError;
pub use artifacts::crd_artifacts;
pub use artifacts::example_artifacts;
pub use artifacts::schema_artifacts;
pub use policy::*;
pub use schema::crd_yaml;
pub use schema::policy_spec_schema;
pub use validation::PolicyValidator;
pub use validation::ValidationError;
