// crates/enterprise-contract-api/src/policy.rs
// ============================================================================
// Module: Enterprise Contract Policy Types
// Description: Custom resource model for EnterpriseContractPolicy.
// Purpose: Single source of truth for the policy wire format and CRD schema.
// Dependencies: kube, schemars, serde, serde_json
// ============================================================================

//! ## Overview
//! `EnterpriseContractPolicy` is a passive data resource: it describes where
//! policy rules come from, which checks are non-blocking, who authorized a
//! release, and how signatures are verified. The types carry no behavior; the
//! Kubernetes API server enforces the schema derived from them and an external
//! policy engine consumes them.
//!
//! Invariants:
//! - `sources` holds at least one entry (`minItems: 1`).
//! - `VolatileCriteria::image_url`, when present, matches [`IMAGE_URL_PATTERN`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use kube::CustomResource;
use schemars::gen::SchemaGenerator;
use schemars::schema::ArrayValidation;
use schemars::schema::InstanceType;
use schemars::schema::Schema;
use schemars::schema::SchemaObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// API group of the policy resource.
pub const GROUP: &str = "appstudio.redhat.com";
/// API version of the policy resource.
pub const VERSION: &str = "v1alpha1";
/// Kind of the policy resource.
pub const KIND: &str = "EnterpriseContractPolicy";
/// Plural resource name used in API paths.
pub const PLURAL: &str = "enterprisecontractpolicies";
/// Default Git revision for Git-backed sources.
pub const DEFAULT_GIT_REVISION: &str = "main";

/// Pattern for image repository URLs in volatile criteria.
///
/// Accepts `registry/org(/org)*/repo` with lowercase segments. Rejects a
/// scheme, a port, a tag or digest suffix, empty segments, a trailing slash,
/// and fewer than two path segments after the registry.
pub const IMAGE_URL_PATTERN: &str = r"^[a-z0-9]+(?:(?:\.|-+)[a-z0-9]+)*(?:/[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*){2,}$";

// ============================================================================
// SECTION: Policy Resource
// ============================================================================

/// Configuration of an Enterprise Contract policy.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "appstudio.redhat.com",
    version = "v1alpha1",
    kind = "EnterpriseContractPolicy",
    plural = "enterprisecontractpolicies",
    shortname = "ecp",
    category = "all",
    namespaced,
    status = "EnterpriseContractPolicyStatus",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseContractPolicySpec {
    /// Optional name of the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description of the policy or its intended use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sources of the policy, evaluated in order.
    #[schemars(length(min = 1))]
    pub sources: Vec<Source>,
    /// Authorization for per-component release approvals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
    /// Exceptions under which the policy passes even if listed checks fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<EnterpriseContractPolicyExceptions>,
    /// Policy-wide inclusion and exclusion of rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<EnterpriseContractPolicyConfiguration>,
    /// URL of the Rekor instance. Empty disables Rekor integration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rekor_url: Option<String>,
    /// Public key used to validate image and attestation signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Observed state of an `EnterpriseContractPolicy`.
///
/// Placeholder: the controller never writes status for policies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnterpriseContractPolicyStatus {}

// ============================================================================
// SECTION: Sources
// ============================================================================

/// A single source of policy rules and data.
///
/// A source is either Git-backed (`git`) or an inline bundle of policy/data
/// URLs, rule data, and rule selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Optional name for the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fetch policies from a Git repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitPolicySource>,
    /// Policy bundle URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy: Vec<String>,
    /// Data source URLs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
    /// Arbitrary rule data made visible to policy rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub rule_data: Option<Value>,
    /// Rule inclusion and exclusion for this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SourceConfig>,
    /// Time- and image-scoped rule selection for this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatile_config: Option<VolatileSourceConfig>,
}

/// Git repository holding policy rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitPolicySource {
    /// Repository URL.
    pub repository: String,
    /// Branch, tag, or commit to fetch.
    #[serde(default = "default_git_revision")]
    pub revision: String,
}

impl GitPolicySource {
    /// Creates a Git source tracking the default revision.
    #[must_use]
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            revision: default_git_revision(),
        }
    }
}

/// Rule selection applied to a single source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Rules or packages to exclude.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Rules or packages to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

/// Volatile rule selection: entries may expire or target specific images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolatileSourceConfig {
    /// Criteria for excluding rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<VolatileCriteria>,
    /// Criteria for including rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<VolatileCriteria>,
}

/// One volatile inclusion or exclusion entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolatileCriteria {
    /// Rule, package, or collection the entry applies to.
    pub value: String,
    /// RFC 3339 timestamp from which the entry applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_on: Option<String>,
    /// RFC 3339 timestamp after which the entry no longer applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_until: Option<String>,
    /// Image digest reference the entry is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Image repository URL the entry is scoped to, without tag or digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(regex = "IMAGE_URL_PATTERN")]
    pub image_url: Option<String>,
    /// Image digest the entry is scoped to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_digest: Option<String>,
    /// Free-form reference, e.g. an issue tracker link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

// ============================================================================
// SECTION: Authorization, Exceptions, Configuration
// ============================================================================

/// Release approvals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Component-based authorization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AuthorizedComponent>,
}

/// Release approval for one component change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedComponent {
    /// Identifier of the change, e.g. a git commit id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
    /// Repository of the component sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Email address of the person authorizing the release.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorizer: Option<String>,
}

/// Exceptions applied during policy evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseContractPolicyExceptions {
    /// Policy checks whose failure does not block the outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(schema_with = "string_set")]
    pub non_blocking: Vec<String>,
}

/// Policy-wide rule selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseContractPolicyConfiguration {
    /// Rules or packages to exclude.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    /// Rules or packages to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Named rule collections to include.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
}

// ============================================================================
// SECTION: Schema Helpers
// ============================================================================

/// Default revision for Git sources.
fn default_git_revision() -> String {
    DEFAULT_GIT_REVISION.to_string()
}

/// Schema for arbitrary JSON that the API server must keep verbatim.
fn preserve_unknown_fields(_generator: &mut SchemaGenerator) -> Schema {
    let mut schema = SchemaObject::default();
    schema.extensions.insert("x-kubernetes-preserve-unknown-fields".to_string(), Value::Bool(true));
    Schema::Object(schema)
}

/// Schema for a list of strings with set semantics.
fn string_set(_generator: &mut SchemaGenerator) -> Schema {
    let items = SchemaObject {
        instance_type: Some(InstanceType::String.into()),
        ..SchemaObject::default()
    };
    let mut schema = SchemaObject {
        instance_type: Some(InstanceType::Array.into()),
        array: Some(Box::new(ArrayValidation {
            items: Some(Schema::Object(items).into()),
            ..ArrayValidation::default()
        })),
        ..SchemaObject::default()
    };
    schema.extensions.insert("x-kubernetes-list-type".to_string(), Value::String("set".to_string()));
    Schema::Object(schema)
}
