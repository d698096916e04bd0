// crates/enterprise-contract-controller/src/config/schema.rs
// ============================================================================
// Module: Config Schema
// Description: JSON schema for enterprise-contract.toml.
// Purpose: Provide a canonical validation schema for config artifacts.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Hand-written JSON Schema mirroring [`super::ControllerConfig`]. Bounds and
//! defaults come from the same constants the loader enforces.

use serde_json::Value;
use serde_json::json;

use super::DEFAULT_LOG_FILTER;
use super::DEFAULT_PERMANENT_REQUEUE_SECS;
use super::DEFAULT_TRANSIENT_REQUEUE_SECS;
use super::MAX_CONFIG_MAP_NAME_LENGTH;
use super::MAX_NAMESPACE_LENGTH;
use super::MAX_REQUEUE_SECS;
use crate::params::PARAMS_CONFIG_MAP;

/// Pattern for lowercase RFC 1123 names.
const DNS_NAME_PATTERN: &str = "^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$";
/// RFC 1123 label; namespaces carry no dots.
const DNS_LABEL_PATTERN: &str = "^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Returns the JSON schema for `enterprise-contract.toml`.
#[must_use]
pub fn config_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "enterprise-contract://schemas/config.schema.json",
        "title": "Enterprise Contract Controller Configuration",
        "type": "object",
        "properties": {
            "controller": controller_schema(),
            "logging": logging_schema()
        },
        "additionalProperties": false
    })
}

fn controller_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "namespace": {
                "type": "string",
                "pattern": DNS_LABEL_PATTERN,
                "maxLength": MAX_NAMESPACE_LENGTH,
                "description": "Namespace for verification TaskRuns; defaults to the pod namespace."
            },
            "params_config_map": {
                "type": "string",
                "pattern": DNS_NAME_PATTERN,
                "maxLength": MAX_CONFIG_MAP_NAME_LENGTH,
                "default": PARAMS_CONFIG_MAP
            },
            "transient_requeue_secs": requeue_schema(DEFAULT_TRANSIENT_REQUEUE_SECS),
            "permanent_requeue_secs": requeue_schema(DEFAULT_PERMANENT_REQUEUE_SECS)
        },
        "additionalProperties": false
    })
}

fn requeue_schema(default: u64) -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "maximum": MAX_REQUEUE_SECS,
        "default": default
    })
}

fn logging_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "format": { "type": "string", "enum": ["text", "json"], "default": "text" },
            "filter": { "type": "string", "minLength": 1, "default": DEFAULT_LOG_FILTER }
        },
        "additionalProperties": false
    })
}
