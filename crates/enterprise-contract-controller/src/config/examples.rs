// crates/enterprise-contract-controller/src/config/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example controller configuration.
// Purpose: Deterministic example for docs and tooling.
// Dependencies: std
// ============================================================================

/// Returns a canonical example `enterprise-contract.toml`.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[controller]
# namespace = "enterprise-contract"
params_config_map = "enterprise-contract-conforma-params"
transient_requeue_secs = 15
permanent_requeue_secs = 300

[logging]
format = "text"
filter = "info,kube=warn"
"#,
    )
}
