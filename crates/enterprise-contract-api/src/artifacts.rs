// crates/enterprise-contract-api/src/artifacts.rs
// ============================================================================
// Module: Generated Artifacts
// Description: Deterministic artifact sets for schemas and docs examples.
// Purpose: Write generated files to disk and detect drift against them.
// Dependencies: std, thiserror
// ============================================================================

//! ## Overview
//! An [`ArtifactSet`] is an ordered list of generated files keyed by relative
//! path. Sets are written into an output directory or verified against one;
//! verification fails on the first missing or mismatched file so CI can catch
//! stale generated docs.
//!
//! Invariants:
//! - Artifact paths are relative and never escape the output directory.
//! - Paths within a set are unique and sorted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::examples::K8S_EXAMPLE_FILE;
use crate::examples::SPEC_EXAMPLE_FILE;
use crate::examples::k8s_example_yaml;
use crate::examples::spec_example_json;
use crate::schema::CRD_MANIFEST_FILE;
use crate::schema::POLICY_SPEC_SCHEMA_FILE;
use crate::schema::crd_yaml;
use crate::schema::policy_spec_schema_json;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when generating, writing, or verifying artifacts.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Encoding an artifact failed.
    #[error("artifact serialization failed: {0}")]
    Serialization(String),
    /// Filesystem access failed.
    #[error("artifact io error: {0}")]
    Io(String),
    /// An artifact path is unsafe or duplicated.
    #[error("invalid artifact path: {0}")]
    InvalidPath(String),
    /// On-disk content differs from the generated content.
    #[error("artifact drift: {0}")]
    Drift(String),
}

// ============================================================================
// SECTION: Artifact Types
// ============================================================================

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the output directory.
    pub path: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Creates an artifact from text content.
    #[must_use]
    pub fn text(path: impl Into<String>, content: String) -> Self {
        Self {
            path: path.into(),
            bytes: content.into_bytes(),
        }
    }
}

/// Ordered set of generated files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Artifacts sorted by path.
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    /// Builds a set from artifacts, sorting by path and rejecting duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidPath`] on unsafe or duplicate paths.
    pub fn new(mut artifacts: Vec<Artifact>) -> Result<Self, GenerationError> {
        artifacts.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
        let mut seen = BTreeSet::new();
        for artifact in &artifacts {
            validate_relative_path(&artifact.path)?;
            if !seen.insert(artifact.path.as_str()) {
                return Err(GenerationError::InvalidPath(format!("duplicate: {}", artifact.path)));
            }
        }
        Ok(Self {
            artifacts,
        })
    }

    /// Returns the artifacts in path order.
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Writes every artifact below `output_dir`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Io`] when a write fails.
    pub fn write_to(&self, output_dir: &Path) -> Result<Vec<PathBuf>, GenerationError> {
        let mut written = Vec::with_capacity(self.artifacts.len());
        for artifact in &self.artifacts {
            let target = output_dir.join(validate_relative_path(&artifact.path)?);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|err| GenerationError::Io(err.to_string()))?;
            }
            fs::write(&target, &artifact.bytes)
                .map_err(|err| GenerationError::Io(format!("{}: {err}", target.display())))?;
            written.push(target);
        }
        Ok(written)
    }

    /// Verifies that `output_dir` holds exactly the generated content.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Drift`] when a file is missing or differs.
    pub fn verify(&self, output_dir: &Path) -> Result<(), GenerationError> {
        for artifact in &self.artifacts {
            let target = output_dir.join(validate_relative_path(&artifact.path)?);
            let existing = fs::read(&target)
                .map_err(|_| GenerationError::Drift(format!("missing artifact: {}", artifact.path)))?;
            if existing != artifact.bytes {
                return Err(GenerationError::Drift(format!("artifact mismatch: {}", artifact.path)));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Canonical Sets
// ============================================================================

/// Returns the docs example artifacts (`spec-example.json`, `k8s-example.yaml`).
///
/// # Errors
///
/// Returns [`GenerationError`] when rendering fails.
pub fn example_artifacts() -> Result<ArtifactSet, GenerationError> {
    ArtifactSet::new(vec![
        Artifact::text(SPEC_EXAMPLE_FILE, spec_example_json()?),
        Artifact::text(K8S_EXAMPLE_FILE, k8s_example_yaml()?),
    ])
}

/// Returns the policy spec JSON schema artifact under `file_name`.
///
/// # Errors
///
/// Returns [`GenerationError`] when rendering fails or `file_name` is unsafe.
pub fn schema_artifacts(file_name: Option<&str>) -> Result<ArtifactSet, GenerationError> {
    let file_name = file_name.unwrap_or(POLICY_SPEC_SCHEMA_FILE);
    ArtifactSet::new(vec![Artifact::text(file_name, policy_spec_schema_json()?)])
}

/// Returns the CRD manifest artifact.
///
/// # Errors
///
/// Returns [`GenerationError`] when rendering fails.
pub fn crd_artifacts() -> Result<ArtifactSet, GenerationError> {
    ArtifactSet::new(vec![Artifact::text(CRD_MANIFEST_FILE, crd_yaml()?)])
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures an artifact path is relative and stays within the output directory.
fn validate_relative_path(path: &str) -> Result<PathBuf, GenerationError> {
    let candidate = Path::new(path);
    if path.is_empty() {
        return Err(GenerationError::InvalidPath("empty path".to_string()));
    }
    for component in candidate.components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(GenerationError::InvalidPath(path.to_string()));
        }
    }
    Ok(candidate.to_path_buf())
}
