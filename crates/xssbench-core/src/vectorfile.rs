//! Vector file loading (§6 "Vector file format (v1)"). File discovery and
//! JSON Schema validation proper are out of scope for this crate (they are
//! named in §1 as an external collaborator); what lives here is the
//! load-time parse plus the two invariants §7 requires to abort the run
//! before any case executes: per-vector context validity and the
//! corpus-wide attribute allowlist check (§4.5 step 4).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::policy::Policy;
use crate::vector::Vector;

const SCHEMA_TAG: &str = "xssbench.vectorfile.v1";

/// Pointer to the license file a vector corpus ships with. License
/// *handling* (reading terms, attribution) is out of scope per §1; the
/// harness only needs to know the file exists so it can be carried through
/// to downstream tooling untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LicenseMeta {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VectorFileMeta {
    #[serde(default)]
    pub license: LicenseMeta,
}

/// The parsed, validated contents of one vector file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorFile {
    pub schema: String,
    #[serde(default)]
    pub meta: VectorFileMeta,
    pub vectors: Vec<Vector>,
}

impl VectorFile {
    /// Parses a vector file from its JSON text and validates it against
    /// both the per-vector context invariant (§3) and the corpus-wide
    /// attribute allowlist (§4.5 step 4).
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::VectorSchemaError`] for malformed JSON or a
    /// `schema` tag this crate does not recognize, and
    /// [`HarnessError::InvariantViolation`] for any context or allowlist
    /// violation. Both are fatal-at-load per §7: no case runs until a
    /// vector file parses clean.
    pub fn parse(raw: &str, policy: &Policy) -> Result<Self, HarnessError> {
        let file: Self = serde_json::from_str(raw)
            .map_err(|err| HarnessError::VectorSchemaError(err.to_string()))?;
        if file.schema != SCHEMA_TAG {
            return Err(HarnessError::VectorSchemaError(format!(
                "unrecognized schema {:?}, expected {SCHEMA_TAG:?}",
                file.schema
            )));
        }
        for vector in &file.vectors {
            vector.validate()?;
        }
        file.check_attribute_allowlist(policy)?;
        Ok(file)
    }

    /// Loads and validates a vector file from disk.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::parse`]'s errors, plus
    /// [`HarnessError::VectorSchemaError`] if the file cannot be read.
    pub fn load(path: &Path, policy: &Policy) -> Result<Self, HarnessError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| HarnessError::VectorSchemaError(format!("{}: {err}", path.display())))?;
        Self::parse(&raw, policy)
    }

    /// Every attribute name referenced in any `expected_tags` entry across
    /// the whole corpus must belong to the shared allowlist. This is
    /// checked once, for the whole file, not per case (§4.5 step 4).
    fn check_attribute_allowlist(&self, policy: &Policy) -> Result<(), HarnessError> {
        for vector in &self.vectors {
            for tag_spec in &vector.expected_tags {
                if !policy.allows_tag(tag_spec.tag()) {
                    return Err(HarnessError::InvariantViolation(format!(
                        "vector {}: expected_tags references disallowed tag {:?}",
                        vector.id,
                        tag_spec.tag()
                    )));
                }
                for attr in tag_spec.required_attrs() {
                    if !policy.allows_attr(attr) {
                        return Err(HarnessError::InvariantViolation(format!(
                            "vector {}: expected_tags references disallowed attribute {attr:?}",
                            vector.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions, not library code")]

    use super::*;

    fn sample(expected_tags: &str) -> String {
        format!(
            r#"{{
                "schema": "xssbench.vectorfile.v1",
                "meta": {{"license": {{"file": "LICENSE"}}}},
                "vectors": [
                    {{
                        "id": "v1",
                        "payload_html": "<p>hi</p>",
                        "payload_context": "html",
                        "expected_tags": [{expected_tags}]
                    }}
                ]
            }}"#
        )
    }

    #[test]
    fn parses_well_formed_file() {
        let policy = Policy::permissive_default();
        let file = VectorFile::parse(&sample(r#""p""#), &policy).expect("valid file parses");
        assert_eq!(file.vectors.len(), 1);
        assert_eq!(file.meta.license.file.as_deref(), Some("LICENSE"));
    }

    #[test]
    fn rejects_wrong_schema_tag() {
        let policy = Policy::permissive_default();
        let raw = sample(r#""p""#).replace("xssbench.vectorfile.v1", "xssbench.vectorfile.v2");
        VectorFile::parse(&raw, &policy).expect_err("unrecognized schema tag must be rejected");
    }

    #[test]
    fn rejects_disallowed_attribute_in_expected_tags() {
        let policy = Policy::permissive_default();
        let raw = sample(r#""p[data-totally-not-allowed]""#);
        let err = VectorFile::parse(&raw, &policy).expect_err("disallowed attr rejected");
        assert!(matches!(err, HarnessError::InvariantViolation(_)));
    }

    #[test]
    fn rejects_expected_tags_on_forbidden_context() {
        let policy = Policy::permissive_default();
        let raw = sample(r#""p""#).replace(r#""payload_context": "html""#, r#""payload_context": "js""#);
        let err = VectorFile::parse(&raw, &policy).expect_err("context invariant rejected");
        assert!(matches!(err, HarnessError::InvariantViolation(_)));
    }
}
