//! The vector data model (§3): an immutable adversarial payload plus the
//! syntactic slot it is injected into and the structural contract it is
//! expected to satisfy after sanitization.

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// The syntactic slot a payload is injected into. See `spec` §3 for the
/// full enumeration; each variant corresponds to one injection template in
/// [`crate::template`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadContext {
    /// Fragment injected as `innerHTML` of `<div id="root">`.
    Html,
    /// Fragment injected into `<head>`, after the prelude.
    HtmlHead,
    /// Fragment injected as a direct child of `<html>`, after `<head>`.
    HtmlOuter,
    /// Payload used verbatim as the `href` of a wrapping anchor.
    Href,
    /// Payload used verbatim as the value of an `onerror` attribute.
    OnerrorAttr,
    /// Payload is the entire body of an inline `<script>`.
    Js,
    /// Payload is the sole argument of `setTimeout(fn, PAYLOAD)`.
    JsArg,
    /// Payload is interpolated inside a single-quoted JS string literal.
    JsString,
    /// Payload is interpolated inside a double-quoted JS string literal.
    JsStringDouble,
}

impl PayloadContext {
    /// Fragment contexts are the ones the fidelity checker (C5) evaluates:
    /// `expected_tags` is mandatory for these and forbidden everywhere else.
    #[must_use]
    pub const fn requires_expected_tags(self) -> bool {
        matches!(self, Self::Html | Self::HtmlHead | Self::HtmlOuter | Self::OnerrorAttr)
    }

    /// `lossy` is only ever computed for fragment contexts; invariant 3 in
    /// §8 pins it to `false` for every other context.
    #[must_use]
    pub const fn is_fragment_context(self) -> bool {
        self.requires_expected_tags()
    }
}

/// Either a bare tag name (`p`) or a tag plus a list of attribute names that
/// must be present (`a[href, style]`). Values are never checked, only
/// presence of the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagSpec {
    tag: String,
    required_attrs: Vec<String>,
}

impl TagSpec {
    /// Parses the compact `tag[attr, attr]` grammar used in vector files.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::VectorSchemaError`] if the spec is not a
    /// bare identifier or the `tag[...]` bracket form.
    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        let raw = raw.trim();
        let Some(bracket_start) = raw.find('[') else {
            return Ok(Self { tag: raw.to_ascii_lowercase(), required_attrs: Vec::new() });
        };
        if !raw.ends_with(']') {
            return Err(HarnessError::VectorSchemaError(format!(
                "unterminated tag spec: {raw}"
            )));
        }
        let tag = raw[..bracket_start].trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Err(HarnessError::VectorSchemaError(format!(
                "tag spec missing tag name: {raw}"
            )));
        }
        let attrs_body = &raw[bracket_start + 1..raw.len() - 1];
        let required_attrs = attrs_body
            .split(',')
            .map(str::trim)
            .filter(|attr| !attr.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        Ok(Self { tag, required_attrs })
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[must_use]
    pub fn required_attrs(&self) -> &[String] {
        &self.required_attrs
    }
}

impl TryFrom<String> for TagSpec {
    type Error = HarnessError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<TagSpec> for String {
    fn from(spec: TagSpec) -> Self {
        if spec.required_attrs.is_empty() {
            spec.tag
        } else {
            format!("{}[{}]", spec.tag, spec.required_attrs.join(", "))
        }
    }
}

/// One contexts entry on a vector: either a single context, or an ordered
/// list meaning "run once per listed context".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextSet {
    One(PayloadContext),
    Many(Vec<PayloadContext>),
}

impl ContextSet {
    #[must_use]
    pub fn contexts(&self) -> Vec<PayloadContext> {
        match self {
            Self::One(context) => vec![*context],
            Self::Many(contexts) => contexts.clone(),
        }
    }
}

/// An immutable adversarial payload plus its metadata. Loaded once from a
/// vector file and never mutated thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vector {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub payload_html: String,
    pub payload_context: ContextSet,
    #[serde(default)]
    pub expected_tags: Vec<TagSpec>,
    #[serde(default)]
    pub sanitizer_allow_tags: Option<Vec<String>>,
}

impl Vector {
    /// Validates the §3 context invariant: `expected_tags` required for
    /// fragment contexts, forbidden otherwise; `sanitizer_allow_tags` only
    /// valid for... (see note below on the one context this vector's
    /// `payload_context` lists).
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvariantViolation`] on any violation. This
    /// is always a load-time, run-aborting failure per §7.
    pub fn validate(&self) -> Result<(), HarnessError> {
        // An empty expected_tags is itself meaningful ("must contain zero
        // elements" per §4.5), so only the forbidden direction is checked
        // here; "required but absent" cannot be distinguished from "required
        // and deliberately empty" once serde defaults the field, and §4.5
        // treats both the same way.
        for context in self.payload_context.contexts() {
            if !context.requires_expected_tags() && !self.expected_tags.is_empty() {
                return Err(HarnessError::InvariantViolation(format!(
                    "vector {}: expected_tags forbidden for context {context:?}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Expands this vector into one `CaseInput` per `(context, sanitizer)`
    /// pair, for every sanitizer id supplied.
    #[must_use]
    pub fn expand_cases(&self, sanitizer_ids: &[String]) -> Vec<CaseInput> {
        let mut cases = Vec::new();
        for context in self.payload_context.contexts() {
            for sanitizer_id in sanitizer_ids {
                cases.push(CaseInput {
                    vector_id: self.id.clone(),
                    context,
                    sanitizer_id: sanitizer_id.clone(),
                });
            }
        }
        cases
    }
}

/// One concrete `(vector, context, sanitizer)` triple. Ephemeral: created by
/// the scheduler, consumed by a worker, then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseInput {
    pub vector_id: String,
    pub context: PayloadContext,
    pub sanitizer_id: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions, not library code")]

    use super::*;

    #[test]
    fn tag_spec_parses_bare_tag() {
        let spec = TagSpec::parse("p").expect("bare tag parses");
        assert_eq!(spec.tag(), "p");
        assert!(spec.required_attrs().is_empty());
    }

    #[test]
    fn tag_spec_parses_attrs() {
        let spec = TagSpec::parse("a[href, style]").expect("attr spec parses");
        assert_eq!(spec.tag(), "a");
        assert_eq!(spec.required_attrs(), &["href".to_string(), "style".to_string()]);
    }

    #[test]
    fn tag_spec_is_case_insensitive() {
        let spec = TagSpec::parse("IMG[SRC]").expect("uppercase spec parses");
        assert_eq!(spec.tag(), "img");
        assert_eq!(spec.required_attrs(), &["src".to_string()]);
    }

    #[test]
    fn tag_spec_rejects_unterminated_bracket() {
        TagSpec::parse("a[href").expect_err("unterminated bracket must be rejected");
    }

    #[test]
    fn vector_rejects_expected_tags_on_js_context() {
        let vector = Vector {
            id: "v1".into(),
            description: String::new(),
            payload_html: "alert(1)".into(),
            payload_context: ContextSet::One(PayloadContext::Js),
            expected_tags: vec![TagSpec::parse("p").expect("valid")],
            sanitizer_allow_tags: None,
        };
        vector.validate().expect_err("expected_tags forbidden on js context");
    }

    #[test]
    fn vector_expands_one_case_per_context_per_sanitizer() {
        let vector = Vector {
            id: "v1".into(),
            description: String::new(),
            payload_html: "<p>hi</p>".into(),
            payload_context: ContextSet::Many(vec![PayloadContext::Html, PayloadContext::HtmlOuter]),
            expected_tags: vec![TagSpec::parse("p").expect("valid")],
            sanitizer_allow_tags: None,
        };
        let cases = vector.expand_cases(&["noop".to_string(), "strict-stub".to_string()]);
        assert_eq!(cases.len(), 4);
    }
}
