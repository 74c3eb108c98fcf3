//! The shared allowlist policy handed to every adapter (C3) and checked
//! against every `expected_tags` entry at vector-file load time (§4.5 step
//! 4, §7 `InvariantViolation`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Attributes the Dangerous-URL detector (P1, §4.2) inspects on every
/// element, plus `style`. Fixed by the spec, not configurable.
pub const DANGEROUS_URL_ATTRS: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "data",
    "xlink:href",
    "content",
    "to",
    "from",
    "values",
    "style",
];

/// `data:` MIME types treated as dangerous regardless of the scheme they
/// are embedded in (§4.2 P1 step 2).
pub const DANGEROUS_DATA_MIME_TYPES: &[&str] =
    &["text/html", "image/svg+xml", "application/xhtml+xml", "text/xml", "application/xml"];

/// The allowlist every vector's `expected_tags` attribute names must be
/// drawn from. This is the corpus-wide invariant of §4.5 step 4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    allowed_tags: HashSet<String>,
    allowed_attrs: HashSet<String>,
}

impl Policy {
    /// Builds a policy from explicit tag and attribute allowlists,
    /// lowercasing every entry so lookups are case-insensitive.
    #[must_use]
    pub fn new<TagIter, AttrIter>(tags: TagIter, attrs: AttrIter) -> Self
    where
        TagIter: IntoIterator<Item = String>,
        AttrIter: IntoIterator<Item = String>,
    {
        Self {
            allowed_tags: tags.into_iter().map(|tag| tag.to_ascii_lowercase()).collect(),
            allowed_attrs: attrs.into_iter().map(|attr| attr.to_ascii_lowercase()).collect(),
        }
    }

    /// A generous default policy covering the tags/attributes that show up
    /// across the literal end-to-end scenarios in §8: enough for the noop
    /// and strict-stub adapters to exercise without every vector needing a
    /// bespoke policy.
    #[must_use]
    pub fn permissive_default() -> Self {
        let tags = [
            "p", "a", "img", "div", "span", "script", "iframe", "form", "button", "input", "area",
            "style", "svg",
        ]
        .map(String::from);
        let attrs = [
            "href", "src", "style", "srcdoc", "ping", "formaction", "action", "onerror", "id",
            "class",
        ]
        .map(String::from);
        Self::new(tags, attrs)
    }

    #[must_use]
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(&tag.to_ascii_lowercase())
    }

    #[must_use]
    pub fn allows_attr(&self, attr: &str) -> bool {
        self.allowed_attrs.contains(&attr.to_ascii_lowercase())
    }

    #[must_use]
    pub fn allowed_attrs(&self) -> &HashSet<String> {
        &self.allowed_attrs
    }
}

/// Normalizes a raw attribute value the way P1 does before scheme checks:
/// trim ASCII bytes `<= 0x20` from both ends, lowercase, and leave internal
/// whitespace untouched (§4.2 step 1 — `"jav   ascript:"` must survive
/// unflagged).
#[must_use]
pub fn normalize_scheme_candidate(raw: &str) -> String {
    raw.trim_matches(|ch: char| (ch as u32) <= 0x20).to_ascii_lowercase()
}

/// Whether a normalized value is a dangerous `javascript:` or `data:` URL
/// per §4.2 step 2.
#[must_use]
pub fn is_dangerous_scheme(normalized: &str) -> bool {
    if normalized.starts_with("javascript:") {
        return true;
    }
    if let Some(after_scheme) = normalized.strip_prefix("data:") {
        return DANGEROUS_DATA_MIME_TYPES
            .iter()
            .any(|mime| after_scheme.starts_with(mime));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_leading_nul_and_whitespace() {
        assert_eq!(normalize_scheme_candidate("  JavaScript:alert(1)"), "javascript:alert(1)");
        assert_eq!(normalize_scheme_candidate("\u{0}javascript:alert(1)"), "javascript:alert(1)");
    }

    #[test]
    fn preserves_internal_whitespace() {
        let normalized = normalize_scheme_candidate("jav   ascript:alert(1)");
        assert!(!is_dangerous_scheme(&normalized));
    }

    #[test]
    fn flags_dangerous_data_mime() {
        assert!(is_dangerous_scheme("data:text/html,<script>alert(1)</script>"));
        assert!(is_dangerous_scheme("data:image/svg+xml,<svg onload=alert(1)>"));
        assert!(!is_dangerous_scheme("data:image/png;base64,abc"));
    }

    #[test]
    fn policy_lookups_are_case_insensitive() {
        let policy = Policy::new(["A".to_string()], ["HREF".to_string()]);
        assert!(policy.allows_tag("a"));
        assert!(policy.allows_attr("href"));
    }
}
