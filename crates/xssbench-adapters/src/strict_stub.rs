//! A deliberately maximal-strictness fixture adapter: strips every tag,
//! keeping only text. Exists for the literal end-to-end scenario in §8
//! (scenario 4: `<script>alert(1)</script>` under `strict-stub` must come
//! out `pass`/non-lossy) — a real sanitizer implementation would never be
//! this aggressive, which is exactly why it is useful as a known-good
//! lower bound for the classifier and fidelity checker.

use xssbench_core::Policy;

use crate::{SanitizedOutput, SanitizerAdapter};

#[derive(Debug, Default, Clone, Copy)]
pub struct StrictStubAdapter;

impl SanitizerAdapter for StrictStubAdapter {
    fn id(&self) -> &str {
        "strict-stub"
    }

    fn sanitize(&self, html: &str, _policy: &Policy) -> SanitizedOutput {
        let document = xssbench_fidelity::parse_fragment(html);
        SanitizedOutput::ok(xssbench_fidelity::text_content(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags_down_to_text() {
        let adapter = StrictStubAdapter;
        let policy = Policy::permissive_default();
        let output = adapter.sanitize("<script>alert(1)</script>", &policy);
        assert_eq!(output.clean_html(), Some("alert(1)"));
    }

    #[test]
    fn preserves_plain_text() {
        let adapter = StrictStubAdapter;
        let policy = Policy::permissive_default();
        let output = adapter.sanitize("hello world", &policy);
        assert_eq!(output.clean_html(), Some("hello world"));
    }
}
