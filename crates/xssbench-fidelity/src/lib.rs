//! Fidelity Checker (C5): parses a sanitized HTML fragment and decides
//! whether it satisfies a vector's `expected_tags` structural contract
//! (§4.5). Pure and deterministic: identical input always yields an
//! identical verdict.

mod dom;
mod sink;

use html5ever::driver::parse_fragment as html5ever_parse_fragment;
use html5ever::tendril::TendrilSink as _;
use html5ever::{QualName, local_name, namespace_url, ns};

use xssbench_core::TagSpec;

pub use dom::{Document, ElementInfo};

/// Parses a sanitized fragment the way the injection site would receive it:
/// HTML5 fragment parsing mode with `<div>` as the context element, which
/// is what the `Html`/`HtmlHead`/`HtmlOuter`/`OnerrorAttr` contexts all
/// inject into (a `<div id="root">` or an element of equivalent parsing
/// context).
#[must_use]
pub fn parse_fragment(html: &str) -> Document {
    let sink = sink::FidelitySink::default();
    let context_name = QualName::new(None, ns!(html), local_name!("div"));
    let parser = html5ever_parse_fragment(sink, Default::default(), context_name, Vec::new());
    parser.one(html)
}

/// Depth-first pre-order walk of the surviving elements (§4.5 step 2).
#[must_use]
pub fn element_sequence(document: &Document) -> Vec<ElementInfo> {
    document.elements_preorder()
}

/// Whether `html`'s surviving elements satisfy `expected_tags`, per the
/// matching rules in §4.5 step 3. Returns `true` when the fragment is
/// lossy (contract violated), `false` when fidelity was preserved.
#[must_use]
pub fn is_lossy(html: &str, expected_tags: &[TagSpec]) -> bool {
    let document = parse_fragment(html);
    let elements = element_sequence(&document);

    if expected_tags.is_empty() {
        return !elements.is_empty();
    }

    if elements.len() != expected_tags.len() {
        return true;
    }

    for (element, spec) in elements.iter().zip(expected_tags.iter()) {
        if !element.tag.eq_ignore_ascii_case(spec.tag()) {
            return true;
        }
        for required_attr in spec.required_attrs() {
            if !element.has_attr(required_attr) {
                return true;
            }
        }
    }
    false
}

/// Serializes the fragment's text content only, discarding every element —
/// used by the strict-stub adapter fixture and by tests that need a
/// ground-truth "all tags removed" rendering.
#[must_use]
pub fn text_content(document: &Document) -> String {
    document.text_content()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions, not library code")]

    use super::*;

    fn tag(raw: &str) -> TagSpec {
        TagSpec::parse(raw).expect("valid tag spec in test fixture")
    }

    #[test]
    fn empty_expected_tags_requires_zero_elements() {
        assert!(!is_lossy("just text", &[]));
        assert!(is_lossy("<p>hi</p>", &[]));
    }

    #[test]
    fn matching_single_tag_is_not_lossy() {
        assert!(!is_lossy("<p>hi</p>", &[tag("p")]));
    }

    #[test]
    fn mismatched_tag_name_is_lossy() {
        assert!(is_lossy("<span>hi</span>", &[tag("p")]));
    }

    #[test]
    fn missing_required_attribute_is_lossy() {
        assert!(is_lossy(r#"<img src="x.png">"#, &[tag("img[src, alt]")]));
    }

    #[test]
    fn present_required_attribute_is_not_lossy() {
        assert!(!is_lossy(r#"<img src="x.png">"#, &[tag("img[src]")]));
    }

    #[test]
    fn element_sequence_is_preorder_depth_first() {
        let document = parse_fragment("<div><p>a</p><span>b</span></div>");
        let elements = element_sequence(&document);
        let tags: Vec<&str> = elements.iter().map(|element| element.tag.as_str()).collect();
        assert_eq!(tags, vec!["div", "p", "span"]);
    }

    #[test]
    fn noop_ground_truth_matches_literal_element_count() {
        // Invariant 4 in §8: for noop on any vector, lossy equals
        // expected_tags != parse(payload_html).elements.
        let payload = "<p>hi</p>";
        let elements = element_sequence(&parse_fragment(payload));
        assert_eq!(elements.len(), 1);
        assert!(!is_lossy(payload, &[tag("p")]));
    }

    #[test]
    fn whitespace_insensitivity_up_to_reserialization() {
        let tight = is_lossy("<p>hi</p>", &[tag("p")]);
        let spaced = is_lossy("  <p>hi</p>  ", &[tag("p")]);
        assert_eq!(tight, spaced);
    }
}
