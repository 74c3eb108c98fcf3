//! Injection-template resolver (C4): turns a `(context, sanitized_html)`
//! pair into the literal markup the Page Controller (C6) splices into its
//! document skeleton (§4.4 step 2). This module only resolves *what* to
//! inject and *where*; composing the full document (prelude, network
//! guard, navigation) is the harness crate's job.

use crate::vector::PayloadContext;

/// The document slot a resolved injection belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// `<div id="root">` in `<body>`.
    Root,
    /// Inside `<head>`, after the prelude init script.
    Head,
    /// Direct child of `<html>`, after `</head>`.
    Outer,
    /// Inside the dedicated `<script>` element.
    Script,
}

/// The literal markup for one slot, already escaped/wrapped for its
/// context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInjection {
    pub slot: Slot,
    pub markup: String,
}

/// Escapes a value for safe embedding inside a double-quoted HTML
/// attribute. This is harness plumbing, not a sanitizer: the point of the
/// harness is to observe what the *sanitizer* already produced, so only the
/// quote character that would otherwise break out of the attribute is
/// escaped.
fn escape_for_double_quoted_attr(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Escapes a value for embedding inside a single-quoted JS string literal:
/// only the characters that would terminate the literal or the statement
/// need escaping for the harness's own markup to stay well-formed.
fn escape_for_js_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n")
}

fn escape_for_js_double_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Resolves a sanitized payload into the slot and literal markup the
/// document skeleton should receive for the given context.
#[must_use]
pub fn resolve(context: PayloadContext, sanitized_html: &str) -> ResolvedInjection {
    match context {
        PayloadContext::Html => {
            ResolvedInjection { slot: Slot::Root, markup: sanitized_html.to_string() }
        }
        PayloadContext::HtmlHead => {
            ResolvedInjection { slot: Slot::Head, markup: sanitized_html.to_string() }
        }
        PayloadContext::HtmlOuter => {
            ResolvedInjection { slot: Slot::Outer, markup: sanitized_html.to_string() }
        }
        PayloadContext::Href => ResolvedInjection {
            slot: Slot::Root,
            markup: format!(
                r#"<a href="{}">xssbench-link</a>"#,
                escape_for_double_quoted_attr(sanitized_html)
            ),
        },
        PayloadContext::OnerrorAttr => ResolvedInjection {
            slot: Slot::Root,
            markup: format!(
                r#"<img src="x" onerror="{}">"#,
                escape_for_double_quoted_attr(sanitized_html)
            ),
        },
        PayloadContext::Js => {
            ResolvedInjection { slot: Slot::Script, markup: sanitized_html.to_string() }
        }
        PayloadContext::JsArg => ResolvedInjection {
            slot: Slot::Script,
            markup: format!("setTimeout({sanitized_html}, 0);"),
        },
        PayloadContext::JsString => ResolvedInjection {
            slot: Slot::Script,
            markup: format!(
                "var xssbenchValue = '{}';",
                escape_for_js_single_quoted(sanitized_html)
            ),
        },
        PayloadContext::JsStringDouble => ResolvedInjection {
            slot: Slot::Script,
            markup: format!(
                "var xssbenchValue = \"{}\";",
                escape_for_js_double_quoted(sanitized_html)
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_context_injects_into_root_verbatim() {
        let resolved = resolve(PayloadContext::Html, "<p>hi</p>");
        assert_eq!(resolved.slot, Slot::Root);
        assert_eq!(resolved.markup, "<p>hi</p>");
    }

    #[test]
    fn href_context_wraps_payload_in_anchor() {
        let resolved = resolve(PayloadContext::Href, "javascript:alert(1)");
        assert_eq!(resolved.slot, Slot::Root);
        assert!(resolved.markup.contains(r#"href="javascript:alert(1)""#));
    }

    #[test]
    fn href_context_escapes_embedded_quotes() {
        let resolved = resolve(PayloadContext::Href, r#"x" onclick="alert(1)"#);
        assert!(!resolved.markup.contains(r#"onclick="alert(1)""#));
    }

    #[test]
    fn js_arg_context_wraps_payload_in_settimeout() {
        let resolved = resolve(PayloadContext::JsArg, "10_000_000");
        assert_eq!(resolved.slot, Slot::Script);
        assert_eq!(resolved.markup, "setTimeout(10_000_000, 0);");
    }

    #[test]
    fn js_string_escapes_single_quotes() {
        let resolved = resolve(PayloadContext::JsString, "'); alert(1); ('");
        assert!(!resolved.markup.contains("'); alert(1); ('"));
    }
}
