//! Document skeleton composition (§4.4 step 2): turns a resolved injection
//! (C4) plus the prelude (C1) into the literal HTML the Page Controller
//! navigates to. Kept separate from `page_controller` so the pure
//! string-building logic (easy to unit test) does not require a live page.

use xssbench_core::template::{ResolvedInjection, Slot};

const PRELUDE_JS: &str = include_str!("js/prelude.js");

/// Comment markers bracketing the `Head`/`Outer` injection sites so the
/// Page Controller's fidelity read-back (§4.4 step 7) can find the exact
/// span of sanitized markup that was spliced in, regardless of where the
/// browser's tree-construction algorithm actually ends up placing it.
/// Comments never trigger an insertion-mode transition the way a wrapping
/// element would (an unexpected `<div>` inside `<head>` would force an
/// implied `<body>`), so they are safe to splice around arbitrary fragment
/// content without perturbing it.
const HEAD_SLOT_START: &str = "xssbench-head-start";
const HEAD_SLOT_END: &str = "xssbench-head-end";
const OUTER_SLOT_START: &str = "xssbench-outer-start";
const OUTER_SLOT_END: &str = "xssbench-outer-end";

/// Builds the full HTML document for one case: the prelude inline in
/// `<head>` (also installed as a context-level init script by the Page
/// Controller so subframes receive it before this document's own copy would
/// even run), a `<div id="root">` injection site in `<body>`, and the
/// resolved injection spliced into its slot.
#[must_use]
pub fn compose(injection: &ResolvedInjection) -> String {
    let (head_extra, outer_extra, root_body, script_tag) = match injection.slot {
        Slot::Root => (String::new(), String::new(), injection.markup.clone(), String::new()),
        Slot::Head => (
            format!("<!--{HEAD_SLOT_START}-->{}<!--{HEAD_SLOT_END}-->", injection.markup),
            String::new(),
            String::new(),
            String::new(),
        ),
        Slot::Outer => (
            String::new(),
            format!("<!--{OUTER_SLOT_START}-->{}<!--{OUTER_SLOT_END}-->", injection.markup),
            String::new(),
            String::new(),
        ),
        Slot::Script => {
            (String::new(), String::new(), String::new(), format!("<script>{}</script>", injection.markup))
        }
    };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <script>{PRELUDE_JS}</script>\n\
         {head_extra}\n\
         </head>\n\
         {outer_extra}\n\
         <body>\n\
         <div id=\"root\">{root_body}</div>\n\
         {script_tag}\n\
         </body>\n\
         </html>\n"
    )
}

/// Builds the JS expression the Page Controller evaluates to read back the
/// live serialized markup of `slot`'s injection site (§4.4 step 7). `Root`
/// reads `#root`'s `innerHTML` directly; `Head`/`Outer` locate the pair of
/// comment markers [`compose`] wraps their injection in and serialize
/// whatever ended up between them, wherever the browser's parser actually
/// placed that span. `Script` is never a fragment context, so it has no
/// meaningful injection-site read-back; callers never invoke this for it.
#[must_use]
pub fn injection_site_script(slot: Slot) -> String {
    match slot {
        Slot::Root => {
            "document.getElementById('root') ? document.getElementById('root').innerHTML : ''"
                .to_string()
        }
        Slot::Head => comment_slice_script(HEAD_SLOT_START, HEAD_SLOT_END),
        Slot::Outer => comment_slice_script(OUTER_SLOT_START, OUTER_SLOT_END),
        Slot::Script => "''".to_string(),
    }
}

/// JS that walks every comment node in document order, finds the pair whose
/// text matches `start_marker`/`end_marker`, and serializes the siblings
/// strictly between them (outer HTML for elements, text content otherwise).
/// Returns `''` if the markers are missing or ended up under different
/// parents (the fragment's content was split across two trees, which never
/// happens for a single contiguous injected span).
fn comment_slice_script(start_marker: &str, end_marker: &str) -> String {
    format!(
        "(function() {{\n\
         var walker = document.createTreeWalker(document, NodeFilter.SHOW_COMMENT);\n\
         var startNode = null, endNode = null, node;\n\
         while ((node = walker.nextNode())) {{\n\
         if (!startNode && node.nodeValue === {start_marker:?}) {{ startNode = node; continue; }}\n\
         if (startNode && !endNode && node.nodeValue === {end_marker:?}) {{ endNode = node; break; }}\n\
         }}\n\
         if (!startNode || !endNode || startNode.parentNode !== endNode.parentNode) {{ return ''; }}\n\
         var html = '';\n\
         var cur = startNode.nextSibling;\n\
         while (cur && cur !== endNode) {{\n\
         html += (cur.outerHTML !== undefined ? cur.outerHTML : (cur.textContent || ''));\n\
         cur = cur.nextSibling;\n\
         }}\n\
         return html;\n\
         }})()"
    )
}

/// Wraps `html` as a `data:text/html;base64,...` URL, the literal form §4.4
/// step 4 asks for ("Navigate to a `data:` URL (or equivalent)").
#[must_use]
pub fn to_data_url(html: &str) -> String {
    use base64::Engine as _;
    let encoded = base64::engine::general_purpose::STANDARD.encode(html.as_bytes());
    format!("data:text/html;base64,{encoded}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "test assertions, not library code")]

    use super::*;
    use xssbench_core::template::{self, PayloadContext};

    #[test]
    fn html_context_lands_inside_root_div() {
        let injection = template::resolve(PayloadContext::Html, "<p>hi</p>");
        let html = compose(&injection);
        assert!(html.contains(r#"<div id="root"><p>hi</p></div>"#));
    }

    #[test]
    fn head_context_lands_after_prelude() {
        let injection = template::resolve(PayloadContext::HtmlHead, "<meta name=\"x\">");
        let html = compose(&injection);
        let prelude_pos = html.find(PRELUDE_JS).expect("prelude present");
        let injected_pos = html.find("<meta name=\"x\">").expect("injection present");
        assert!(prelude_pos < injected_pos);
    }

    #[test]
    fn outer_context_is_sibling_of_head() {
        let injection = template::resolve(PayloadContext::HtmlOuter, "<div>outer</div>");
        let html = compose(&injection);
        let head_close = html.find("</head>").expect("head closes");
        let injected_pos = html.find("<div>outer</div>").expect("injection present");
        assert!(injected_pos > head_close);
    }

    #[test]
    fn script_context_is_wrapped_in_script_tag() {
        let injection = template::resolve(PayloadContext::Js, "alert(1)");
        let html = compose(&injection);
        assert!(html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn data_url_round_trips_through_base64() {
        let url = to_data_url("<p>hi</p>");
        assert!(url.starts_with("data:text/html;base64,"));
    }

    #[test]
    fn head_injection_is_bracketed_by_its_markers() {
        let injection = template::resolve(PayloadContext::HtmlHead, "<meta name=\"x\">");
        let html = compose(&injection);
        assert!(html.contains(&format!("<!--{HEAD_SLOT_START}-->")));
        assert!(html.contains(&format!("<!--{HEAD_SLOT_END}-->")));
    }

    #[test]
    fn outer_injection_is_bracketed_by_its_markers() {
        let injection = template::resolve(PayloadContext::HtmlOuter, "<div>outer</div>");
        let html = compose(&injection);
        assert!(html.contains(&format!("<!--{OUTER_SLOT_START}-->")));
        assert!(html.contains(&format!("<!--{OUTER_SLOT_END}-->")));
    }

    #[test]
    fn root_injection_site_script_reads_root_inner_html() {
        let script = injection_site_script(Slot::Root);
        assert!(script.contains("getElementById('root')"));
    }

    #[test]
    fn head_and_outer_injection_site_scripts_reference_their_own_markers() {
        let head_script = injection_site_script(Slot::Head);
        assert!(head_script.contains(HEAD_SLOT_START));
        assert!(head_script.contains(HEAD_SLOT_END));
        assert!(!head_script.contains(OUTER_SLOT_START));

        let outer_script = injection_site_script(Slot::Outer);
        assert!(outer_script.contains(OUTER_SLOT_START));
        assert!(outer_script.contains(OUTER_SLOT_END));
        assert!(!outer_script.contains(HEAD_SLOT_START));
    }
}
