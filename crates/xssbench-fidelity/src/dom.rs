//! A minimal arena-backed DOM: just enough to walk elements in document
//! order and read their attributes. No layout, no mutation observers, no
//! cross-frame mirroring — the fidelity checker only ever reads a finished
//! parse once.

use indextree::{Arena, NodeId};
use smallvec::SmallVec;

/// Attributes rarely exceed a handful of entries; inlining four avoids an
/// allocation for the common case, matching the DOM attribute storage the
/// teacher crate this was grounded on also inlines.
pub type AttrList = SmallVec<(String, String), 4>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element { tag: String, attrs: AttrList },
    Text { text: String },
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: NodeKind,
}

/// A parsed fragment tree plus its root handle.
pub struct Document {
    pub(crate) arena: Arena<DomNode>,
    pub(crate) root: NodeId,
}

/// One surviving element from the pre-order walk: its tag name and its
/// attribute names (values are irrelevant to fidelity matching — §4.5
/// step 3 only checks presence).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub tag: String,
    attrs: Vec<String>,
}

impl ElementInfo {
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|attr| attr.eq_ignore_ascii_case(name))
    }
}

impl Document {
    #[must_use]
    pub(crate) fn new(arena: Arena<DomNode>, root: NodeId) -> Self {
        Self { arena, root }
    }

    /// Depth-first pre-order walk collecting every element (§4.5 step 2).
    ///
    /// html5ever's fragment parser always inserts a synthetic `<html>`
    /// element above the fragment content (the same wrapper
    /// `scraper::Html::parse_fragment` documents), so the walk starts
    /// one level below it rather than at the arena's document node —
    /// otherwise every fragment would carry one extra leading `html`
    /// element that was never part of the sanitized output.
    #[must_use]
    pub fn elements_preorder(&self) -> Vec<ElementInfo> {
        let mut out = Vec::new();
        for child in self.content_root_children() {
            self.collect_elements(child, &mut out);
        }
        out
    }

    /// The children to actually walk for element collection: the
    /// synthetic `<html>` wrapper's children when present, the document's
    /// own children otherwise.
    fn content_root_children(&self) -> Vec<NodeId> {
        for child in self.root.children(&self.arena) {
            if let Some(node) = self.arena.get(child)
                && let NodeKind::Element { tag, .. } = &node.get().kind
                && tag.eq_ignore_ascii_case("html")
            {
                return child.children(&self.arena).collect();
            }
        }
        self.root.children(&self.arena).collect()
    }

    fn collect_elements(&self, node_id: NodeId, out: &mut Vec<ElementInfo>) {
        if let Some(node) = self.arena.get(node_id) {
            if let NodeKind::Element { tag, attrs } = &node.get().kind {
                out.push(ElementInfo {
                    tag: tag.clone(),
                    attrs: attrs.iter().map(|(name, _value)| name.clone()).collect(),
                });
            }
        }
        for child in node_id.children(&self.arena) {
            self.collect_elements(child, out);
        }
    }

    /// Concatenated text content in document order, discarding all
    /// elements — used by the strict-stub adapter fixture.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.root, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        if let Some(node) = self.arena.get(node_id) {
            if let NodeKind::Text { text } = &node.get().kind {
                out.push_str(text);
            }
        }
        for child in node_id.children(&self.arena) {
            self.collect_text(child, out);
        }
    }
}
