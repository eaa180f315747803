//! Node capability layer.
//!
//! Everything that inspects or patches the page goes through
//! [`QueryableNode`], so the corrector never assumes a particular DOM binding.
//! [`document`] provides the html5ever-backed implementation used by the
//! page model and the CLI.

pub mod document;

pub use document::{Document, DomNode, MutationRecord};

/// Read access to a node plus the one mutation the corrector needs.
///
/// Absent attributes are `None`; callers that want the "treat missing as
/// empty" behaviour use [`QueryableNode::attr_or_empty`].
pub trait QueryableNode: Clone {
    /// Lowercase tag name for element nodes, `None` for everything else.
    fn tag_name(&self) -> Option<String>;

    fn attribute(&self, name: &str) -> Option<String>;

    fn set_attribute(&self, name: &str, value: &str);

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> String;

    fn parent_element(&self) -> Option<Self>;

    /// Element descendants in document order, excluding `self`.
    fn descendants(&self) -> Vec<Self>;

    fn is_same_node(&self, other: &Self) -> bool;

    fn attr_or_empty(&self, name: &str) -> String {
        self.attribute(name).unwrap_or_default()
    }

    fn is_element(&self) -> bool {
        self.tag_name().is_some()
    }

    fn has_tag(&self, tag: &str) -> bool {
        self.tag_name().is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    fn query_descendants<P>(&self, predicate: P) -> Vec<Self>
    where
        P: Fn(&Self) -> bool,
    {
        self.descendants().into_iter().filter(|n| predicate(n)).collect()
    }

    /// Closest element, starting with `self`, that satisfies `predicate`.
    fn nearest_ancestor_matching<P>(&self, predicate: P) -> Option<Self>
    where
        P: Fn(&Self) -> bool,
    {
        let mut current = if self.is_element() {
            Some(self.clone())
        } else {
            self.parent_element()
        };
        while let Some(node) = current {
            if predicate(&node) {
                return Some(node);
            }
            current = node.parent_element();
        }
        None
    }
}
