//! html5ever-backed document with a mutation journal.
//!
//! The journal stands in for a mutation observer: while observing, every
//! child-list change and attribute write made through [`DomNode`] is
//! recorded, and the host drains the records at its next checkpoint.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::serialize::SerializeOpts;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{local_name, namespace_url, ns, parse_document, parse_fragment};
use html5ever::{Attribute, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use tracing::trace;

use super::QueryableNode;

/// A recorded DOM change.
#[derive(Clone)]
pub enum MutationRecord {
    ChildList {
        target: DomNode,
        added: Vec<DomNode>,
        removed: Vec<DomNode>,
    },
    Attribute {
        target: DomNode,
        name: String,
    },
}

/// Records hold raw handles so the journal never owns a reference to itself.
enum RawRecord {
    ChildList {
        target: Handle,
        added: Vec<Handle>,
        removed: Vec<Handle>,
    },
    Attribute {
        target: Handle,
        name: String,
    },
}

#[derive(Default)]
struct Journal {
    observing: bool,
    records: Vec<RawRecord>,
}

impl Journal {
    fn push(&mut self, record: RawRecord) {
        if self.observing {
            self.records.push(record);
        }
    }
}

/// A parsed HTML document.
pub struct Document {
    dom: RcDom,
    journal: Rc<RefCell<Journal>>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
        Self {
            dom,
            journal: Rc::new(RefCell::new(Journal::default())),
        }
    }

    /// The document node itself (not an element).
    pub fn root(&self) -> DomNode {
        self.wrap(self.dom.document.clone())
    }

    pub fn body(&self) -> Option<DomNode> {
        self.root().descendants().into_iter().find(|n| n.has_tag("body"))
    }

    pub fn element_by_id(&self, id: &str) -> Option<DomNode> {
        self.root()
            .descendants()
            .into_iter()
            .find(|n| n.attribute("id").as_deref() == Some(id))
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<DomNode> {
        self.root().query_descendants(|n| n.has_tag(tag))
    }

    /// Start recording mutations.
    pub fn observe(&self) {
        self.journal.borrow_mut().observing = true;
    }

    pub fn is_observing(&self) -> bool {
        self.journal.borrow().observing
    }

    /// Drain every record collected since the last call.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        let raw = std::mem::take(&mut self.journal.borrow_mut().records);
        raw.into_iter()
            .map(|record| match record {
                RawRecord::ChildList {
                    target,
                    added,
                    removed,
                } => MutationRecord::ChildList {
                    target: self.wrap(target),
                    added: added.into_iter().map(|h| self.wrap(h)).collect(),
                    removed: removed.into_iter().map(|h| self.wrap(h)).collect(),
                },
                RawRecord::Attribute { target, name } => MutationRecord::Attribute {
                    target: self.wrap(target),
                    name,
                },
            })
            .collect()
    }

    pub fn serialize(&self) -> std::io::Result<String> {
        let mut out = Vec::new();
        let handle: SerializableHandle = self.dom.document.clone().into();
        html5ever::serialize(&mut out, &handle, SerializeOpts::default())?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn wrap(&self, handle: Handle) -> DomNode {
        DomNode {
            handle,
            journal: Rc::clone(&self.journal),
        }
    }
}

/// A node handle bound to its document's journal.
#[derive(Clone)]
pub struct DomNode {
    handle: Handle,
    journal: Rc<RefCell<Journal>>,
}

impl std::fmt::Debug for DomNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag_name() {
            Some(tag) => write!(f, "<{tag}>"),
            None => write!(f, "#node"),
        }
    }
}

impl DomNode {
    /// Parse `html` as a body fragment and append the resulting nodes.
    ///
    /// Returns the appended top-level nodes.
    pub fn append_html(&self, html: &str) -> Vec<DomNode> {
        let added = fragment_nodes(html);
        for child in &added {
            child.parent.set(Some(Rc::downgrade(&self.handle)));
        }
        self.handle
            .children
            .borrow_mut()
            .extend(added.iter().cloned());
        trace!(count = added.len(), "Appended fragment nodes");

        let wrapped = added.iter().cloned().map(|h| self.wrap(h)).collect();
        self.journal.borrow_mut().push(RawRecord::ChildList {
            target: self.handle.clone(),
            added,
            removed: Vec::new(),
        });
        wrapped
    }

    /// Replace all children with the nodes parsed from `html`.
    pub fn set_inner_html(&self, html: &str) -> Vec<DomNode> {
        let removed = self.handle.children.take();
        for child in &removed {
            child.parent.set(None);
        }
        if !removed.is_empty() {
            self.journal.borrow_mut().push(RawRecord::ChildList {
                target: self.handle.clone(),
                added: Vec::new(),
                removed,
            });
        }
        self.append_html(html)
    }

    fn wrap(&self, handle: Handle) -> DomNode {
        DomNode {
            handle,
            journal: Rc::clone(&self.journal),
        }
    }
}

impl QueryableNode for DomNode {
    fn tag_name(&self) -> Option<String> {
        match &self.handle.data {
            NodeData::Element { name, .. } => {
                let local: &str = &name.local;
                Some(local.to_ascii_lowercase())
            }
            _ => None,
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match &self.handle.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|a| attr_named(a, name))
                .map(|a| a.value.to_string()),
            _ => None,
        }
    }

    fn set_attribute(&self, name: &str, value: &str) {
        let NodeData::Element { attrs, .. } = &self.handle.data else {
            return;
        };
        {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter().position(|a| attr_named(a, name)) {
                Some(index) => attrs[index].value = StrTendril::from_slice(value),
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(name)),
                    value: StrTendril::from_slice(value),
                }),
            }
        }
        self.journal.borrow_mut().push(RawRecord::Attribute {
            target: self.handle.clone(),
            name: name.to_ascii_lowercase(),
        });
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.handle, &mut out);
        out
    }

    fn parent_element(&self) -> Option<Self> {
        let weak = self.handle.parent.take();
        let parent = weak.as_ref().and_then(|w| w.upgrade());
        self.handle.parent.set(weak);
        parent
            .filter(|p| matches!(p.data, NodeData::Element { .. }))
            .map(|p| self.wrap(p))
    }

    fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack: Vec<Handle> = self.handle.children.borrow().iter().rev().cloned().collect();
        while let Some(node) = stack.pop() {
            if matches!(node.data, NodeData::Element { .. }) {
                out.push(self.wrap(node.clone()));
            }
            stack.extend(node.children.borrow().iter().rev().cloned());
        }
        out
    }

    fn is_same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.handle, &other.handle)
    }
}

fn attr_named(attr: &Attribute, name: &str) -> bool {
    let local: &str = &attr.name.local;
    local.eq_ignore_ascii_case(name)
}

fn collect_text(handle: &Handle, out: &mut String) {
    if let NodeData::Text { contents } = &handle.data {
        out.push_str(&contents.borrow());
    }
    for child in handle.children.borrow().iter() {
        collect_text(child, out);
    }
}

fn fragment_nodes(html: &str) -> Vec<Handle> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new()).one(html);
    // The fragment parser wraps its output in a single <html> element.
    let wrapper = dom.document.children.borrow().first().cloned();
    wrapper.map(|w| w.children.take()).unwrap_or_default()
}
