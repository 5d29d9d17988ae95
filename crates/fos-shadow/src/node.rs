//! DOM Node - arena record
//!
//! Every node carries two sets of tree links:
//! - physical links: the rendered tree, changed only by [`crate::DomTree`] primitives
//! - logical links: the author-visible tree, changed only by the logical store
//!
//! Logical links are tri-state. `Link::Unknown` means "never recorded", and
//! readers fall back to the physical link. Containers that take part in shadow
//! composition (hosts, shadow roots, slots and slot parents) always have their
//! children recorded.

use std::cell::OnceCell;

use crate::NodeId;
use crate::shadow::{ShadowRoot, SlotData};

/// Local name that marks an element as a projection point
pub const SLOT_TAG: &str = "slot";
/// Attribute naming the slot a host child wants to be projected into
pub const SLOT_ATTR: &str = "slot";
/// Attribute naming a slot
pub const NAME_ATTR: &str = "name";
/// Name of the catch-all slot
pub const DEFAULT_SLOT_NAME: &str = "";

/// Tri-state logical link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Link {
    /// Not recorded; read the physical tree instead
    #[default]
    Unknown,
    /// Recorded as empty
    Absent,
    /// Recorded node
    Node(NodeId),
}

impl Link {
    #[inline]
    pub(crate) fn from_option(node: Option<NodeId>) -> Self {
        match node {
            Some(id) => Link::Node(id),
            None => Link::Absent,
        }
    }

    /// Recorded node, if any
    #[inline]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Link::Node(id) => Some(id),
            _ => None,
        }
    }

    /// Whether the link was ever recorded
    #[inline]
    pub fn is_known(self) -> bool {
        !matches!(self, Link::Unknown)
    }
}

/// Links of the rendered tree
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PhysicalLinks {
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

/// Links of the author-visible tree
#[derive(Debug, Default)]
pub(crate) struct LogicalLinks {
    pub parent: Link,
    pub first_child: Link,
    pub last_child: Link,
    pub prev_sibling: Link,
    pub next_sibling: Link,
    /// Ordered child snapshot, dropped whenever this node's children change
    pub child_cache: OnceCell<Vec<NodeId>>,
}

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    DocumentFragment,
    ShadowRoot,
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Fragment; its children are moved on insertion
    DocumentFragment,
    /// Shadow root attached to a host element
    ShadowRoot(ShadowRoot),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lowercase local name
    pub local_name: String,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Attached shadow root
    pub(crate) shadow_root: Option<NodeId>,
}

impl ElementData {
    pub fn new(local_name: &str) -> Self {
        Self {
            local_name: local_name.to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                return Some(std::mem::replace(&mut attr.value, value.to_string()));
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(index).value)
    }

    /// Attached shadow root, regardless of mode
    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// DOM Node - arena record
#[derive(Debug)]
pub struct Node {
    pub(crate) generation: u32,
    pub(crate) data: NodeData,
    pub(crate) physical: PhysicalLinks,
    pub(crate) logical: LogicalLinks,
    /// Slot this node is currently assigned to
    pub(crate) assigned_slot: Option<NodeId>,
    /// Assignment at the start of the running distribution pass
    pub(crate) prev_assigned_slot: Option<NodeId>,
    /// Present while this node is a registered slot
    pub(crate) slot: Option<SlotData>,
    /// Registered slots among this node's logical children
    pub(crate) child_slot_count: usize,
    /// Last connection status reported to the connection hook
    pub(crate) connected: bool,
}

impl Node {
    pub(crate) fn new(data: NodeData, generation: u32) -> Self {
        Self {
            generation,
            data,
            physical: PhysicalLinks::default(),
            logical: LogicalLinks::default(),
            assigned_slot: None,
            prev_assigned_slot: None,
            slot: None,
            child_slot_count: 0,
            connected: false,
        }
    }

    /// Node kind
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
            NodeData::DocumentFragment => NodeType::DocumentFragment,
            NodeData::ShadowRoot(_) => NodeType::ShadowRoot,
        }
    }

    /// Node-specific data
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn is_fragment(&self) -> bool {
        matches!(self.data, NodeData::DocumentFragment)
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    #[inline]
    pub fn is_shadow_root(&self) -> bool {
        matches!(self.data, NodeData::ShadowRoot(_))
    }

    /// Whether this node can hold children
    pub fn can_have_children(&self) -> bool {
        !matches!(self.data, NodeData::Text(_) | NodeData::Comment(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Shadow root record if this node is a shadow root
    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRoot> {
        match &self.data {
            NodeData::ShadowRoot(root) => Some(root),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_shadow_root_mut(&mut self) -> Option<&mut ShadowRoot> {
        match &mut self.data {
            NodeData::ShadowRoot(root) => Some(root),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Element local name
    pub fn local_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.local_name.as_str())
    }

    /// Element attribute value
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.as_element().and_then(|e| e.get_attr(name))
    }

    /// Element whose local name marks a projection point
    pub fn is_slot_element(&self) -> bool {
        self.local_name() == Some(SLOT_TAG)
    }

    /// Shadow root hosted by this element, regardless of mode
    pub fn hosted_root(&self) -> Option<NodeId> {
        self.as_element().and_then(|e| e.shadow_root)
    }

    /// Registered slot record
    pub fn slot_data(&self) -> Option<&SlotData> {
        self.slot.as_ref()
    }

    /// Whether this node's children are recorded in the logical store
    pub fn tracks_logical_children(&self) -> bool {
        self.logical.first_child.is_known()
    }

    /// Projection name used when distributing this node as a host child
    pub fn projection_name(&self) -> &str {
        self.attribute(SLOT_ATTR).unwrap_or(DEFAULT_SLOT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_attrs() {
        let mut el = ElementData::new("DIV");
        assert_eq!(el.local_name, "div");
        assert_eq!(el.set_attr("slot", "a"), None);
        assert_eq!(el.set_attr("slot", "b"), Some("a".to_string()));
        assert_eq!(el.get_attr("slot"), Some("b"));
        assert_eq!(el.remove_attr("slot"), Some("b".to_string()));
        assert_eq!(el.get_attr("slot"), None);
    }

    #[test]
    fn test_projection_name() {
        let mut node = Node::new(NodeData::Element(ElementData::new("p")), 0);
        assert_eq!(node.projection_name(), DEFAULT_SLOT_NAME);
        node.as_element_mut().unwrap().set_attr(SLOT_ATTR, "title");
        assert_eq!(node.projection_name(), "title");

        let text = Node::new(NodeData::Text("hi".into()), 0);
        assert!(text.is_text());
        assert_eq!(text.as_text(), Some("hi"));
        assert_eq!(text.projection_name(), DEFAULT_SLOT_NAME);
        assert!(!text.can_have_children());
    }

    #[test]
    fn test_link_states() {
        assert!(!Link::Unknown.is_known());
        assert!(Link::Absent.is_known());
        assert_eq!(Link::from_option(None), Link::Absent);
        let id = NodeId::new(3, 0);
        assert_eq!(Link::from_option(Some(id)).node(), Some(id));
    }
}
