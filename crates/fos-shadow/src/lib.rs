//! fOS Shadow - shadow trees with slots
//!
//! Shadow tree emulation for engines without native support. The crate keeps an
//! author-visible (logical) tree next to the rendered (physical) tree and
//! re-derives the physical tree from authoring-time mutations.
//!
//! Key pieces:
//! - Logical tree store: parent/child/sibling links decoupled from the physical tree
//! - Slot registry and distributor: assigns a host's children to named slots,
//!   with fallback content and flattening of nested slots
//! - Render scheduler: batches render requests and reconciles the physical
//!   child lists of affected containers with a minimal splice sequence
//! - Event path composer: composed dispatch path, retargeting, capture/bubble
//!
//! # Example
//! ```rust
//! use fos_shadow::{Document, ShadowRootInit};
//!
//! let mut doc = Document::new();
//! let host = doc.create_element("x-card");
//! doc.append_child(doc.body(), host).unwrap();
//!
//! let root = doc.attach_shadow(host, ShadowRootInit::open()).unwrap();
//! let slot = doc.create_element("slot");
//! doc.append_child(root, slot).unwrap();
//!
//! let title = doc.create_text("Hello");
//! doc.append_child(host, title).unwrap();
//! doc.flush().unwrap();
//!
//! assert_eq!(doc.assigned_nodes(slot, false).unwrap(), vec![title]);
//! assert_eq!(doc.composed_children(host), vec![title]);
//! ```

mod compose;
mod config;
mod distribute;
mod document;
mod error;
pub mod events;
mod hooks;
mod logical;
mod node;
mod operations;
mod render;
mod shadow;
mod slots;
pub mod splice;
mod tree;

pub use config::Config;
pub use document::Document;
pub use error::{DomResult, ListenerError, ShadowError};
pub use events::{Event, EventInit, EventPhase, EventTarget, ListenerId, ListenerOptions, ListenerResult};
pub use hooks::{ConnectionHook, ScopeHook};
pub use node::{
    Attribute, ElementData, Link, Node, NodeData, NodeType, DEFAULT_SLOT_NAME, NAME_ATTR,
    SLOT_ATTR, SLOT_TAG,
};
pub use shadow::{RenderState, ShadowRoot, ShadowRootInit, ShadowRootMode, SlotData};
pub use splice::{calculate_splices, Splice};
pub use tree::DomTree;

/// Node identifier (index into arena, plus generation)
///
/// A destroyed node's index is reused with a bumped generation, so stale
/// identifiers never alias a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self(index, generation)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// Generation of the arena slot this id refers to.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.1
    }
}
