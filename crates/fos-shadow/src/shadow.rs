//! Shadow roots and slots
//!
//! Per-root and per-slot records. The shadow root record lives inside the
//! root node's data; slot records live on slot element nodes while they are
//! registered with a root.

use std::collections::HashMap;

use crate::NodeId;

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// Shadow root initialization options
#[derive(Debug, Clone, Default)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
}

impl ShadowRootInit {
    pub fn open() -> Self {
        Self {
            mode: ShadowRootMode::Open,
        }
    }

    pub fn closed() -> Self {
        Self {
            mode: ShadowRootMode::Closed,
        }
    }
}

/// Render lifecycle of a shadow root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Clean,
    RenderPending,
    Rendering,
}

/// Shadow root record
#[derive(Debug, Clone)]
pub struct ShadowRoot {
    pub(crate) host: NodeId,
    pub(crate) mode: ShadowRootMode,
    pub(crate) state: RenderState,
    pub(crate) has_rendered: bool,
    /// Registered slots in registration order
    pub(crate) slot_list: Vec<NodeId>,
    /// Slots by name, each bucket in tree order
    pub(crate) slot_map: HashMap<String, Vec<NodeId>>,
}

impl ShadowRoot {
    /// Create a new shadow root
    pub fn new(host: NodeId, mode: ShadowRootMode) -> Self {
        Self {
            host,
            mode,
            state: RenderState::Clean,
            has_rendered: false,
            slot_list: Vec::new(),
            slot_map: HashMap::new(),
        }
    }

    /// Host element
    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.mode
    }

    pub fn render_state(&self) -> RenderState {
        self.state
    }

    /// Whether the root completed at least one render
    pub fn has_rendered(&self) -> bool {
        self.has_rendered
    }

    /// Get all registered slots
    pub fn slots(&self) -> &[NodeId] {
        &self.slot_list
    }

    pub fn has_slots(&self) -> bool {
        !self.slot_list.is_empty()
    }

    /// Slots sharing `name`, in tree order
    pub fn slots_named(&self, name: &str) -> &[NodeId] {
        self.slot_map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The slot that receives nodes projected under `name`
    pub fn find_slot(&self, name: &str) -> Option<NodeId> {
        self.slots_named(name).first().copied()
    }
}

/// Registered slot record
#[derive(Debug, Clone)]
pub struct SlotData {
    /// Slot name (empty string for the catch-all slot)
    pub(crate) name: String,
    /// Root the slot is registered with
    pub(crate) root: NodeId,
    /// Host children assigned by the last distribution
    pub(crate) assigned_nodes: Vec<NodeId>,
    /// Assignment snapshot held during a distribution pass
    pub(crate) previously_assigned: Option<Vec<NodeId>>,
    /// The slot's own children, used when nothing is assigned
    pub(crate) fallback_nodes: Vec<NodeId>,
    /// Content with nested slots replaced by their own content
    pub(crate) flattened_nodes: Vec<NodeId>,
    /// Assignment changed during the running pass
    pub(crate) dirty: bool,
}

impl SlotData {
    pub(crate) fn new(name: impl Into<String>, root: NodeId) -> Self {
        Self {
            name: name.into(),
            root,
            assigned_nodes: Vec::new(),
            previously_assigned: None,
            fallback_nodes: Vec::new(),
            flattened_nodes: Vec::new(),
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root the slot is registered with
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn assigned_nodes(&self) -> &[NodeId] {
        &self.assigned_nodes
    }

    pub fn flattened_nodes(&self) -> &[NodeId] {
        &self.flattened_nodes
    }

    /// Assign a node to this slot
    pub(crate) fn assign(&mut self, node: NodeId) -> bool {
        if !self.assigned_nodes.contains(&node) {
            self.assigned_nodes.push(node);
            true
        } else {
            false
        }
    }

    /// Start a distribution pass: move the assignment aside and clear derived state
    pub(crate) fn begin_pass(&mut self) -> &[NodeId] {
        let previous = std::mem::take(&mut self.assigned_nodes);
        self.fallback_nodes.clear();
        self.flattened_nodes.clear();
        self.previously_assigned.insert(previous)
    }

    /// Get effective content (assigned or fallback)
    pub fn effective_content(&self) -> &[NodeId] {
        if self.assigned_nodes.is_empty() {
            &self.fallback_nodes
        } else {
            &self.assigned_nodes
        }
    }

    /// Check if slot is using fallback content
    pub fn is_using_fallback(&self) -> bool {
        self.assigned_nodes.is_empty() && !self.fallback_nodes.is_empty()
    }
}
