//! DOM Tree (arena-based allocation)
//!
//! Owns every node and the physical (rendered) child lists. Physical links are
//! only changed through the primitives here; the logical store, distributor and
//! composer build on top of them.

use crate::error::{DomResult, ShadowError};
use crate::node::{Node, NodeData};
use crate::NodeId;

/// Arena-based DOM tree with generational ids
#[derive(Debug, Default)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    live: usize,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index];
            self.nodes[index] = Some(Node::new(data, generation));
            return NodeId::new(index as u32, generation);
        }
        let index = self.nodes.len();
        self.nodes.push(Some(Node::new(data, 0)));
        self.generations.push(0);
        NodeId::new(index as u32, 0)
    }

    /// Release a node slot. Links pointing at it become stale.
    pub(crate) fn free(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let index = id.index();
        self.nodes[index] = None;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push(index);
        self.live -= 1;
    }

    /// Whether `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .filter(|node| node.generation == id.generation())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .filter(|node| node.generation == id.generation())
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.get(id).expect("dangling NodeId")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.get_mut(id).expect("dangling NodeId")
    }

    pub(crate) fn require(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(ShadowError::NotFound(id))
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ---- physical tree ----

    /// Rendered parent
    pub fn physical_parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.physical.parent)
    }

    /// Rendered children in order
    pub fn physical_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = Vec::new();
        let mut current = self.get(id).and_then(|n| n.physical.first_child);
        while let Some(child) = current {
            children.push(child);
            current = self.node(child).physical.next_sibling;
        }
        children
    }

    pub(crate) fn physical_first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.physical.first_child)
    }

    pub(crate) fn physical_last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.physical.last_child)
    }

    pub(crate) fn physical_next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.physical.next_sibling)
    }

    pub(crate) fn physical_prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.physical.prev_sibling)
    }

    /// Whether `ancestor` is `node` or one of its rendered ancestors
    pub(crate) fn is_physical_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            current = self.physical_parent(id);
        }
        false
    }

    /// Insert `child` into `parent`'s rendered children before `reference`
    /// (or at the end). The child is detached from its old parent first.
    pub(crate) fn physical_insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.require(parent)?;
        self.require(child)?;
        if self.is_physical_inclusive_ancestor(child, parent) {
            return Err(ShadowError::HierarchyRequest(
                "rendered insertion would create a cycle",
            ));
        }
        let mut reference = reference;
        if reference == Some(child) {
            reference = self.physical_next_sibling(child);
        }
        if let Some(r) = reference {
            if self.physical_parent(r) != Some(parent) {
                return Err(ShadowError::NotAChild { parent, child: r });
            }
        }
        self.physical_remove(child);
        self.link_physical(parent, child, reference);
        Ok(())
    }

    /// Append a detached node without validation. Only for fresh nodes.
    pub(crate) fn physical_append_fresh(&mut self, parent: NodeId, child: NodeId) {
        self.link_physical(parent, child, None);
    }

    fn link_physical(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let prev = match reference {
            Some(r) => self.node(r).physical.prev_sibling,
            None => self.node(parent).physical.last_child,
        };
        {
            let node = self.node_mut(child);
            node.physical.parent = Some(parent);
            node.physical.prev_sibling = prev;
            node.physical.next_sibling = reference;
        }
        match prev {
            Some(p) => self.node_mut(p).physical.next_sibling = Some(child),
            None => self.node_mut(parent).physical.first_child = Some(child),
        }
        match reference {
            Some(r) => self.node_mut(r).physical.prev_sibling = Some(child),
            None => self.node_mut(parent).physical.last_child = Some(child),
        }
        self.invalidate_children(parent);
    }

    /// Detach `child` from its rendered parent. Returns false if it had none.
    pub(crate) fn physical_remove(&mut self, child: NodeId) -> bool {
        let Some(node) = self.get(child) else {
            return false;
        };
        let Some(parent) = node.physical.parent else {
            return false;
        };
        let prev = node.physical.prev_sibling;
        let next = node.physical.next_sibling;
        match prev {
            Some(p) => self.node_mut(p).physical.next_sibling = next,
            None => self.node_mut(parent).physical.first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).physical.prev_sibling = prev,
            None => self.node_mut(parent).physical.last_child = prev,
        }
        let node = self.node_mut(child);
        node.physical.parent = None;
        node.physical.prev_sibling = None;
        node.physical.next_sibling = None;
        self.invalidate_children(parent);
        true
    }

    /// Drop the cached child snapshot of `container`
    pub(crate) fn invalidate_children(&mut self, container: NodeId) {
        if let Some(node) = self.get_mut(container) {
            node.logical.child_cache.take();
        }
    }
}
