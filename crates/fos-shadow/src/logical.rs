//! Logical tree store
//!
//! The author-visible tree. Containers that take part in composition have
//! their children recorded here; everything else reads through to the
//! physical tree.

use std::cmp::Ordering;

use crate::node::Link;
use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    /// Whether `container`'s children are recorded in the logical store
    pub fn tracks_logical_children(&self, container: NodeId) -> bool {
        self.get(container)
            .is_some_and(|n| n.tracks_logical_children())
    }

    /// Start tracking `container`, snapshotting its current physical children
    /// as its logical children. No-op if already tracked.
    pub(crate) fn ensure_logical_children(&mut self, container: NodeId) {
        if !self.contains(container) || self.tracks_logical_children(container) {
            return;
        }
        let children = self.physical_children(container);
        for (i, &child) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            let links = &mut self.node_mut(child).logical;
            links.parent = Link::Node(container);
            links.prev_sibling = Link::from_option(prev);
            links.next_sibling = Link::from_option(next);
        }
        let links = &mut self.node_mut(container).logical;
        links.first_child = Link::from_option(children.first().copied());
        links.last_child = Link::from_option(children.last().copied());
        links.child_cache.take();
    }

    /// Record `node` as a logical child of `container` before `reference`.
    ///
    /// Fragments are expanded: their children are moved in order and the
    /// fragment is left empty.
    pub(crate) fn record_insert(
        &mut self,
        node: NodeId,
        container: NodeId,
        reference: Option<NodeId>,
    ) {
        if self.node(node).is_fragment() {
            let children = self.logical_children(node).to_vec();
            for child in children {
                self.detach_from_fragment(node, child);
                self.record_insert(child, container, reference);
            }
            return;
        }
        self.ensure_logical_children(container);

        let prev = match reference {
            Some(r) => self.node(r).logical.prev_sibling.node(),
            None => self.node(container).logical.last_child.node(),
        };
        {
            let links = &mut self.node_mut(node).logical;
            links.parent = Link::Node(container);
            links.prev_sibling = Link::from_option(prev);
            links.next_sibling = Link::from_option(reference);
        }
        match prev {
            Some(p) => self.node_mut(p).logical.next_sibling = Link::Node(node),
            None => self.node_mut(container).logical.first_child = Link::Node(node),
        }
        match reference {
            Some(r) => self.node_mut(r).logical.prev_sibling = Link::Node(node),
            None => self.node_mut(container).logical.last_child = Link::Node(node),
        }
        self.invalidate_children(container);
    }

    fn detach_from_fragment(&mut self, fragment: NodeId, child: NodeId) {
        if self.tracks_logical_children(fragment) {
            self.record_remove(child, fragment);
        } else {
            self.forget_logical_position(child);
        }
        self.physical_remove(child);
    }

    /// Unlink `node` from `container`'s recorded children
    pub(crate) fn record_remove(&mut self, node: NodeId, container: NodeId) {
        let (prev, next) = {
            let links = &self.node(node).logical;
            (links.prev_sibling.node(), links.next_sibling.node())
        };
        {
            let links = &mut self.node_mut(container).logical;
            if links.first_child == Link::Node(node) {
                links.first_child = Link::from_option(next);
            }
            if links.last_child == Link::Node(node) {
                links.last_child = Link::from_option(prev);
            }
        }
        if let Some(p) = prev {
            self.node_mut(p).logical.next_sibling = Link::from_option(next);
        }
        if let Some(n) = next {
            self.node_mut(n).logical.prev_sibling = Link::from_option(prev);
        }
        let links = &mut self.node_mut(node).logical;
        links.parent = Link::Absent;
        links.prev_sibling = Link::Absent;
        links.next_sibling = Link::Absent;
        self.invalidate_children(container);
    }

    /// Reset `node`'s own position links so reads fall back to the physical tree
    pub(crate) fn forget_logical_position(&mut self, node: NodeId) {
        let links = &mut self.node_mut(node).logical;
        links.parent = Link::Unknown;
        links.prev_sibling = Link::Unknown;
        links.next_sibling = Link::Unknown;
    }

    // ---- reads ----

    /// Logical parent
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get(node)?;
        match n.logical.parent {
            Link::Node(parent) => Some(parent).filter(|&p| self.contains(p)),
            Link::Absent => None,
            Link::Unknown => n.physical.parent,
        }
    }

    /// Logical children in order
    pub fn child_nodes(&self, container: NodeId) -> &[NodeId] {
        let Some(node) = self.get(container) else {
            return &[];
        };
        node.logical.child_cache.get_or_init(|| {
            if node.tracks_logical_children() {
                let mut children = Vec::new();
                let mut current = node.logical.first_child.node();
                while let Some(child) = current {
                    children.push(child);
                    current = self.get(child).and_then(|c| c.logical.next_sibling.node());
                }
                children
            } else {
                self.physical_children(container)
            }
        })
    }

    pub(crate) fn logical_children(&self, container: NodeId) -> &[NodeId] {
        self.child_nodes(container)
    }

    /// First logical child
    pub fn first_child(&self, container: NodeId) -> Option<NodeId> {
        let node = self.get(container)?;
        match node.logical.first_child {
            Link::Unknown => self.physical_first_child(container),
            link => link.node(),
        }
    }

    /// Last logical child
    pub fn last_child(&self, container: NodeId) -> Option<NodeId> {
        let node = self.get(container)?;
        match node.logical.last_child {
            Link::Unknown => self.physical_last_child(container),
            link => link.node(),
        }
    }

    /// Next logical sibling
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        match self.get(node)?.logical.next_sibling {
            Link::Unknown => self.physical_next_sibling(node),
            link => link.node(),
        }
    }

    /// Previous logical sibling
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        match self.get(node)?.logical.prev_sibling {
            Link::Unknown => self.physical_prev_sibling(node),
            link => link.node(),
        }
    }

    /// Ancestors from the logical root down to `node`
    fn ancestor_chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent_node(current) {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Topmost logical ancestor. Shadow roots are tree roots.
    pub fn root_node(&self, node: NodeId) -> NodeId {
        self.ancestor_chain(node)[0]
    }

    /// Shadow root whose tree contains `node`, if any
    pub fn containing_shadow_root(&self, node: NodeId) -> Option<NodeId> {
        let root = self.root_node(node);
        self.get(root)
            .filter(|n| n.is_shadow_root())
            .map(|_| root)
    }

    /// Whether `ancestor` is `node` or a logical ancestor of it
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.len() {
                return false;
            }
            current = self.parent_node(id);
        }
        false
    }

    /// Compare two nodes in logical tree order. Nodes in different trees
    /// compare by arena index.
    pub fn compare_tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let chain_a = self.ancestor_chain(a);
        let chain_b = self.ancestor_chain(b);
        let common = chain_a
            .iter()
            .zip(chain_b.iter())
            .take_while(|(x, y)| x == y)
            .count();
        if common == 0 {
            return a.index().cmp(&b.index());
        }
        if common == chain_a.len() {
            return Ordering::Less;
        }
        if common == chain_b.len() {
            return Ordering::Greater;
        }
        let siblings = self.logical_children(chain_a[common - 1]);
        let pos_a = siblings.iter().position(|&c| c == chain_a[common]);
        let pos_b = siblings.iter().position(|&c| c == chain_b[common]);
        pos_a.cmp(&pos_b)
    }

    /// `node` and its logical descendants in preorder. Does not enter shadow roots.
    pub fn inclusive_descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if out.contains(&current) {
                continue;
            }
            out.push(current);
            stack.extend(self.logical_children(current).iter().rev().copied());
        }
        out
    }
}
