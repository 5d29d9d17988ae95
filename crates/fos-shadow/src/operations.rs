//! DOM Node Operations
//!
//! Core node manipulation: attachShadow, appendChild, insertBefore,
//! removeChild, replaceChild and attribute changes.
//!
//! Mutations inside composed containers only touch the logical tree and
//! schedule a render; everywhere else the physical tree is updated directly.

use tracing::debug;

use crate::document::Document;
use crate::error::{DomResult, ShadowError};
use crate::node::{Link, NodeData, NodeType, NAME_ATTR, SLOT_ATTR};
use crate::shadow::{ShadowRoot, ShadowRootInit};
use crate::NodeId;

impl Document {
    /// Attach a shadow root to `host`.
    ///
    /// The host's current children become its logical children; the first
    /// render replaces its physical children with the composed content.
    pub fn attach_shadow(&mut self, host: NodeId, init: ShadowRootInit) -> DomResult<NodeId> {
        let node = self.tree.require(host)?;
        let element = node.as_element().ok_or(ShadowError::NotSupported)?;
        if element.shadow_root.is_some() {
            return Err(ShadowError::AlreadyAttached);
        }
        let connected = node.connected;

        let root = self
            .tree
            .alloc(NodeData::ShadowRoot(ShadowRoot::new(host, init.mode)));
        {
            let root_node = self.tree.node_mut(root);
            root_node.logical.parent = Link::Absent;
            root_node.logical.prev_sibling = Link::Absent;
            root_node.logical.next_sibling = Link::Absent;
            root_node.connected = connected;
        }
        self.tree.ensure_logical_children(root);
        self.tree.ensure_logical_children(host);
        if let Some(element) = self.tree.node_mut(host).as_element_mut() {
            element.shadow_root = Some(root);
        }
        debug!(?host, ?root, mode = ?init.mode, "attached shadow root");
        self.schedule_render(root);
        Ok(root)
    }

    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` before `reference` (or at the end).
    ///
    /// Fragments insert their children. A node with a parent is removed from
    /// it first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insertion(parent, node, reference)?;
        let mut reference = reference;
        if reference == Some(node) {
            reference = self.tree.next_sibling(node);
        }

        let nodes = if self.tree.node(node).is_fragment() {
            self.tree.logical_children(node).to_vec()
        } else {
            vec![node]
        };
        let old_scopes: Vec<Option<String>> = nodes.iter().map(|&n| self.scope_name(n)).collect();
        for &n in &nodes {
            if let Some(old_parent) = self.tree.parent_node(n) {
                self.detach(old_parent, n);
            }
        }

        let owner_root = self.tree.containing_shadow_root(parent);
        let mut slots = Vec::new();
        if owner_root.is_some() {
            for &n in &nodes {
                self.tree.collect_slots(n, &mut slots);
            }
            for &slot in &slots {
                self.tree.ensure_logical_children(slot);
                let container = self.tree.parent_node(slot).unwrap_or(parent);
                self.tree.ensure_logical_children(container);
            }
        }

        if self.tree.tracks_logical_children(parent) {
            for &n in &nodes {
                self.tree.record_insert(n, parent, reference);
            }
            if let Some(root) = owner_root.filter(|_| !slots.is_empty()) {
                self.tree.add_slots(root, &slots);
                self.schedule_render(root);
            }
            if self.is_composed_container(parent) {
                self.schedule_for_container(parent, owner_root);
            } else {
                // plain tracked container: mirror physically
                let before = reference.filter(|&r| self.tree.physical_parent(r) == Some(parent));
                for &n in &nodes {
                    self.tree.physical_insert_before(parent, n, before)?;
                }
            }
        } else {
            for &n in &nodes {
                self.tree.forget_logical_position(n);
                self.tree.physical_insert_before(parent, n, reference)?;
            }
            if let Some(root) = owner_root.filter(|_| !slots.is_empty()) {
                self.tree.add_slots(root, &slots);
                self.schedule_render(root);
            }
        }

        for (&n, old_scope) in nodes.iter().zip(old_scopes) {
            let new_scope = self.scope_name(n);
            self.hooks
                .scope_changed(n, old_scope.as_deref(), new_scope.as_deref());
            self.connection_candidates.push(n);
        }
        Ok(node)
    }

    fn validate_insertion(
        &self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.tree.require(parent)?;
        let child = self.tree.require(node)?;
        if let Some(r) = reference {
            self.tree.require(r)?;
        }
        if !parent_node.can_have_children() {
            return Err(ShadowError::HierarchyRequest("parent cannot have children"));
        }
        match child.node_type() {
            NodeType::Document => {
                return Err(ShadowError::HierarchyRequest("cannot insert a document"));
            }
            NodeType::ShadowRoot => {
                return Err(ShadowError::HierarchyRequest("cannot insert a shadow root"));
            }
            _ => {}
        }
        if self.tree.is_inclusive_ancestor(node, parent) {
            return Err(ShadowError::HierarchyRequest(
                "node is an inclusive ancestor of the parent",
            ));
        }
        if let Some(r) = reference {
            if self.tree.parent_node(r) != Some(parent) {
                return Err(ShadowError::NotAChild { parent, child: r });
            }
        }
        Ok(())
    }

    /// Remove `node` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<NodeId> {
        self.tree.require(parent)?;
        self.tree.require(node)?;
        if self.tree.parent_node(node) != Some(parent) {
            return Err(ShadowError::NotAChild {
                parent,
                child: node,
            });
        }
        let old_scope = self.scope_name(node);
        self.detach(parent, node);
        self.hooks.scope_changed(node, old_scope.as_deref(), None);
        self.connection_candidates.push(node);
        Ok(node)
    }

    /// Replace `old` with `node`
    pub fn replace_child(&mut self, parent: NodeId, node: NodeId, old: NodeId) -> DomResult<NodeId> {
        self.tree.require(old)?;
        if self.tree.parent_node(old) != Some(parent) {
            return Err(ShadowError::NotAChild { parent, child: old });
        }
        if node == old {
            return Ok(old);
        }
        self.validate_insertion(parent, node, None)?;
        let mut reference = self.tree.next_sibling(old);
        if reference == Some(node) {
            reference = self.tree.next_sibling(node);
        }
        self.remove_child(parent, old)?;
        self.insert_before(parent, node, reference)?;
        Ok(old)
    }

    /// Unlink `node` from `parent` in both trees and schedule affected renders
    fn detach(&mut self, parent: NodeId, node: NodeId) {
        let owner_root = self.tree.containing_shadow_root(parent);

        if let Some(root) = owner_root {
            let removed = self.tree.remove_slots_in(root, node);
            if !removed.is_empty() {
                self.release_slots(&removed);
                self.schedule_render(root);
            }
        }
        if let Some(slot) = self.tree.node(node).assigned_slot {
            if let Some(root) = self.tree.get(slot).and_then(|s| s.slot.as_ref()).map(|d| d.root) {
                self.schedule_render(root);
            }
            // a removed node no longer routes through its old slot
            self.tree.node_mut(node).assigned_slot = None;
        }

        if self.tree.tracks_logical_children(parent) {
            self.tree.record_remove(node, parent);
            if self.is_composed_container(parent) {
                self.schedule_for_container(parent, owner_root);
            }
        } else {
            self.tree.forget_logical_position(node);
        }
        self.tree.physical_remove(node);
    }

    /// Drop slot records of unregistered slots and put their content back
    /// under their containers physically
    fn release_slots(&mut self, slots: &[NodeId]) {
        let mut containers = Vec::new();
        for &slot in slots {
            let Some(data) = self.tree.node_mut(slot).slot.take() else {
                continue;
            };
            for node in data.assigned_nodes {
                if let Some(n) = self.tree.get_mut(node) {
                    if n.assigned_slot == Some(slot) {
                        n.assigned_slot = None;
                    }
                }
            }
            for node in data.flattened_nodes {
                self.tree.physical_remove(node);
            }
            let fallback = self.tree.logical_children(slot).to_vec();
            self.tree.update_child_nodes(slot, &fallback);
            if let Some(parent) = self.tree.parent_node(slot) {
                if !containers.contains(&parent) {
                    containers.push(parent);
                }
            }
        }
        for container in containers {
            if !self.is_composed_container(container) {
                let children = self.tree.logical_children(container).to_vec();
                self.tree.update_child_nodes(container, &children);
            }
        }
    }

    /// Containers whose physical children come from composition
    fn is_composed_container(&self, container: NodeId) -> bool {
        let node = self.tree.node(container);
        node.is_shadow_root()
            || node.hosted_root().is_some()
            || node.slot.is_some()
            || node.child_slot_count > 0
    }

    fn schedule_for_container(&mut self, container: NodeId, owner_root: Option<NodeId>) {
        let node = self.tree.node(container);
        let hosted = node.hosted_root();
        let is_root = node.is_shadow_root();
        let holds_slots = node.slot.is_some() || node.child_slot_count > 0;

        if let Some(root) = hosted {
            self.schedule_render(root);
        }
        if is_root {
            self.schedule_render(container);
        }
        if let Some(root) = owner_root.filter(|_| holds_slots) {
            self.schedule_render(root);
        }
    }

    // ---- attributes ----

    /// Set an element attribute
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        if !self.tree.require(node)?.is_element() {
            return Err(ShadowError::NotAnElement(node));
        }
        let old = self
            .tree
            .node_mut(node)
            .as_element_mut()
            .and_then(|e| e.set_attr(name, value));
        if old.as_deref() != Some(value) {
            self.attribute_changed(node, name);
        }
        Ok(())
    }

    /// Remove an element attribute. Returns the removed value.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        if !self.tree.require(node)?.is_element() {
            return Err(ShadowError::NotAnElement(node));
        }
        let old = self
            .tree
            .node_mut(node)
            .as_element_mut()
            .and_then(|e| e.remove_attr(name));
        if old.is_some() {
            self.attribute_changed(node, name);
        }
        Ok(old)
    }

    fn attribute_changed(&mut self, node: NodeId, name: &str) {
        if name == SLOT_ATTR {
            if let Some(root) = self
                .tree
                .parent_node(node)
                .and_then(|parent| self.tree.hosted_root(parent))
            {
                self.schedule_render(root);
            }
            if let Some(root) = self
                .tree
                .node(node)
                .assigned_slot
                .and_then(|slot| self.tree.get(slot))
                .and_then(|s| s.slot.as_ref())
                .map(|d| d.root)
            {
                self.schedule_render(root);
            }
        }
        if name == NAME_ATTR {
            if let Some(root) = self.tree.node(node).slot.as_ref().map(|d| d.root) {
                if self.tree.rename_slot(root, node) {
                    self.schedule_render(root);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::RenderState;

    #[test]
    fn test_fast_path_outside_shadow_trees() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let span = doc.create_element("span");
        doc.append_child(doc.body(), div).unwrap();
        doc.append_child(div, span).unwrap();

        assert!(!doc.tree().tracks_logical_children(div));
        assert_eq!(doc.composed_children(div), vec![span]);
        assert_eq!(doc.parent_node(span), Some(div));
    }

    #[test]
    fn test_insert_rejects_ancestor() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(ShadowError::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.append_child(outer, outer),
            Err(ShadowError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_insert_into_text_rejected() {
        let mut doc = Document::new();
        let text = doc.create_text("t");
        let div = doc.create_element("div");
        assert!(matches!(
            doc.append_child(text, div),
            Err(ShadowError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_reference_must_be_child() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let stray = doc.create_element("p");
        let node = doc.create_element("span");
        assert!(matches!(
            doc.insert_before(div, node, Some(stray)),
            Err(ShadowError::NotAChild { .. })
        ));
        assert!(matches!(doc.remove_child(div, stray), Err(ShadowError::NotAChild { .. })));
    }

    #[test]
    fn test_attach_twice() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        doc.attach_shadow(host, ShadowRootInit::open()).unwrap();
        assert!(matches!(
            doc.attach_shadow(host, ShadowRootInit::open()),
            Err(ShadowError::AlreadyAttached)
        ));
        let text = doc.create_text("t");
        assert!(matches!(
            doc.attach_shadow(text, ShadowRootInit::open()),
            Err(ShadowError::NotSupported)
        ));
    }

    #[test]
    fn test_host_mutation_defers_physical_update() {
        let mut doc = Document::new();
        let host = doc.create_element("div");
        let body = doc.body();
        doc.append_child(body, host).unwrap();
        let root = doc.attach_shadow(host, ShadowRootInit::open()).unwrap();
        doc.flush().unwrap();
        assert_eq!(doc.render_state(root), Some(RenderState::Clean));

        let child = doc.create_element("p");
        doc.append_child(host, child).unwrap();
        assert_eq!(doc.child_nodes(host), vec![child]);
        assert!(doc.composed_children(host).is_empty());
        assert_eq!(doc.render_state(root), Some(RenderState::RenderPending));

        // no slot: the child is not rendered
        doc.flush().unwrap();
        assert!(doc.composed_children(host).is_empty());
    }

    #[test]
    fn test_replace_child() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("c");
        doc.append_child(div, a).unwrap();
        doc.append_child(div, b).unwrap();

        assert_eq!(doc.replace_child(div, c, a).unwrap(), a);
        assert_eq!(doc.child_nodes(div), vec![c, b]);
        assert_eq!(doc.parent_node(a), None);
    }
}
