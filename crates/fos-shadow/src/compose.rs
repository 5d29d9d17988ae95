//! Composition
//!
//! Rebuilds physical child lists from the logical tree: a host renders its
//! shadow root's children, and every container of a slot renders its children
//! with each slot replaced by the slot's flattened content.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::splice::{apply_splices, calculate_splices, SpliceTarget};
use crate::tree::DomTree;
use crate::NodeId;

/// Physical child list of one container as a splice target
struct PhysicalChildren<'a> {
    tree: &'a mut DomTree,
    container: NodeId,
}

impl SpliceTarget<NodeId> for PhysicalChildren<'_> {
    fn remove(&mut self, node: NodeId) {
        if self.tree.physical_parent(node) == Some(self.container) {
            self.tree.physical_remove(node);
        }
    }

    fn insert_before(&mut self, node: NodeId, before: Option<NodeId>) {
        let before = before.filter(|&b| self.tree.physical_parent(b) == Some(self.container));
        if let Err(err) = self.tree.physical_insert_before(self.container, node, before) {
            warn!(container = ?self.container, ?node, %err, "skipping composed child");
        }
    }
}

impl DomTree {
    /// Desired physical children of `container`: its logical children with
    /// registered slots replaced by their flattened content.
    pub(crate) fn composed_child_list(&self, container: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        let mut seen = HashSet::new();
        for &child in self.logical_children(container) {
            let expanded = match self.node(child).slot.as_ref() {
                Some(data) => data.flattened_nodes.as_slice(),
                None => std::slice::from_ref(&child),
            };
            for &node in expanded {
                if seen.insert(node) {
                    out.push(node);
                } else {
                    warn!(?container, ?node, "node composed twice, keeping first position");
                }
            }
        }
        out
    }

    /// Recompose the host of `root` and every plain container of `root`'s slots.
    pub(crate) fn compose(&mut self, root: NodeId) {
        let host = self.shadow(root).host;
        let desired = self.composed_child_list(root);
        self.update_child_nodes(host, &desired);

        let mut containers = Vec::new();
        for slot in self.shadow(root).slot_list.clone() {
            let Some(parent) = self.parent_node(slot) else {
                continue;
            };
            // hosts are recomposed by their own root, slots by their parent
            if parent == root
                || self.is_registered_slot(parent)
                || self.hosted_root(parent).is_some()
                || containers.contains(&parent)
            {
                continue;
            }
            containers.push(parent);
        }
        for container in containers {
            let desired = self.composed_child_list(container);
            self.update_child_nodes(container, &desired);
        }
    }

    /// Reconcile `container`'s physical children with `desired` using a
    /// minimal splice sequence.
    pub(crate) fn update_child_nodes(&mut self, container: NodeId, desired: &[NodeId]) {
        let mut current = self.physical_children(container);
        let splices = calculate_splices(desired, &current);
        if splices.is_empty() {
            return;
        }
        trace!(?container, splices = splices.len(), "reconciling physical children");
        let mut target = PhysicalChildren {
            tree: self,
            container,
        };
        apply_splices(&mut target, &mut current, &splices);
    }
}

#[cfg(test)]
mod tests {
    use crate::{Document, ShadowRootInit};

    #[test]
    fn test_composed_list_keeps_first_position() {
        let mut doc = Document::new();
        let host = doc.create_element("x-list");
        let body = doc.body();
        doc.append_child(body, host).unwrap();
        let root = doc.attach_shadow(host, ShadowRootInit::open()).unwrap();
        let first = doc.create_element("slot");
        doc.set_attribute(first, "name", "a").unwrap();
        let second = doc.create_element("slot");
        doc.append_child(root, first).unwrap();
        doc.append_child(root, second).unwrap();

        let items: Vec<_> = (0..64).map(|_| doc.create_element("li")).collect();
        for &item in &items {
            doc.append_child(host, item).unwrap();
        }
        doc.flush().unwrap();
        assert_eq!(doc.tree.composed_child_list(root), items);

        // same node flattened into both slots
        let shared = items[10];
        doc.tree.node_mut(first).slot.as_mut().unwrap().flattened_nodes = vec![shared];
        let list = doc.tree.composed_child_list(root);
        assert_eq!(list.len(), items.len());
        assert_eq!(list[0], shared);
        assert_eq!(list.iter().filter(|&&n| n == shared).count(), 1);
    }
}
