//! Slot registry
//!
//! Tracks the slots of each shadow root: a list in registration order plus a
//! name index whose buckets stay in tree order, so the first slot of a name
//! wins distribution.

use tracing::trace;

use crate::node::{DEFAULT_SLOT_NAME, NAME_ATTR};
use crate::shadow::{ShadowRoot, SlotData};
use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    pub(crate) fn shadow(&self, root: NodeId) -> &ShadowRoot {
        self.node(root)
            .as_shadow_root()
            .expect("node is not a shadow root")
    }

    pub(crate) fn shadow_mut(&mut self, root: NodeId) -> &mut ShadowRoot {
        self.node_mut(root)
            .as_shadow_root_mut()
            .expect("node is not a shadow root")
    }

    pub(crate) fn slot_data(&self, slot: NodeId) -> &SlotData {
        self.node(slot).slot.as_ref().expect("node is not a registered slot")
    }

    pub(crate) fn slot_data_mut(&mut self, slot: NodeId) -> &mut SlotData {
        self.node_mut(slot)
            .slot
            .as_mut()
            .expect("node is not a registered slot")
    }

    /// Whether `node` is a slot registered with some root
    pub fn is_registered_slot(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(|n| n.slot.is_some())
    }

    /// Shadow root hosted by `node`, regardless of mode
    pub fn hosted_root(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.hosted_root())
    }

    /// Current slot name from the `name` attribute
    pub(crate) fn slot_name(&self, slot: NodeId) -> String {
        self.node(slot)
            .attribute(NAME_ATTR)
            .unwrap_or(DEFAULT_SLOT_NAME)
            .to_string()
    }

    /// Slot elements among `node` and its logical descendants that are not
    /// registered yet
    pub(crate) fn collect_slots(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for id in self.inclusive_descendants(node) {
            let n = self.node(id);
            if n.is_slot_element() && n.slot.is_none() && !out.contains(&id) {
                out.push(id);
            }
        }
    }

    /// Register `slots` with `root`. Slots must already be logically inserted.
    pub(crate) fn add_slots(&mut self, root: NodeId, slots: &[NodeId]) {
        for &slot in slots {
            let name = self.slot_name(slot);
            trace!(?root, ?slot, name = %name, "registering slot");
            self.node_mut(slot).slot = Some(SlotData::new(name.clone(), root));
            if let Some(parent) = self.parent_node(slot) {
                self.node_mut(parent).child_slot_count += 1;
            }
            self.shadow_mut(root).slot_list.push(slot);
            self.insert_into_bucket(root, &name, slot);
        }
    }

    fn insert_into_bucket(&mut self, root: NodeId, name: &str, slot: NodeId) {
        let mut bucket = self
            .shadow_mut(root)
            .slot_map
            .remove(name)
            .unwrap_or_default();
        let position = bucket
            .iter()
            .position(|&other| self.compare_tree_order(slot, other).is_lt())
            .unwrap_or(bucket.len());
        bucket.insert(position, slot);
        self.shadow_mut(root).slot_map.insert(name.to_string(), bucket);
    }

    fn remove_from_bucket(&mut self, root: NodeId, name: &str, slot: NodeId) {
        let map = &mut self.shadow_mut(root).slot_map;
        if let Some(bucket) = map.get_mut(name) {
            bucket.retain(|&s| s != slot);
            if bucket.is_empty() {
                map.remove(name);
            }
        }
    }

    /// Unregister every slot of `root` inside `container`'s subtree.
    ///
    /// Must run before `container` is logically unlinked. Slot records stay on
    /// the removed slots until the caller releases them.
    pub(crate) fn remove_slots_in(&mut self, root: NodeId, container: NodeId) -> Vec<NodeId> {
        let removed: Vec<NodeId> = self
            .shadow(root)
            .slot_list
            .iter()
            .copied()
            .filter(|&slot| self.is_inclusive_ancestor(container, slot))
            .collect();
        for &slot in &removed {
            let name = self.slot_data(slot).name.clone();
            trace!(?root, ?slot, name = %name, "unregistering slot");
            self.shadow_mut(root).slot_list.retain(|&s| s != slot);
            self.remove_from_bucket(root, &name, slot);
            if let Some(parent) = self.parent_node(slot) {
                let count = &mut self.node_mut(parent).child_slot_count;
                *count = count.saturating_sub(1);
            }
        }
        removed
    }

    /// Re-index `slot` after its `name` attribute changed.
    /// Returns false if the effective name is unchanged.
    pub(crate) fn rename_slot(&mut self, root: NodeId, slot: NodeId) -> bool {
        let old_name = self.slot_data(slot).name.clone();
        let new_name = self.slot_name(slot);
        if old_name == new_name {
            return false;
        }
        trace!(?slot, from = %old_name, to = %new_name, "renaming slot");
        self.remove_from_bucket(root, &old_name, slot);
        self.slot_data_mut(slot).name = new_name.clone();
        self.insert_into_bucket(root, &new_name, slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ElementData, NodeData};
    use crate::shadow::ShadowRootMode;

    fn setup() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let host = tree.alloc(NodeData::Element(ElementData::new("div")));
        let root = tree.alloc(NodeData::ShadowRoot(ShadowRoot::new(host, ShadowRootMode::Open)));
        tree.ensure_logical_children(root);
        (tree, root)
    }

    fn slot(tree: &mut DomTree, parent: NodeId, name: Option<&str>) -> NodeId {
        let mut data = ElementData::new("slot");
        if let Some(name) = name {
            data.set_attr(NAME_ATTR, name);
        }
        let id = tree.alloc(NodeData::Element(data));
        tree.ensure_logical_children(id);
        tree.record_insert(id, parent, None);
        id
    }

    #[test]
    fn test_buckets_in_tree_order() {
        let (mut tree, root) = setup();
        let second = slot(&mut tree, root, Some("a"));
        let first = slot(&mut tree, root, Some("a"));
        // move `first` ahead of `second`
        tree.record_remove(first, root);
        tree.record_insert(first, root, Some(second));

        tree.add_slots(root, &[second]);
        tree.add_slots(root, &[first]);
        assert_eq!(tree.shadow(root).slots_named("a"), &[first, second]);
        assert_eq!(tree.shadow(root).find_slot("a"), Some(first));
        assert_eq!(tree.node(root).child_slot_count, 2);
    }

    #[test]
    fn test_remove_and_rename() {
        let (mut tree, root) = setup();
        let a = slot(&mut tree, root, Some("a"));
        let default = slot(&mut tree, root, None);
        tree.add_slots(root, &[a, default]);

        tree.node_mut(a).as_element_mut().unwrap().set_attr(NAME_ATTR, "b");
        assert!(tree.rename_slot(root, a));
        assert!(!tree.rename_slot(root, a));
        assert_eq!(tree.shadow(root).find_slot("b"), Some(a));
        assert!(tree.shadow(root).slots_named("a").is_empty());

        let removed = tree.remove_slots_in(root, default);
        assert_eq!(removed, vec![default]);
        assert_eq!(tree.shadow(root).slots(), &[a]);
        assert_eq!(tree.shadow(root).find_slot(""), None);
        assert_eq!(tree.node(root).child_slot_count, 1);
    }
}
