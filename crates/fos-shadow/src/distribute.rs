//! Distribution
//!
//! Assigns a host's logical children to the slots of its shadow root, fills in
//! fallback content, flattens nested slots and reports which slots changed.

use tracing::{trace, warn};

use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    /// Run one distribution pass for `root`.
    ///
    /// Returns the slots whose assignment changed, in registration order.
    pub(crate) fn distribute(&mut self, root: NodeId) -> Vec<NodeId> {
        let slots = self.shadow(root).slot_list.clone();
        if slots.is_empty() {
            return Vec::new();
        }
        let host = self.shadow(root).host;

        for &slot in &slots {
            self.begin_slot_pass(slot);
        }

        let host_children = self.logical_children(host).to_vec();
        for node in host_children {
            self.distribute_node(root, node);
        }

        for &slot in &slots {
            let fallback = if self.slot_data(slot).assigned_nodes.is_empty() {
                self.logical_children(slot).to_vec()
            } else {
                Vec::new()
            };
            self.slot_data_mut(slot).fallback_nodes = fallback;
        }

        for &slot in &slots {
            let mut visiting = Vec::new();
            let flattened = self.flatten_slot(slot, &mut visiting);
            self.slot_data_mut(slot).flattened_nodes = flattened;
        }

        let mut dirty = Vec::new();
        for &slot in &slots {
            let previous = {
                let data = self.slot_data_mut(slot);
                let previous = data.previously_assigned.take().unwrap_or_default();
                if previous.len() > data.assigned_nodes.len() {
                    data.dirty = true;
                }
                if std::mem::take(&mut data.dirty) {
                    dirty.push(slot);
                }
                previous
            };
            for node in previous {
                if let Some(n) = self.get_mut(node) {
                    n.prev_assigned_slot = None;
                }
            }
        }
        trace!(?root, slots = slots.len(), dirty = dirty.len(), "distributed");
        dirty
    }

    fn begin_slot_pass(&mut self, slot: NodeId) {
        let previous = self.slot_data_mut(slot).begin_pass().to_vec();
        for node in previous {
            if let Some(n) = self.get_mut(node) {
                // removal clears the slot but not the membership
                n.prev_assigned_slot = n.assigned_slot.or(Some(slot));
                if n.assigned_slot == Some(slot) {
                    n.assigned_slot = None;
                }
            }
        }
    }

    fn distribute_node(&mut self, root: NodeId, node: NodeId) {
        let name = self.node(node).projection_name().to_string();
        let target = self.shadow(root).find_slot(&name);
        let old = self.node_mut(node).prev_assigned_slot.take();

        if let Some(slot) = target {
            self.slot_data_mut(slot).assign(node);
        }
        self.node_mut(node).assigned_slot = target;

        if old != target {
            if let Some(slot) = target {
                self.slot_data_mut(slot).dirty = true;
            }
        }
    }

    /// Content of `slot` with nested registered slots replaced by their own
    /// flattened content. Slots already on the visiting stack are skipped.
    fn flatten_slot(&self, slot: NodeId, visiting: &mut Vec<NodeId>) -> Vec<NodeId> {
        visiting.push(slot);
        let mut out = Vec::new();
        for &node in self.slot_data(slot).effective_content() {
            if !self.is_registered_slot(node) {
                out.push(node);
            } else if visiting.contains(&node) {
                warn!(?slot, nested = ?node, "slot projection cycle, skipping nested slot");
            } else {
                out.extend(self.flatten_slot(node, visiting));
            }
        }
        visiting.pop();
        out
    }
}
