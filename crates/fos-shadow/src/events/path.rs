//! Event path composition and retargeting

use super::event::EventTarget;
use crate::tree::DomTree;
use crate::NodeId;

impl DomTree {
    /// Dispatch path from `start`, innermost first.
    ///
    /// A node assigned to a slot continues at the slot. A shadow root continues
    /// at its host when the event is composed or the root is not the one the
    /// event started in. The path ends with [`EventTarget::Global`] when it
    /// reaches the document.
    pub fn composed_path(&self, start: EventTarget, composed: bool) -> Vec<EventTarget> {
        let EventTarget::Node(start) = start else {
            return vec![EventTarget::Global];
        };
        if !self.contains(start) {
            return Vec::new();
        }
        let start_root = self.root_node(start);
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            // assignment cycles between roots would otherwise repeat forever
            if path.contains(&EventTarget::Node(id)) {
                break;
            }
            path.push(EventTarget::Node(id));
            let node = self.node(id);
            current = if let Some(slot) = node.assigned_slot.filter(|&s| self.contains(s)) {
                Some(slot)
            } else if let Some(root) = node.as_shadow_root() {
                if composed || id != start_root {
                    Some(root.host).filter(|&h| self.contains(h))
                } else {
                    None
                }
            } else {
                self.parent_node(id)
            };
        }
        let reached_document = path
            .last()
            .and_then(|t| t.node())
            .and_then(|id| self.get(id))
            .is_some_and(|n| n.is_document());
        if reached_document {
            path.push(EventTarget::Global);
        }
        path
    }

    /// Scope a target belongs to: its logical root, or the global scope
    fn scope_of(&self, target: EventTarget) -> EventTarget {
        match target {
            EventTarget::Node(id) => EventTarget::Node(self.root_node(id)),
            EventTarget::Global => EventTarget::Global,
        }
    }

    fn is_shadow_scope(&self, scope: EventTarget) -> bool {
        scope
            .node()
            .and_then(|id| self.get(id))
            .is_some_and(|n| n.is_shadow_root())
    }

    /// The first entry of `path` visible from `reference`'s scope: one whose
    /// root is not a shadow root, or whose root lies on `reference`'s own
    /// composed path.
    pub fn retarget(&self, reference: EventTarget, path: &[EventTarget]) -> Option<EventTarget> {
        let reference_path = self.composed_path(reference, true);
        path.iter().copied().find(|&candidate| {
            let scope = self.scope_of(candidate);
            !self.is_shadow_scope(scope) || reference_path.contains(&scope)
        })
    }

    /// Shadow root hosted by `target`, if it is a host
    pub(crate) fn hosted_root_of(&self, target: EventTarget) -> Option<NodeId> {
        target.node().and_then(|id| self.hosted_root(id))
    }
}
