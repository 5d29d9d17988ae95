//! Event dispatch
//!
//! Capture runs outer to inner over the composed path, bubbling runs inner to
//! outer. Each listener sees the target and related target retargeted to its
//! own scope.

use tracing::{trace, warn};

use super::event::{Event, EventPhase, EventTarget};
use super::notifies_hosts;
use crate::document::Document;
use crate::error::{DomResult, ListenerError};
use crate::NodeId;

impl Document {
    /// Dispatch `event` at `target`.
    ///
    /// Returns `Ok(false)` if a listener cancelled the event. A failing
    /// listener does not stop dispatch; the first failure is returned once
    /// dispatch completes.
    pub fn dispatch_event(
        &mut self,
        target: impl Into<EventTarget>,
        event: &mut Event,
    ) -> DomResult<bool> {
        let target = target.into();
        if let EventTarget::Node(id) = target {
            self.tree.require(id)?;
        }
        self.dispatch_internal(target, event)?;
        Ok(!event.default_prevented())
    }

    /// Composed path of a hypothetical event at `target`
    pub fn composed_path(&self, target: impl Into<EventTarget>, composed: bool) -> Vec<EventTarget> {
        self.tree.composed_path(target.into(), composed)
    }

    /// First entry of `path` visible from `reference`'s scope
    pub fn retarget(&self, reference: impl Into<EventTarget>, path: &[EventTarget]) -> Option<EventTarget> {
        self.tree.retarget(reference.into(), path)
    }

    pub(crate) fn dispatch_internal(
        &mut self,
        target: EventTarget,
        event: &mut Event,
    ) -> Result<(), ListenerError> {
        let path = self.tree.composed_path(target, event.composed());
        trace!(event = event.event_type(), ?target, path = path.len(), "dispatching");
        event.begin_dispatch(path.clone());
        let mut first_error = None;

        for &current in path.iter().rev() {
            self.invoke_listeners(event, current, true, &mut first_error);
            if event.is_propagation_stopped() {
                break;
            }
        }

        if !event.is_propagation_stopped() {
            if event.bubbles() {
                for &current in &path {
                    self.invoke_listeners(event, current, false, &mut first_error);
                    if event.is_propagation_stopped() {
                        break;
                    }
                }
            } else if self.config.retarget_non_bubbling && notifies_hosts(event.event_type()) {
                self.notify_hosts(event, &path, &mut first_error);
            } else if let Some(&first) = path.first() {
                self.invoke_listeners(event, first, false, &mut first_error);
            }
        }

        let outer = path
            .last()
            .and_then(|&outermost| self.tree.retarget(outermost, &path));
        event.end_dispatch(outer);
        first_error.map_or(Ok(()), Err)
    }

    /// Non-bubbling pass for events hosts observe as their own: the target,
    /// then each host whose shadow root contains the last notified entry.
    fn notify_hosts(
        &mut self,
        event: &mut Event,
        path: &[EventTarget],
        first_error: &mut Option<ListenerError>,
    ) {
        let mut last_root: Option<NodeId> = None;
        for (index, &current) in path.iter().enumerate() {
            let hosted = self.tree.hosted_root_of(current);
            if index != 0 && (hosted.is_none() || hosted != last_root) {
                continue;
            }
            self.invoke_listeners(event, current, false, first_error);
            last_root = current.node().map(|id| self.tree.root_node(id));
            if event.is_propagation_stopped() {
                break;
            }
        }
    }

    fn invoke_listeners(
        &mut self,
        event: &mut Event,
        current: EventTarget,
        capture: bool,
        first_error: &mut Option<ListenerError>,
    ) {
        let invocations = self.listeners.matching(current, event.event_type(), capture);
        if invocations.is_empty() {
            return;
        }

        let target = self.tree.retarget(current, &event.path);
        let related = event.related_origin().and_then(|origin| {
            let related_path = self.tree.composed_path(EventTarget::Node(origin), true);
            self.tree.retarget(current, &related_path)
        });
        event.current_target = Some(current);
        event.target = target;
        event.related_target = related;
        event.phase = if target == Some(current) {
            EventPhase::AtTarget
        } else if capture {
            EventPhase::Capturing
        } else {
            EventPhase::Bubbling
        };

        // both ends resolve to the same node in this scope
        if related.is_some() && related == target {
            if event.phase == EventPhase::Bubbling {
                event.stop_immediate_propagation();
            }
            return;
        }

        for invocation in invocations {
            if !self.listeners.contains(invocation.id) {
                continue;
            }
            if invocation.once {
                self.listeners.remove(invocation.id);
            }
            if let Err(err) = (invocation.callback)(event) {
                warn!(event = event.event_type(), target = ?current, %err, "event listener failed");
                first_error.get_or_insert(err);
            }
            if event.is_immediate_stopped() {
                break;
            }
        }
    }
}
