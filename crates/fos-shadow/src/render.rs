//! Render scheduler
//!
//! Mutations only mark shadow roots as needing a render; [`Document::flush`]
//! drains the queue. Each queued root is rendered starting from its outermost
//! pending ancestor root, and roots invalidated while a pass runs join that
//! pass unless they already rendered in it. Roots whose host is not in the
//! document are parked, still pending, until a later flush finds the host
//! connected.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::document::{Document, Reach};
use crate::error::{DomResult, ListenerError, ShadowError};
use crate::events::{Event, EventTarget};
use crate::shadow::RenderState;
use crate::NodeId;

/// Pending render work
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    queue: Vec<NodeId>,
    /// Pending roots held back until their host is connected
    parked: Vec<NodeId>,
    flushing: bool,
    listener_error: Option<ListenerError>,
}

impl Scheduler {
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    fn record_error(&mut self, err: ListenerError) {
        self.listener_error.get_or_insert(err);
    }
}

impl Document {
    /// Mark `root` as needing a render. Repeated requests coalesce.
    pub(crate) fn schedule_render(&mut self, root: NodeId) {
        let Some(shadow) = self.tree.get_mut(root).and_then(|n| n.as_shadow_root_mut()) else {
            return;
        };
        match shadow.state {
            RenderState::RenderPending => {}
            RenderState::Clean | RenderState::Rendering => {
                shadow.state = RenderState::RenderPending;
                self.scheduler.queue.push(root);
                trace!(?root, "render scheduled");
            }
        }
    }

    /// Render every pending shadow root, then deliver connection changes.
    ///
    /// Roots whose host is outside the document stay pending and render on
    /// the first flush after the host is connected.
    ///
    /// Returns the number of root renders performed. A flush that keeps
    /// re-invalidating roots past the configured bound fails with
    /// [`ShadowError::RenderLoop`]; the queue is then dropped and every queued
    /// root reset to clean. Listener failures during the flush are reported
    /// after it completes.
    pub fn flush(&mut self) -> DomResult<usize> {
        if self.scheduler.flushing {
            return Ok(0);
        }
        self.scheduler.flushing = true;
        let result = self.drain_render_queue();
        self.scheduler.flushing = false;

        let rendered = match result {
            Ok(rendered) => rendered,
            Err(err) => {
                self.abandon_queue();
                self.scheduler.listener_error = None;
                return Err(err);
            }
        };
        self.settle_connections();
        match self.scheduler.listener_error.take() {
            Some(err) => Err(err.into()),
            None => Ok(rendered),
        }
    }

    /// Whether a flush would render anything
    pub(crate) fn has_render_work(&self) -> bool {
        self.scheduler.has_pending()
            || self
                .scheduler
                .parked
                .iter()
                .any(|&root| self.is_render_pending(root) && !self.is_detached_root(root))
    }

    /// Host chain ends outside the document. Roots in a host cycle are not
    /// detached; they render and trip the loop bound.
    fn is_detached_root(&self, root: NodeId) -> bool {
        self.reach(root) == Reach::Detached
    }

    fn park(&mut self, root: NodeId) {
        if !self.scheduler.parked.contains(&root) {
            trace!(?root, "render deferred until host is connected");
            self.scheduler.parked.push(root);
        }
    }

    /// Move parked roots whose host is now connected back onto the queue
    fn unpark_connected(&mut self) {
        for root in std::mem::take(&mut self.scheduler.parked) {
            if !self.is_render_pending(root) {
                continue;
            }
            if self.is_detached_root(root) {
                self.scheduler.parked.push(root);
            } else {
                self.scheduler.queue.push(root);
            }
        }
    }

    fn drain_render_queue(&mut self) -> DomResult<usize> {
        self.unpark_connected();
        let limit = self.config.max_flush_iterations;
        let mut iterations = 0;
        let mut rendered = 0;

        while self.scheduler.has_pending() {
            iterations += 1;
            if iterations > limit {
                warn!(limit, queued = self.scheduler.queue.len(), "render loop detected");
                return Err(ShadowError::RenderLoop { limit });
            }
            let batch = std::mem::take(&mut self.scheduler.queue);
            debug!(iteration = iterations, roots = batch.len(), "flushing render queue");
            for root in batch {
                if !self.is_render_pending(root) {
                    continue;
                }
                if self.is_detached_root(root) {
                    self.park(root);
                } else {
                    let start = self.outermost_pending_root(root);
                    rendered += self.render_pass(start, root);
                }
            }
        }
        Ok(rendered)
    }

    fn is_render_pending(&self, root: NodeId) -> bool {
        self.tree
            .get(root)
            .and_then(|n| n.as_shadow_root())
            .is_some_and(|r| r.state == RenderState::RenderPending)
    }

    /// Root whose tree contains the host of `root`
    fn distribution_parent(&self, root: NodeId) -> Option<NodeId> {
        let host = self.tree.get(root)?.as_shadow_root()?.host;
        self.tree.containing_shadow_root(host)
    }

    /// Outermost pending root reachable through host-containing roots
    fn outermost_pending_root(&self, root: NodeId) -> NodeId {
        let mut candidate = root;
        let mut seen = vec![root];
        let mut current = root;
        while let Some(parent) = self.distribution_parent(current) {
            if seen.contains(&parent) {
                break;
            }
            seen.push(parent);
            if self.is_render_pending(parent) {
                candidate = parent;
            }
            current = parent;
        }
        candidate
    }

    /// Render `start`, every root it invalidates, and finally `origin` if it
    /// is still pending. Returns the number of roots rendered.
    fn render_pass(&mut self, start: NodeId, origin: NodeId) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![origin, start];
        let mut rendered = 0;

        while let Some(root) = stack.pop() {
            if visited.contains(&root) || !self.is_render_pending(root) {
                continue;
            }
            if self.is_detached_root(root) {
                self.park(root);
                continue;
            }
            visited.insert(root);
            let queued_before = self.scheduler.queue.len();
            self.render_root(root);
            rendered += 1;

            let raised: Vec<NodeId> = self.scheduler.queue.drain(queued_before..).collect();
            for requested in raised.into_iter().rev() {
                if visited.contains(&requested) {
                    self.scheduler.queue.push(requested);
                } else {
                    stack.push(requested);
                }
            }
        }
        rendered
    }

    fn render_root(&mut self, root: NodeId) {
        let host = self.tree.shadow(root).host;
        debug!(?root, ?host, "rendering shadow root");
        self.tree.shadow_mut(root).state = RenderState::Rendering;

        let dirty = self.tree.distribute(root);
        self.tree.compose(root);

        {
            let shadow = self.tree.shadow_mut(root);
            shadow.has_rendered = true;
            if shadow.state == RenderState::Rendering {
                shadow.state = RenderState::Clean;
            }
        }

        // slots projected into another host feed that host's distribution
        let nested: Vec<NodeId> = self
            .tree
            .shadow(root)
            .slot_list
            .iter()
            .filter_map(|&slot| self.tree.parent_node(slot))
            .filter_map(|parent| self.tree.hosted_root(parent))
            .collect();
        for inner in nested {
            self.schedule_render(inner);
        }

        for slot in dirty {
            self.notify_slot_change(slot);
        }
    }

    /// Fire `slotchange` at `slot`, then at each slot it is assigned into
    fn notify_slot_change(&mut self, slot: NodeId) {
        let mut notified = Vec::new();
        let mut current = Some(slot);
        while let Some(id) = current {
            if notified.contains(&id) || !self.tree.contains(id) {
                break;
            }
            notified.push(id);
            let mut event = Event::bubbling("slotchange");
            if let Err(err) = self.dispatch_internal(EventTarget::Node(id), &mut event) {
                self.scheduler.record_error(err);
            }
            current = self.tree.get(id).and_then(|n| n.assigned_slot);
        }
    }

    fn abandon_queue(&mut self) {
        for root in std::mem::take(&mut self.scheduler.queue) {
            if let Some(shadow) = self.tree.get_mut(root).and_then(|n| n.as_shadow_root_mut()) {
                shadow.state = RenderState::Clean;
            }
        }
    }

    /// Deliver connection changes for nodes moved since the last flush
    fn settle_connections(&mut self) {
        let candidates = std::mem::take(&mut self.connection_candidates);
        for node in candidates {
            if !self.tree.contains(node) {
                continue;
            }
            let connected = self.is_connected_in_tree(node);
            self.update_connection(node, connected);
        }
    }

    /// Apply `connected` to `node` and its composed-inclusive descendants
    /// (logical children and attached shadow trees).
    fn update_connection(&mut self, node: NodeId, connected: bool) {
        if self.tree.node(node).connected == connected {
            return;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let n = self.tree.node_mut(id);
            if n.connected == connected {
                continue;
            }
            n.connected = connected;
            self.hooks.connection_changed(id, connected);
            if let Some(root) = self.tree.hosted_root(id) {
                stack.push(root);
            }
            stack.extend(self.tree.logical_children(id).iter().rev().copied());
        }
    }
}
