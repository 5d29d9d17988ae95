//! Document - High-level document API
//!
//! Owns the tree, the render scheduler, listeners and hooks. Mutations live in
//! `operations`, rendering in `render`, dispatch in `events::dispatch`.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::config::Config;
use crate::error::{DomResult, ShadowError};
use crate::events::{Event, EventTarget, ListenerId, ListenerOptions, ListenerRegistry, ListenerResult};
use crate::hooks::{ConnectionHook, Hooks, ScopeHook};
use crate::node::{ElementData, NodeData};
use crate::render::Scheduler;
use crate::shadow::{RenderState, ShadowRootMode};
use crate::tree::DomTree;
use crate::NodeId;

/// End of the ancestor walk through logical parents and shadow hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reach {
    Document,
    /// A parentless node other than the document
    Detached,
    /// Hosts projected into each other's trees
    Cycle,
}

/// HTML Document with shadow tree support
#[derive(Debug)]
pub struct Document {
    pub(crate) tree: DomTree,
    pub(crate) config: Config,
    pub(crate) scheduler: Scheduler,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) hooks: Hooks,
    /// Nodes whose connection status may have changed since the last flush
    pub(crate) connection_candidates: Vec<NodeId>,
    document: NodeId,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
}

impl Document {
    /// Create a new document with `<html>`, `<head>` and `<body>`
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new document with custom configuration
    pub fn with_config(config: Config) -> Self {
        let mut tree = DomTree::new();

        let document = tree.alloc(NodeData::Document);
        let html = tree.alloc(NodeData::Element(ElementData::new("html")));
        let head = tree.alloc(NodeData::Element(ElementData::new("head")));
        let body = tree.alloc(NodeData::Element(ElementData::new("body")));

        tree.physical_append_fresh(document, html);
        tree.physical_append_fresh(html, head);
        tree.physical_append_fresh(html, body);
        for id in [document, html, head, body] {
            tree.node_mut(id).connected = true;
        }

        Self {
            tree,
            config,
            scheduler: Scheduler::default(),
            listeners: ListenerRegistry::default(),
            hooks: Hooks::default(),
            connection_candidates: Vec::new(),
            document,
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Document node
    pub fn document_node(&self) -> NodeId {
        self.document
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- node creation ----

    /// Create a detached element
    pub fn create_element(&mut self, local_name: &str) -> NodeId {
        self.tree
            .alloc(NodeData::Element(ElementData::new(local_name)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.tree.alloc(NodeData::Text(content.to_string()))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.tree.alloc(NodeData::Comment(content.to_string()))
    }

    /// Create an empty fragment
    pub fn create_fragment(&mut self) -> NodeId {
        self.tree.alloc(NodeData::DocumentFragment)
    }

    /// Destroy a detached node and its subtree, including attached shadow
    /// trees. Ids of destroyed nodes become stale.
    pub fn destroy(&mut self, node: NodeId) -> DomResult<()> {
        self.tree.require(node)?;
        if node == self.document
            || self.tree.node(node).is_shadow_root()
            || self.tree.parent_node(node).is_some()
        {
            return Err(ShadowError::StillAttached(node));
        }

        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            doomed.push(id);
            stack.extend(self.tree.logical_children(id).iter().copied());
            if let Some(root) = self.tree.hosted_root(id) {
                stack.push(root);
            }
        }

        self.tree.physical_remove(node);
        for &id in &doomed {
            self.listeners.remove_target(EventTarget::Node(id));
        }
        for &id in &doomed {
            self.tree.free(id);
        }
        debug!(?node, freed = doomed.len(), "destroyed subtree");
        Ok(())
    }

    // ---- attributes ----

    /// Get an element attribute
    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.get(node).and_then(|n| n.attribute(name))
    }

    // ---- logical reads ----

    /// Logical parent
    pub fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent_node(node)
    }

    /// Logical children in order
    pub fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.child_nodes(node).to_vec()
    }

    /// First logical child
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree.first_child(node)
    }

    /// Last logical child
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.tree.last_child(node)
    }

    /// Next logical sibling
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.next_sibling(node)
    }

    /// Previous logical sibling
    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.previous_sibling(node)
    }

    /// Logical root; a shadow root for nodes in a shadow tree
    pub fn root_node(&self, node: NodeId) -> NodeId {
        self.tree.root_node(node)
    }

    /// Rendered children
    pub fn composed_children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree.physical_children(node)
    }

    /// Rendered parent
    pub fn composed_parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.physical_parent(node)
    }

    /// Whether `node` reaches the document through logical parents and hosts
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_connected_in_tree(node)
    }

    /// Current connection state, ignoring what hooks were last told
    pub(crate) fn is_connected_in_tree(&self, node: NodeId) -> bool {
        self.reach(node) == Reach::Document
    }

    /// Where the walk up logical parents and shadow hosts from `node` ends
    pub(crate) fn reach(&self, node: NodeId) -> Reach {
        let mut seen = HashSet::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.document {
                return Reach::Document;
            }
            if !seen.insert(id) {
                return Reach::Cycle;
            }
            current = match self.tree.get(id).and_then(|n| n.as_shadow_root()) {
                Some(root) => Some(root.host),
                None => self.tree.parent_node(id),
            };
        }
        Reach::Detached
    }

    // ---- shadow queries ----

    /// Open shadow root of `host`
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let root = self.tree.hosted_root(host)?;
        (self.tree.shadow(root).mode == ShadowRootMode::Open).then_some(root)
    }

    /// Host of a shadow root
    pub fn host(&self, root: NodeId) -> Option<NodeId> {
        self.tree
            .get(root)
            .and_then(|n| n.as_shadow_root())
            .map(|r| r.host)
    }

    /// Render state of a shadow root; `None` for other nodes
    pub fn render_state(&self, root: NodeId) -> Option<RenderState> {
        self.tree
            .get(root)
            .and_then(|n| n.as_shadow_root())
            .map(|r| r.state)
    }

    /// Whether `root` has rendered at least once
    pub fn has_rendered(&self, root: NodeId) -> bool {
        self.tree
            .get(root)
            .and_then(|n| n.as_shadow_root())
            .is_some_and(|r| r.has_rendered)
    }

    fn render_for_read(&mut self) -> DomResult<()> {
        if self.config.render_on_read && self.has_render_work() {
            self.flush()?;
        }
        Ok(())
    }

    /// Nodes assigned to `slot`. With `flatten`, nested slots are replaced by
    /// their content and fallback content is used when nothing is assigned.
    pub fn assigned_nodes(&mut self, slot: NodeId, flatten: bool) -> DomResult<Vec<NodeId>> {
        self.tree.require(slot)?;
        self.render_for_read()?;
        Ok(match self.tree.node(slot).slot.as_ref() {
            Some(data) if flatten => data.flattened_nodes.clone(),
            Some(data) => data.assigned_nodes.clone(),
            None => Vec::new(),
        })
    }

    /// Element subset of [`Self::assigned_nodes`]
    pub fn assigned_elements(&mut self, slot: NodeId, flatten: bool) -> DomResult<Vec<NodeId>> {
        let nodes = self.assigned_nodes(slot, flatten)?;
        Ok(nodes
            .into_iter()
            .filter(|&id| self.tree.get(id).is_some_and(|n| n.is_element()))
            .collect())
    }

    /// Slot `node` is assigned to. Hidden when the slot is in a closed tree.
    pub fn assigned_slot(&mut self, node: NodeId) -> DomResult<Option<NodeId>> {
        self.tree.require(node)?;
        self.render_for_read()?;
        let Some(slot) = self.tree.node(node).assigned_slot else {
            return Ok(None);
        };
        let visible = self
            .tree
            .get(slot)
            .and_then(|s| s.slot.as_ref())
            .is_some_and(|data| self.tree.shadow(data.root).mode == ShadowRootMode::Open);
        Ok(visible.then_some(slot))
    }

    // ---- listeners ----

    /// Register a listener
    pub fn add_event_listener<F>(
        &mut self,
        target: impl Into<EventTarget>,
        event_type: &str,
        options: ListenerOptions,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&mut Event) -> ListenerResult + 'static,
    {
        self.listeners
            .add(target.into(), event_type, options, Rc::new(callback))
    }

    /// Register a shared callback. Registering the same callback again for
    /// the same type and phase returns the existing id.
    pub fn add_shared_listener(
        &mut self,
        target: impl Into<EventTarget>,
        event_type: &str,
        options: ListenerOptions,
        callback: Rc<dyn Fn(&mut Event) -> ListenerResult>,
    ) -> ListenerId {
        self.listeners
            .add(target.into(), event_type, options, callback)
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Whether listener `id` is still registered
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    // ---- hooks ----

    /// Install the callback told about nodes changing style scope
    pub fn set_scope_hook(&mut self, hook: impl ScopeHook + 'static) {
        self.hooks.scope = Some(Box::new(hook));
    }

    /// Install the callback told about connection changes on flush
    pub fn set_connection_hook(&mut self, hook: impl ConnectionHook + 'static) {
        self.hooks.connection = Some(Box::new(hook));
    }

    /// Style scope name of `node`: the local name of the host owning its tree
    pub(crate) fn scope_name(&self, node: NodeId) -> Option<String> {
        let root = self.tree.containing_shadow_root(node)?;
        let host = self.tree.shadow(root).host;
        self.tree.get(host)?.local_name().map(str::to_string)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
