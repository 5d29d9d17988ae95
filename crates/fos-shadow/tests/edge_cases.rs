//! Edge case tests for fos-shadow
//!
//! Render loops, destroyed and stale nodes, fragments, slots moving between
//! trees, and the host integration hooks.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use fos_shadow::{
    Config, ConnectionHook, Document, NodeId, RenderState, ScopeHook, ShadowError, ShadowRootInit,
};

// ============================================================================
// Helpers
// ============================================================================

fn host_with_slot(doc: &mut Document, name: &str) -> (NodeId, NodeId, NodeId) {
    let host = doc.create_element(name);
    let root = doc.attach_shadow(host, ShadowRootInit::open()).unwrap();
    let slot = doc.create_element("slot");
    doc.append_child(root, slot).unwrap();
    (host, root, slot)
}

/// Two hosts whose slots are assigned into each other's trees
fn assignment_cycle(doc: &mut Document) -> (NodeId, NodeId) {
    let h1 = doc.create_element("x-one");
    let h2 = doc.create_element("x-two");
    let r1 = doc.attach_shadow(h1, ShadowRootInit::open()).unwrap();
    let r2 = doc.attach_shadow(h2, ShadowRootInit::open()).unwrap();

    doc.append_child(r1, h2).unwrap();
    let x = doc.create_element("slot");
    doc.append_child(h2, x).unwrap();

    doc.append_child(r2, h1).unwrap();
    let y = doc.create_element("slot");
    doc.append_child(h1, y).unwrap();
    (r1, r2)
}

type ScopeLog = Rc<RefCell<Vec<(NodeId, Option<String>, Option<String>)>>>;

struct RecordingScope(ScopeLog);

impl ScopeHook for RecordingScope {
    fn scope_changed(&mut self, node: NodeId, from: Option<&str>, to: Option<&str>) {
        self.0
            .borrow_mut()
            .push((node, from.map(str::to_string), to.map(str::to_string)));
    }
}

type ConnectionLog = Rc<RefCell<Vec<(NodeId, bool)>>>;

struct RecordingConnection(ConnectionLog);

impl ConnectionHook for RecordingConnection {
    fn connected(&mut self, node: NodeId) {
        self.0.borrow_mut().push((node, true));
    }

    fn disconnected(&mut self, node: NodeId) {
        self.0.borrow_mut().push((node, false));
    }
}

// ============================================================================
// Render loops
// ============================================================================

#[test]
fn test_assignment_cycle_fails_flush() {
    let mut doc = Document::new();
    let (r1, r2) = assignment_cycle(&mut doc);

    let result = doc.flush();
    assert!(matches!(result, Err(ShadowError::RenderLoop { limit: 100 })));
    assert_eq!(doc.render_state(r1), Some(RenderState::Clean));
    assert_eq!(doc.render_state(r2), Some(RenderState::Clean));
    // queue was dropped
    assert_eq!(doc.flush().unwrap(), 0);
}

#[test]
fn test_render_loop_limit_is_configurable() {
    let mut doc = Document::with_config(Config {
        max_flush_iterations: 5,
        ..Default::default()
    });
    assignment_cycle(&mut doc);
    assert!(matches!(doc.flush(), Err(ShadowError::RenderLoop { limit: 5 })));
}

#[test]
fn test_cycle_path_terminates() {
    let mut doc = Document::new();
    let (r1, _) = assignment_cycle(&mut doc);
    let _ = doc.flush();
    let h2 = doc.child_nodes(r1)[0];
    let x = doc.child_nodes(h2)[0];
    let path = doc.composed_path(x, true);
    assert!(path.len() <= doc.tree().len() + 1);
}

// ============================================================================
// Disconnected hosts
// ============================================================================

#[test]
fn test_detached_host_renders_once_connected() {
    let mut doc = Document::new();
    let body = doc.body();
    let (host, root, slot) = host_with_slot(&mut doc, "x-card");
    let light = doc.create_element("span");
    doc.append_child(host, light).unwrap();

    assert_eq!(doc.flush().unwrap(), 0);
    assert_eq!(doc.render_state(root), Some(RenderState::RenderPending));
    assert!(!doc.has_rendered(root));
    assert!(doc.composed_children(host).is_empty());
    // reads do not render it either
    assert!(doc.assigned_nodes(slot, false).unwrap().is_empty());

    doc.append_child(body, host).unwrap();
    assert_eq!(doc.flush().unwrap(), 1);
    assert_eq!(doc.render_state(root), Some(RenderState::Clean));
    assert_eq!(doc.composed_children(host), vec![light]);
}

#[test]
fn test_removed_host_waits_for_reinsertion() {
    let mut doc = Document::new();
    let body = doc.body();
    let (host, root, slot) = host_with_slot(&mut doc, "x-card");
    doc.append_child(body, host).unwrap();
    doc.flush().unwrap();

    doc.remove_child(body, host).unwrap();
    let light = doc.create_element("span");
    doc.append_child(host, light).unwrap();
    assert_eq!(doc.flush().unwrap(), 0);
    assert_eq!(doc.render_state(root), Some(RenderState::RenderPending));
    assert!(doc.composed_children(host).is_empty());

    doc.append_child(body, host).unwrap();
    assert_eq!(doc.assigned_nodes(slot, false).unwrap(), vec![light]);
    assert_eq!(doc.composed_children(host), vec![light]);
}

// ============================================================================
// Destroyed and stale nodes
// ============================================================================

#[test]
fn test_destroy_host_with_pending_render() {
    let mut doc = Document::new();
    let (host, root, slot) = host_with_slot(&mut doc, "x-card");
    let light = doc.create_element("span");
    doc.append_child(host, light).unwrap();
    assert_eq!(doc.render_state(root), Some(RenderState::RenderPending));

    doc.destroy(host).unwrap();
    assert_eq!(doc.flush().unwrap(), 0);
    for stale in [host, root, slot, light] {
        assert!(!doc.tree().contains(stale));
    }
}

#[test]
fn test_destroy_attached_rejected() {
    let mut doc = Document::new();
    let body = doc.body();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    assert!(matches!(doc.destroy(div), Err(ShadowError::StillAttached(_))));

    let (_, root, _) = host_with_slot(&mut doc, "x-card");
    assert!(matches!(doc.destroy(root), Err(ShadowError::StillAttached(_))));
}

#[test]
fn test_stale_id_not_found() {
    let mut doc = Document::new();
    let body = doc.body();
    let stale = doc.create_element("div");
    doc.destroy(stale).unwrap();
    let fresh = doc.create_element("div");
    assert_ne!(stale, fresh);

    assert!(matches!(
        doc.append_child(body, stale),
        Err(ShadowError::NotFound(id)) if id == stale
    ));
    assert!(matches!(doc.set_attribute(stale, "id", "x"), Err(ShadowError::NotFound(_))));
    assert!(doc.append_child(body, fresh).is_ok());
}

// ============================================================================
// Insertion edge cases
// ============================================================================

#[test]
fn test_fragment_into_host() {
    let mut doc = Document::new();
    let body = doc.body();
    let (host, root, default_slot) = host_with_slot(&mut doc, "x-card");
    let named = doc.create_element("slot");
    doc.set_attribute(named, "name", "x").unwrap();
    doc.insert_before(root, named, Some(default_slot)).unwrap();
    doc.append_child(body, host).unwrap();

    let frag = doc.create_fragment();
    let a = doc.create_element("span");
    let b = doc.create_element("span");
    doc.set_attribute(b, "slot", "x").unwrap();
    doc.append_child(frag, a).unwrap();
    doc.append_child(frag, b).unwrap();

    doc.append_child(host, frag).unwrap();
    assert!(doc.child_nodes(frag).is_empty());
    assert_eq!(doc.child_nodes(host), vec![a, b]);
    assert_eq!(doc.parent_node(a), Some(host));

    assert_eq!(doc.assigned_nodes(named, false).unwrap(), vec![b]);
    assert_eq!(doc.assigned_nodes(default_slot, false).unwrap(), vec![a]);
    assert_eq!(doc.composed_children(host), vec![b, a]);
}

#[test]
fn test_insert_before_itself_is_noop() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = doc.create_element("div");
    let b = doc.create_element("div");
    doc.append_child(body, a).unwrap();
    doc.append_child(body, b).unwrap();

    doc.insert_before(body, a, Some(a)).unwrap();
    assert_eq!(doc.child_nodes(body), vec![a, b]);
    assert_eq!(doc.composed_children(body), vec![a, b]);
}

#[test]
fn test_insert_into_descendant_rejected() {
    let mut doc = Document::new();
    let outer = doc.create_element("div");
    let inner = doc.create_element("div");
    doc.append_child(outer, inner).unwrap();
    assert!(matches!(
        doc.append_child(inner, outer),
        Err(ShadowError::HierarchyRequest(_))
    ));
}

#[test]
fn test_attach_shadow_to_text_rejected() {
    let mut doc = Document::new();
    let text = doc.create_text("hi");
    assert!(matches!(
        doc.attach_shadow(text, ShadowRootInit::open()),
        Err(ShadowError::NotSupported)
    ));
}

// ============================================================================
// Slots moving between trees
// ============================================================================

#[test]
fn test_slot_moves_between_roots() {
    let mut doc = Document::new();
    let body = doc.body();
    let (host1, _, slot) = host_with_slot(&mut doc, "x-one");
    doc.append_child(body, host1).unwrap();
    let c1 = doc.create_element("span");
    doc.append_child(host1, c1).unwrap();

    let host2 = doc.create_element("x-two");
    doc.append_child(body, host2).unwrap();
    let root2 = doc.attach_shadow(host2, ShadowRootInit::open()).unwrap();
    let c2 = doc.create_element("span");
    doc.append_child(host2, c2).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.composed_children(host1), vec![c1]);

    doc.append_child(root2, slot).unwrap();
    doc.flush().unwrap();

    assert_eq!(doc.assigned_nodes(slot, false).unwrap(), vec![c2]);
    assert_eq!(doc.assigned_slot(c1).unwrap(), None);
    assert!(doc.composed_children(host1).is_empty());
    assert_eq!(doc.composed_children(host2), vec![c2]);
}

#[test]
fn test_removed_slot_shows_fallback_physically() {
    let mut doc = Document::new();
    let body = doc.body();
    let (host, root, slot) = host_with_slot(&mut doc, "x-card");
    let fallback = doc.create_text("nothing here");
    doc.append_child(slot, fallback).unwrap();
    doc.append_child(body, host).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.composed_children(host), vec![fallback]);

    doc.remove_child(root, slot).unwrap();
    assert_eq!(doc.composed_parent(fallback), Some(slot));

    doc.append_child(body, slot).unwrap();
    doc.flush().unwrap();
    assert_eq!(doc.composed_children(slot), vec![fallback]);
    assert_eq!(doc.child_nodes(slot), vec![fallback]);
    assert!(doc.assigned_nodes(slot, true).unwrap().is_empty());
    assert!(doc.composed_children(host).is_empty());
}

// ============================================================================
// Hooks
// ============================================================================

#[test]
fn test_scope_hook_reports_moves() {
    let mut doc = Document::new();
    let body = doc.body();
    let (_, root, _) = host_with_slot(&mut doc, "x-card");
    let log: ScopeLog = Rc::new(RefCell::new(Vec::new()));
    doc.set_scope_hook(RecordingScope(Rc::clone(&log)));

    let div = doc.create_element("div");
    let inner = doc.create_element("span");
    doc.append_child(div, inner).unwrap();

    doc.append_child(body, div).unwrap();
    assert!(log.borrow().is_empty());

    doc.append_child(root, div).unwrap();
    doc.remove_child(root, div).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            (div, None, Some("x-card".to_string())),
            (div, Some("x-card".to_string()), None),
        ]
    );
}

#[test]
fn test_connection_hook_fires_on_flush() {
    let mut doc = Document::new();
    let log: ConnectionLog = Rc::new(RefCell::new(Vec::new()));
    doc.set_connection_hook(RecordingConnection(Rc::clone(&log)));

    let body = doc.body();
    let (host, root, slot) = host_with_slot(&mut doc, "x-card");
    let light = doc.create_element("span");
    doc.append_child(host, light).unwrap();

    doc.append_child(body, host).unwrap();
    assert!(log.borrow().is_empty());
    assert!(doc.is_connected(slot));

    doc.flush().unwrap();
    assert!(log.borrow().iter().all(|&(_, c)| c));
    let connected: HashSet<NodeId> = log.borrow().iter().map(|&(n, _)| n).collect();
    assert_eq!(log.borrow().len(), 4);
    assert_eq!(connected, HashSet::from([host, root, slot, light]));

    log.borrow_mut().clear();
    doc.remove_child(body, host).unwrap();
    doc.flush().unwrap();
    assert_eq!(log.borrow().len(), 4);
    assert!(log.borrow().iter().all(|&(_, c)| !c));
    assert!(!doc.is_connected(light));
}

#[test]
fn test_connection_unchanged_by_move() {
    let mut doc = Document::new();
    let log: ConnectionLog = Rc::new(RefCell::new(Vec::new()));
    let body = doc.body();
    let head = doc.head();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    doc.flush().unwrap();

    doc.set_connection_hook(RecordingConnection(Rc::clone(&log)));
    doc.append_child(head, div).unwrap();
    doc.flush().unwrap();
    assert!(log.borrow().is_empty());
}
