//! Event object
//!
//! An in-flight event: type and flags, plus the dispatch state listeners can
//! observe (current target, retargeted target, phase, composed path).

use crate::NodeId;

/// Event types that cross shadow boundaries regardless of the `composed` flag
const ALWAYS_COMPOSED: &[&str] = &[
    "blur",
    "focus",
    "focusin",
    "focusout",
    "click",
    "dblclick",
    "dragstart",
    "drag",
    "dragenter",
    "dragleave",
    "dragover",
    "drop",
    "dragend",
    "mousedown",
    "mouseenter",
    "mouseleave",
    "mousemove",
    "mouseout",
    "mouseover",
    "mouseup",
    "wheel",
    "beforeinput",
    "input",
    "keydown",
    "keyup",
    "compositionstart",
    "compositionupdate",
    "compositionend",
    "touchstart",
    "touchend",
    "touchmove",
    "touchcancel",
    "pointerover",
    "pointerenter",
    "pointerdown",
    "pointermove",
    "pointerup",
    "pointercancel",
    "pointerout",
    "pointerleave",
    "gotpointercapture",
    "lostpointercapture",
];

/// Non-bubbling types that still notify shadow hosts along the path
const HOST_NOTIFIED: &[&str] = &["blur", "focus", "mouseenter", "mouseleave"];

/// Whether events of `event_type` always cross shadow boundaries
pub fn is_always_composed(event_type: &str) -> bool {
    ALWAYS_COMPOSED.contains(&event_type)
}

pub(crate) fn notifies_hosts(event_type: &str) -> bool {
    HOST_NOTIFIED.contains(&event_type)
}

/// Something listeners can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// A node
    Node(NodeId),
    /// The global object past the document
    Global,
}

impl EventTarget {
    /// Node behind the target, if any
    pub fn node(self) -> Option<NodeId> {
        match self {
            EventTarget::Node(id) => Some(id),
            EventTarget::Global => None,
        }
    }
}

impl From<NodeId> for EventTarget {
    fn from(id: NodeId) -> Self {
        EventTarget::Node(id)
    }
}

/// Dispatch phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// Event construction options
#[derive(Debug, Clone, Default)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    /// Secondary target (e.g. the node focus moved from)
    pub related_target: Option<NodeId>,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    cancelable: bool,
    composed: bool,
    related_origin: Option<NodeId>,
    pub(crate) path: Vec<EventTarget>,
    pub(crate) target: Option<EventTarget>,
    pub(crate) current_target: Option<EventTarget>,
    pub(crate) related_target: Option<EventTarget>,
    pub(crate) phase: EventPhase,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_stopped: bool,
}

impl Event {
    /// Create an event. Always-composed types are composed regardless of `init`.
    pub fn new(event_type: &str, init: EventInit) -> Self {
        Self {
            event_type: event_type.to_string(),
            bubbles: init.bubbles,
            cancelable: init.cancelable,
            composed: init.composed || is_always_composed(event_type),
            related_origin: init.related_target,
            path: Vec::new(),
            target: None,
            current_target: None,
            related_target: None,
            phase: EventPhase::None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    /// Create a bubbling event
    pub fn bubbling(event_type: &str) -> Self {
        Self::new(
            event_type,
            EventInit {
                bubbles: true,
                ..Default::default()
            },
        )
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    pub fn composed(&self) -> bool {
        self.composed
    }

    /// Target as seen from the current target's scope
    pub fn target(&self) -> Option<EventTarget> {
        self.target
    }

    pub fn current_target(&self) -> Option<EventTarget> {
        self.current_target
    }

    /// Related target as seen from the current target's scope
    pub fn related_target(&self) -> Option<EventTarget> {
        self.related_target
    }

    pub(crate) fn related_origin(&self) -> Option<NodeId> {
        self.related_origin
    }

    pub fn event_phase(&self) -> EventPhase {
        self.phase
    }

    /// Full dispatch path, innermost first
    pub fn composed_path(&self) -> &[EventTarget] {
        &self.path
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop after the current target's listeners
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop before the next listener
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn is_immediate_stopped(&self) -> bool {
        self.immediate_stopped
    }

    /// Reset dispatch state before a new dispatch
    pub(crate) fn begin_dispatch(&mut self, path: Vec<EventTarget>) {
        self.path = path;
        self.target = None;
        self.current_target = None;
        self.related_target = None;
        self.phase = EventPhase::None;
        self.propagation_stopped = false;
        self.immediate_stopped = false;
    }

    pub(crate) fn end_dispatch(&mut self, target: Option<EventTarget>) {
        self.target = target;
        self.current_target = None;
        self.phase = EventPhase::None;
    }
}
