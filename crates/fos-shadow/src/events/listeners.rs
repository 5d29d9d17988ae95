//! Event listener registry
//!
//! Listeners per target with capture/once options and deduplication: adding
//! the same callback for the same type and phase again returns the existing
//! registration.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::event::{Event, EventTarget};
use crate::error::ListenerError;

/// Result of a listener invocation
pub type ListenerResult = Result<(), ListenerError>;

/// Listener callback
pub type Callback = Rc<dyn Fn(&mut Event) -> ListenerResult>;

/// Registered listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Run during the capture phase
    pub capture: bool,
    /// Remove after the first invocation
    pub once: bool,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self {
            capture: true,
            once: false,
        }
    }

    pub fn once() -> Self {
        Self {
            capture: false,
            once: true,
        }
    }
}

struct Listener {
    id: ListenerId,
    event_type: String,
    options: ListenerOptions,
    callback: Callback,
}

/// Listener scheduled for one target during dispatch
pub(crate) struct Invocation {
    pub id: ListenerId,
    pub once: bool,
    pub callback: Callback,
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Listener registry
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_target: HashMap<EventTarget, Vec<Listener>>,
    owners: HashMap<ListenerId, EventTarget>,
    next_id: u64,
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("targets", &self.by_target.len())
            .field("listeners", &self.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Add a listener, deduplicating by callback identity, type and phase
    pub fn add(
        &mut self,
        target: EventTarget,
        event_type: &str,
        options: ListenerOptions,
        callback: Callback,
    ) -> ListenerId {
        let listeners = self.by_target.entry(target).or_default();
        if let Some(existing) = listeners.iter().find(|l| {
            l.event_type == event_type
                && l.options.capture == options.capture
                && same_callback(&l.callback, &callback)
        }) {
            return existing.id;
        }

        let id = ListenerId(self.next_id);
        self.next_id += 1;
        listeners.push(Listener {
            id,
            event_type: event_type.to_string(),
            options,
            callback,
        });
        self.owners.insert(id, target);
        id
    }

    /// Remove a listener
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(target) = self.owners.remove(&id) else {
            return false;
        };
        if let Some(listeners) = self.by_target.get_mut(&target) {
            listeners.retain(|l| l.id != id);
            if listeners.is_empty() {
                self.by_target.remove(&target);
            }
        }
        true
    }

    /// Remove every listener on `target`
    pub fn remove_target(&mut self, target: EventTarget) {
        if let Some(listeners) = self.by_target.remove(&target) {
            for listener in listeners {
                self.owners.remove(&listener.id);
            }
        }
    }

    /// Whether `id` is still registered
    pub fn contains(&self, id: ListenerId) -> bool {
        self.owners.contains_key(&id)
    }

    /// Snapshot of listeners on `target` for one phase, in registration order
    pub fn matching(&self, target: EventTarget, event_type: &str, capture: bool) -> Vec<Invocation> {
        self.by_target
            .get(&target)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|l| l.event_type == event_type && l.options.capture == capture)
                    .map(|l| Invocation {
                        id: l.id,
                        once: l.options.once,
                        callback: Rc::clone(&l.callback),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total registered listeners
    pub fn len(&self) -> usize {
        self.owners.len()
    }
}
