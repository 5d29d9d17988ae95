//! Events
//!
//! Composed event paths, retargeting and capture/bubble dispatch across
//! shadow boundaries.

mod dispatch;
mod event;
mod listeners;
mod path;

pub use event::{is_always_composed, Event, EventInit, EventPhase, EventTarget};
pub use listeners::{Callback, ListenerId, ListenerOptions, ListenerResult};

pub(crate) use event::notifies_hosts;
pub(crate) use listeners::ListenerRegistry;
