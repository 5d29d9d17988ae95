//! Host integration hooks
//!
//! Optional callbacks the embedding engine installs on a [`crate::Document`].
//! A missing hook is a no-op.

use std::fmt;

use crate::NodeId;

/// Notified when a node moves between style scopes.
///
/// A scope is named after the local name of the shadow host owning the tree;
/// `None` is the document scope. Only the moved subtree's top node is reported.
pub trait ScopeHook {
    fn scope_changed(&mut self, node: NodeId, from: Option<&str>, to: Option<&str>);
}

/// Notified when a node's connection to the document changes.
///
/// Connection walks logical parents and crosses from shadow roots to hosts.
/// Notifications are delivered at the end of a flush.
pub trait ConnectionHook {
    fn connected(&mut self, node: NodeId);
    fn disconnected(&mut self, node: NodeId);
}

#[derive(Default)]
pub(crate) struct Hooks {
    pub scope: Option<Box<dyn ScopeHook>>,
    pub connection: Option<Box<dyn ConnectionHook>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("scope", &self.scope.is_some())
            .field("connection", &self.connection.is_some())
            .finish()
    }
}

impl Hooks {
    pub fn scope_changed(&mut self, node: NodeId, from: Option<&str>, to: Option<&str>) {
        if from == to {
            return;
        }
        if let Some(hook) = self.scope.as_mut() {
            hook.scope_changed(node, from, to);
        }
    }

    pub fn connection_changed(&mut self, node: NodeId, connected: bool) {
        if let Some(hook) = self.connection.as_mut() {
            if connected {
                hook.connected(node);
            } else {
                hook.disconnected(node);
            }
        }
    }
}
