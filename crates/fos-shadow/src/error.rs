//! Error types
//!
//! Precondition violations are rejected synchronously at the call site. A
//! render loop is fatal for the flush that detected it. Listener failures are
//! collected and re-raised once the surrounding dispatch or flush completes.

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, ShadowError>;

/// Shadow tree errors
#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    /// Node id is stale or was never allocated
    #[error("Node not found: {0:?}")]
    NotFound(NodeId),

    /// Insertion would produce an invalid tree
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// Reference or removed node is not a child of the container
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Operation needs an element
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// Element already has a shadow root
    #[error("Element already has a shadow root")]
    AlreadyAttached,

    /// Node cannot host a shadow root
    #[error("Element does not support shadow root")]
    NotSupported,

    /// Destroying a node that still has a parent
    #[error("Node {0:?} is still attached")]
    StillAttached(NodeId),

    /// The projection graph kept re-invalidating itself during one flush
    #[error("render loop detected: flush exceeded {limit} iterations")]
    RenderLoop { limit: usize },

    /// An event listener failed during dispatch
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Failure reported by an event listener
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Event listener failed: {message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Create a listener error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The listener's message
    pub fn message(&self) -> &str {
        &self.message
    }
}
