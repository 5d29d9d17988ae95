//! Engine Configuration

/// Shadow engine configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on render-queue drain iterations within one flush.
    /// Exceeding it reports [`crate::ShadowError::RenderLoop`].
    pub max_flush_iterations: usize,

    /// Render pending roots before answering slot assignment queries
    pub render_on_read: bool,

    /// Notify shadow hosts of focus/blur/mouseenter/mouseleave as if they
    /// were the target, even though these events do not bubble
    pub retarget_non_bubbling: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_flush_iterations: 100,
            render_on_read: true,
            retarget_non_bubbling: true,
        }
    }
}
