/// What the frame loop does after the swapchain rejects a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Swapchain reconfigured; try again next frame.
    Reconfigured,
    SkipFrame,
    /// Unrecoverable (out of memory); the runtime shuts down.
    Fatal,
}
