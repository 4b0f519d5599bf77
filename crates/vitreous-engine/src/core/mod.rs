//! Contract between the window runtime and applications.

mod app;
mod ctx;

pub use app::{App, AppControl, ScrollDelta};
pub use ctx::{FrameCtx, WindowCtx};
