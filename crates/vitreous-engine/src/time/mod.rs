//! Time sources and frame timing.
//!
//! - [`Clock`] abstracts "now"; [`SystemClock`] for real use, [`ManualClock`] for tests
//! - [`FrameClock`] turns successive timestamps into clamped [`FrameTime`] deltas

mod clock;
mod frame_clock;

pub use clock::{Clock, ManualClock, SystemClock};
pub use frame_clock::{FrameClock, FrameTime};
