//! Text metrics for content-sized surfaces.

mod font_system;

pub use font_system::{AverageAdvance, FontId, FontLoadError, FontSystem, TextMeasure};
