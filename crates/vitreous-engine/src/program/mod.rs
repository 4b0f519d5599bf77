//! WGSL programs: CPU-side compilation, link checks and location lookup.
//!
//! Programs are validated with `naga` before any GPU object is created, so
//! compile and link failures surface as [`ShaderError`] values that callers
//! log and contain per surface.

mod cache;
mod error;
mod program;
mod variant;

pub use cache::ProgramCache;
pub use error::ShaderError;
pub use program::{Location, ProgramSource, ShaderProgram};
pub use variant::{ShaderVariant, FRAGMENT_ENTRY, QUAD_ATTRIBUTES, VERTEX_ENTRY};
