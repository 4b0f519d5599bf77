use crate::shape::wgsl_prelude;

use super::{ProgramSource, ShaderError, ShaderProgram};

const QUAD: &str = include_str!("shaders/quad.wgsl");
const STANDALONE: &str = include_str!("shaders/standalone.wgsl");
const NESTED: &str = include_str!("shaders/nested.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Vertex inputs of the shared full-surface quad.
pub const QUAD_ATTRIBUTES: &[&str] = &["position", "texcoord"];

/// The two glass materials a surface can run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderVariant {
    /// Geometry-only highlights for root surfaces.
    Standalone,
    /// Refraction and blur of the parent's render target.
    Nested,
}

impl ShaderVariant {
    pub fn label(self) -> &'static str {
        match self {
            Self::Standalone => "glass.standalone",
            Self::Nested => "glass.nested",
        }
    }

    pub fn uniforms(self) -> &'static [&'static str] {
        match self {
            Self::Standalone => &["params"],
            Self::Nested => &["params", "parent_texture", "parent_sampler"],
        }
    }

    /// Full WGSL: shape prelude, shared quad stage, then the material body.
    pub fn wgsl(self) -> String {
        let body = match self {
            Self::Standalone => STANDALONE,
            Self::Nested => NESTED,
        };
        format!("{}\n{}\n{}", wgsl_prelude(), QUAD, body)
    }

    pub fn compile(self) -> Result<ShaderProgram, ShaderError> {
        let wgsl = self.wgsl();
        ShaderProgram::compile(ProgramSource {
            label: self.label(),
            wgsl: &wgsl,
            vertex_entry: VERTEX_ENTRY,
            fragment_entry: FRAGMENT_ENTRY,
            attributes: QUAD_ATTRIBUTES,
            uniforms: self.uniforms(),
        })
    }
}
