use bytemuck::{Pod, Zeroable};

use crate::config::GlassConfig;
use crate::coords::{PixelSize, Vec2};

// ── quad ──────────────────────────────────────────────────────────────────

/// Vertex of the full-surface quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

const fn quad_vertex(x: f32, y: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        texcoord: [(x + 1.0) * 0.5, (1.0 - y) * 0.5],
    }
}

/// Two triangles covering clip space. Texcoord y runs 0 at the top to 1 at
/// the bottom.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    quad_vertex(-1.0, -1.0),
    quad_vertex(1.0, -1.0),
    quad_vertex(-1.0, 1.0),
    quad_vertex(-1.0, 1.0),
    quad_vertex(1.0, -1.0),
    quad_vertex(1.0, 1.0),
];

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── standalone ────────────────────────────────────────────────────────────

/// `StandaloneParams` in `standalone.wgsl` (16 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct StandaloneUniforms {
    pub resolution: [f32; 2],
    pub border_radius: f32,
    pub tint_opacity: f32,
}

impl StandaloneUniforms {
    pub fn new(size: PixelSize, radius: f32, config: &GlassConfig) -> Self {
        Self {
            resolution: size.to_vec2().to_array(),
            border_radius: radius,
            tint_opacity: config.tint_opacity,
        }
    }
}

// ── nested ────────────────────────────────────────────────────────────────

/// Geometry a nested surface needs to reproject into its parent.
///
/// Centers are in screen space; sizes are target sizes in pixels.
#[derive(Debug, Copy, Clone)]
pub struct NestedGeometry {
    pub size: PixelSize,
    pub center: Vec2,
    pub radius: f32,
    pub parent_size: PixelSize,
    pub parent_center: Vec2,
}

/// `NestedParams` in `nested.wgsl` (96 bytes).
///
///  offset  0  resolution          vec2
///  offset  8  texture_size        vec2
///  offset 16  button_position     vec2
///  offset 24  container_position  vec2
///  offset 32  container_size      vec2
///  offset 40  border_radius .. _pad0, 14 x f32
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct NestedUniforms {
    pub resolution: [f32; 2],
    pub texture_size: [f32; 2],
    pub button_position: [f32; 2],
    pub container_position: [f32; 2],
    pub container_size: [f32; 2],
    pub border_radius: f32,
    pub blur_radius: f32,
    pub warp: f32,
    pub edge_intensity: f32,
    pub rim_intensity: f32,
    pub base_intensity: f32,
    pub edge_distance: f32,
    pub rim_distance: f32,
    pub base_distance: f32,
    pub corner_boost: f32,
    pub ripple_effect: f32,
    pub tint_opacity: f32,
    /// Carried for custom nested sources; `nested.wgsl` ignores it.
    pub fixed_background: f32,
    pub _pad0: f32,
}

impl NestedUniforms {
    pub fn new(geometry: &NestedGeometry, config: &GlassConfig) -> Self {
        let fx = &config.effects;
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            resolution: geometry.size.to_vec2().to_array(),
            texture_size: geometry.parent_size.to_vec2().to_array(),
            button_position: geometry.center.to_array(),
            container_position: geometry.parent_center.to_array(),
            container_size: geometry.parent_size.to_vec2().to_array(),
            border_radius: geometry.radius,
            blur_radius: config.resolved_blur_radius(true),
            warp: flag(config.warp),
            edge_intensity: fx.edge_intensity,
            rim_intensity: fx.rim_intensity,
            base_intensity: fx.base_intensity,
            edge_distance: fx.edge_distance,
            rim_distance: fx.rim_distance,
            base_distance: fx.base_distance,
            corner_boost: fx.corner_boost,
            ripple_effect: fx.ripple_effect,
            tint_opacity: config.tint_opacity,
            fixed_background: flag(config.resolved_fixed_background()),
            _pad0: 0.0,
        }
    }
}

/// Uniform block for whichever variant a surface runs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SurfaceUniforms {
    Standalone(StandaloneUniforms),
    Nested(NestedUniforms),
}

impl SurfaceUniforms {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Standalone(u) => bytemuck::bytes_of(u),
            Self::Nested(u) => bytemuck::bytes_of(u),
        }
    }

    pub fn resolution(&self) -> [f32; 2] {
        match self {
            Self::Standalone(u) => u.resolution,
            Self::Nested(u) => u.resolution,
        }
    }

    pub fn border_radius(&self) -> f32 {
        match self {
            Self::Standalone(u) => u.border_radius,
            Self::Nested(u) => u.border_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn uniform_sizes_match_wgsl_layout() {
        assert_eq!(size_of::<StandaloneUniforms>(), 16);
        assert_eq!(size_of::<NestedUniforms>(), 96);
        assert_eq!(offset_of!(NestedUniforms, container_size), 32);
        assert_eq!(offset_of!(NestedUniforms, border_radius), 40);
        assert_eq!(offset_of!(NestedUniforms, _pad0), 92);
    }

    #[test]
    fn quad_maps_bottom_left_to_texcoord_bottom() {
        assert_eq!(QUAD_VERTICES[0].texcoord, [0.0, 1.0]);
        assert_eq!(QUAD_VERTICES[5].position, [1.0, 1.0]);
        assert_eq!(QUAD_VERTICES[5].texcoord, [1.0, 0.0]);
    }

    #[test]
    fn nested_uniforms_carry_role_defaults() {
        let config = GlassConfig::button("Ok", 22.0);
        let u = NestedUniforms::new(
            &NestedGeometry {
                size: PixelSize::new(110, 55),
                center: Vec2::new(200.0, 100.0),
                radius: 27.5,
                parent_size: PixelSize::new(720, 200),
                parent_center: Vec2::new(360.0, 100.0),
            },
            &config,
        );
        assert_eq!(u.resolution, [110.0, 55.0]);
        assert_eq!(u.container_size, [720.0, 200.0]);
        assert_eq!(u.blur_radius, 2.0);
        assert_eq!(u.fixed_background, 1.0);
        assert_eq!(u.warp, 0.0);
        assert_eq!(u.rim_distance, 0.8);
        assert_eq!(SurfaceUniforms::Nested(u).as_bytes().len(), 96);
    }

    #[test]
    fn fixed_background_override_is_uploaded_but_not_sampled() {
        let config = GlassConfig::button("Ok", 22.0).with_fixed_background(false);
        let u = NestedUniforms::new(
            &NestedGeometry {
                size: PixelSize::new(88, 55),
                center: Vec2::new(100.0, 100.0),
                radius: 22.0,
                parent_size: PixelSize::new(720, 200),
                parent_center: Vec2::new(360.0, 100.0),
            },
            &config,
        );
        assert_eq!(u.fixed_background, 0.0);
        assert!(!crate::program::ShaderVariant::Nested
            .wgsl()
            .contains("params.fixed_background"));
    }
}
