use thiserror::Error;

use crate::shape::ShapeKind;
use crate::text::TextMeasure;

/// Blur radius used by root surfaces when none is configured.
pub const STANDALONE_BLUR_PX: f32 = 5.0;
/// Blur radius used by nested surfaces when none is configured.
pub const NESTED_BLUR_PX: f32 = 2.0;

/// Refraction tuning for the nested material.
///
/// Intensities scale the UV displacement; distances are per-pixel falloff
/// rates measured inward from the shape edge.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EffectParams {
    pub edge_intensity: f32,
    pub rim_intensity: f32,
    pub base_intensity: f32,
    pub edge_distance: f32,
    pub rim_distance: f32,
    pub base_distance: f32,
    pub corner_boost: f32,
    pub ripple_effect: f32,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            edge_intensity: 0.01,
            rim_intensity: 0.05,
            base_intensity: 0.01,
            edge_distance: 0.15,
            rim_distance: 0.8,
            base_distance: 0.1,
            corner_boost: 0.02,
            ripple_effect: 0.1,
        }
    }
}

impl EffectParams {
    fn fields(&self) -> [(&'static str, f32); 8] {
        [
            ("edge_intensity", self.edge_intensity),
            ("rim_intensity", self.rim_intensity),
            ("base_intensity", self.base_intensity),
            ("edge_distance", self.edge_distance),
            ("rim_distance", self.rim_distance),
            ("base_distance", self.base_distance),
            ("corner_boost", self.corner_boost),
            ("ripple_effect", self.ripple_effect),
        ]
    }
}

/// Text a surface is sized around.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    pub text: String,
    pub font_size: f32,
}

impl TextContent {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self { text: text.into(), font_size }
    }
}

/// Extent a content-sized surface asks the host to lay it out at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContentExtent {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite and >= 0, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("tint_opacity must be within [0, 1], got {0}")]
    TintOutOfRange(f32),

    #[error("font_size must be finite and > 0, got {0}")]
    FontSize(f32),
}

/// Style options for one glass surface.
///
/// Role-dependent values (`blur_radius_px`, `fixed_background`) stay `None`
/// until the surface knows whether it is nested; see the `resolved_*` getters.
#[derive(Debug, Clone, PartialEq)]
pub struct GlassConfig {
    /// Authored shape. Drives the geometry overrides applied after measuring.
    pub shape: ShapeKind,
    /// Authored radius. Rounded rects use it as-is, without clamping.
    pub corner_radius_px: f32,
    pub tint_opacity: f32,
    pub blur_radius_px: Option<f32>,
    /// Uploaded with the nested uniforms but not read by the built-in
    /// shaders: nested glass always samples the parent's target, so its
    /// backdrop moves with the parent regardless of this flag.
    pub fixed_background: Option<bool>,
    pub warp: bool,
    pub effects: EffectParams,
    pub content: Option<TextContent>,
}

impl Default for GlassConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::RoundedRect,
            corner_radius_px: 48.0,
            tint_opacity: 0.2,
            blur_radius_px: None,
            fixed_background: None,
            warp: false,
            effects: EffectParams::default(),
            content: None,
        }
    }
}

impl GlassConfig {
    /// Content-sized surface; the radius starts at the font size.
    pub fn button(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            corner_radius_px: font_size,
            content: Some(TextContent::new(text, font_size)),
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: ShapeKind) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_corner_radius(mut self, radius_px: f32) -> Self {
        self.corner_radius_px = radius_px;
        self
    }

    pub fn with_tint_opacity(mut self, tint: f32) -> Self {
        self.tint_opacity = tint;
        self
    }

    pub fn with_blur_radius(mut self, radius_px: f32) -> Self {
        self.blur_radius_px = Some(radius_px);
        self
    }

    pub fn with_fixed_background(mut self, fixed: bool) -> Self {
        self.fixed_background = Some(fixed);
        self
    }

    pub fn with_warp(mut self, warp: bool) -> Self {
        self.warp = warp;
        self
    }

    pub fn with_effects(mut self, effects: EffectParams) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_content(mut self, content: TextContent) -> Self {
        self.content = Some(content);
        self
    }

    pub fn resolved_blur_radius(&self, nested: bool) -> f32 {
        self.blur_radius_px
            .unwrap_or(if nested { NESTED_BLUR_PX } else { STANDALONE_BLUR_PX })
    }

    /// Button-like surfaces (those with content) default to a fixed backdrop.
    pub fn resolved_fixed_background(&self) -> bool {
        self.fixed_background.unwrap_or(self.content.is_some())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("corner_radius_px", self.corner_radius_px)?;
        if !(0.0..=1.0).contains(&self.tint_opacity) {
            return Err(ConfigError::TintOutOfRange(self.tint_opacity));
        }
        if let Some(blur) = self.blur_radius_px {
            non_negative("blur_radius_px", blur)?;
        }
        for (field, value) in self.effects.fields() {
            non_negative(field, value)?;
        }
        if let Some(content) = &self.content {
            if !(content.font_size.is_finite() && content.font_size > 0.0) {
                return Err(ConfigError::FontSize(content.font_size));
            }
        }
        Ok(())
    }

    /// Intrinsic extent implied by the text content, if any.
    ///
    /// Circles become a `2.5 * font_size` square. Pills and rounded rects get
    /// one font size of padding on each side and a `2.5 * font_size` height.
    pub fn content_extent(&self, measure: &dyn TextMeasure) -> Option<ContentExtent> {
        let content = self.content.as_ref()?;
        let fs = content.font_size;

        let extent = match self.shape {
            ShapeKind::Circle => {
                let side = fs * 2.5;
                ContentExtent { width: side, height: side, radius: side / 2.0 }
            }
            ShapeKind::Pill => {
                let width = (measure.line_width(&content.text, fs) + fs * 2.0).ceil();
                let height = (fs * 2.5).ceil();
                ContentExtent { width, height, radius: height / 2.0 }
            }
            ShapeKind::RoundedRect => {
                let width = (measure.line_width(&content.text, fs) + fs * 2.0).ceil();
                let height = (fs * 2.5).ceil();
                ContentExtent { width, height, radius: fs }
            }
        };
        Some(extent)
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
