use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// Width of a single line of text, in logical pixels.
///
/// Content-sized surfaces use this to derive their intrinsic extent.
pub trait TextMeasure {
    fn line_width(&self, text: &str, font_size: f32) -> f32;
}

/// Fallback measure used when no font is loaded.
///
/// Assumes every character advances by `advance_em * font_size`.
#[derive(Debug, Copy, Clone)]
pub struct AverageAdvance {
    pub advance_em: f32,
}

impl Default for AverageAdvance {
    fn default() -> Self {
        Self { advance_em: 0.55 }
    }
}

impl TextMeasure for AverageAdvance {
    fn line_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.advance_em * font_size.max(0.0)
    }
}

/// Owns loaded fonts and measures text with `fontdue` layout.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
    primary: Option<FontId>,
    fallback: AverageAdvance,
}

impl FontSystem {
    pub fn new() -> Self {
        Self {
            fonts: Vec::new(),
            primary: None,
            fallback: AverageAdvance::default(),
        }
    }

    /// Parses a TrueType/OpenType font. The first font loaded becomes the
    /// one used by [`TextMeasure`].
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        self.primary.get_or_insert(id);
        log::debug!("font loaded: {id:?}");
        Ok(id)
    }

    pub fn primary(&self) -> Option<FontId> {
        self.primary
    }

    /// Advance width of a single unwrapped line set in font `id`.
    ///
    /// Returns `None` for an unknown id.
    #[must_use]
    pub fn measure_line(&self, text: &str, id: FontId, size: f32) -> Option<f32> {
        use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

        let font = self.fonts.get(id.0)?;
        let size = size.max(0.0);

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(std::slice::from_ref(font), &TextStyle::new(text, size, 0));

        // Pen position after each glyph, not the bitmap edge.
        let width = layout
            .glyphs()
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max);
        Some(width)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for FontSystem {
    fn line_width(&self, text: &str, font_size: f32) -> f32 {
        self.primary
            .and_then(|id| self.measure_line(text, id, font_size))
            .unwrap_or_else(|| self.fallback.line_width(text, font_size))
    }
}
