use ahash::HashMap;
use glam::Vec2;
use pyrite_core::geometry::Rect;

use crate::texture::Texture2D;

/// Metrics for one character in a [`TextureFont`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Pixel region of the atlas holding this glyph's image. An empty rect
    /// (e.g. for a space) means the glyph advances the pen but draws
    /// nothing.
    pub source: Rect<f32>,
    /// Offset from the pen to the glyph quad's top-left, in unscaled pixels.
    pub bearing: Vec2,
    /// Horizontal pen advance after this glyph, in unscaled pixels.
    pub advance: f32,
}

/// A bitmap font: one atlas texture plus per-character metrics.
///
/// How the atlas gets rasterized is the caller's concern; the renderer only
/// needs lookups.
pub struct TextureFont {
    atlas: Texture2D,
    glyphs: HashMap<char, Glyph>,
    line_height: f32,
    fallback_advance: f32,
}

impl TextureFont {
    /// `line_height` is the vertical pen advance for `'\n'`;
    /// `fallback_advance` is the horizontal advance for characters the font
    /// has no glyph for. Both in unscaled pixels.
    pub fn new(atlas: Texture2D, line_height: f32, fallback_advance: f32) -> Self {
        Self {
            atlas,
            glyphs: HashMap::default(),
            line_height,
            fallback_advance,
        }
    }

    pub fn with_glyph(mut self, ch: char, glyph: Glyph) -> Self {
        self.insert_glyph(ch, glyph);
        self
    }

    pub fn insert_glyph(&mut self, ch: char, glyph: Glyph) {
        self.glyphs.insert(ch, glyph);
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn atlas(&self) -> &Texture2D {
        &self.atlas
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn fallback_advance(&self) -> f32 {
        self.fallback_advance
    }
}
