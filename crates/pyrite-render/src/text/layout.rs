use glam::Vec2;
use pyrite_core::geometry::Rect;

use super::font::TextureFont;

/// One glyph placed by [`layout`]: where it lands on screen and which atlas
/// region it samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub dest: Rect<f32>,
    pub source: Rect<f32>,
    pub ch: char,
}

/// The result of laying out a string: visible glyphs plus the pen position
/// after the last character.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub glyphs: Vec<PlacedGlyph>,
    pub pen: Vec2,
}

/// Lay out `text` starting at `origin`.
///
/// Policies:
/// - `'\n'` resets the pen to `origin.x` and advances down by
///   `line_height * scale`. No `'\r'` handling, no word wrap.
/// - Characters without a glyph advance by `fallback_advance * scale` and
///   draw nothing.
/// - Glyphs with an empty source rect (spaces) advance without geometry.
/// - Every advance scales with `scale`, so `scale == 0` leaves the pen at
///   `origin` and places only zero-area glyphs.
pub fn layout(text: &str, origin: Vec2, font: &TextureFont, scale: f32) -> GlyphRun {
    let mut pen = origin;
    let mut glyphs = Vec::new();

    for ch in text.chars() {
        if ch == '\n' {
            pen.x = origin.x;
            pen.y += font.line_height() * scale;
            continue;
        }
        let Some(glyph) = font.glyph(ch) else {
            pen.x += font.fallback_advance() * scale;
            continue;
        };
        if glyph.source.width > 0.0 && glyph.source.height > 0.0 {
            glyphs.push(PlacedGlyph {
                dest: Rect::new(
                    pen.x + glyph.bearing.x * scale,
                    pen.y + glyph.bearing.y * scale,
                    glyph.source.width * scale,
                    glyph.source.height * scale,
                ),
                source: glyph.source,
                ch,
            });
        }
        pen.x += glyph.advance * scale;
    }

    GlyphRun { glyphs, pen }
}
