//! Text rendering over a texture-atlas font.
//!
//! [`TextureFont`] maps characters to atlas regions and metrics;
//! [`layout`] turns a string into positioned glyph quads plus a final pen
//! position. The renderer's `draw_string` stitches the two together.

mod font;
mod layout;

pub use font::{Glyph, TextureFont};
pub use layout::{GlyphRun, PlacedGlyph, layout};
