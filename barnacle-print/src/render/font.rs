//! Glyph generation for ticket rendering.
//!
//! Uses the Spleen 12x24 bitmap font, the size thermal receipts use at
//! 576 dots printable width.

use std::collections::HashMap;

use spleen_font::{FONT_12X24, PSF2Font};

/// Dimensions of the fixed-width ticket font.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub char_width: usize,
    pub char_height: usize,
}

impl FontMetrics {
    pub const DEFAULT: FontMetrics = FontMetrics {
        char_width: 12,
        char_height: 24,
    };
}

/// Cache of generated glyph bitmaps, keyed by character.
#[derive(Default)]
pub struct GlyphCache {
    glyphs: HashMap<char, Vec<u8>>,
}

impl GlyphCache {
    /// Get or generate the bitmap for a character.
    pub fn get(&mut self, ch: char) -> Vec<u8> {
        if let Some(glyph) = self.glyphs.get(&ch) {
            return glyph.to_vec();
        }
        let glyph = generate_glyph(ch);
        self.glyphs.insert(ch, glyph.clone());
        glyph
    }
}

/// Generate a glyph bitmap for a character.
///
/// Returns `char_width * char_height` bytes, 0 white and 1 black.
/// Characters the font does not cover render as a box outline.
pub fn generate_glyph(ch: char) -> Vec<u8> {
    let metrics = FontMetrics::DEFAULT;
    let mut glyph = vec![0u8; metrics.char_width * metrics.char_height];

    let Ok(mut spleen) = PSF2Font::new(FONT_12X24) else {
        draw_box(&mut glyph, metrics.char_width, metrics.char_height);
        return glyph;
    };

    let utf8 = ch.to_string();
    match spleen.glyph_for_utf8(utf8.as_bytes()) {
        Some(rows) => {
            for (gy, row) in rows.enumerate() {
                for (gx, on) in row.enumerate() {
                    let idx = gy * metrics.char_width + gx;
                    if idx < glyph.len() {
                        glyph[idx] = if on { 1 } else { 0 };
                    }
                }
            }
        }
        None => draw_box(&mut glyph, metrics.char_width, metrics.char_height),
    }

    glyph
}

/// Box outline marking an unsupported character.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_has_expected_size() {
        let glyph = generate_glyph('A');
        assert_eq!(glyph.len(), 12 * 24);
    }

    #[test]
    fn test_glyph_has_black_pixels() {
        let glyph = generate_glyph('A');
        assert!(glyph.iter().any(|&p| p != 0));
    }

    #[test]
    fn test_accented_heading_characters_render() {
        // The fixed heading contains an accented O
        let glyph = generate_glyph('Ó');
        assert_eq!(glyph.len(), 12 * 24);
        assert!(glyph.iter().any(|&p| p != 0));
    }

    #[test]
    fn test_cache_returns_same_bitmap() {
        let mut cache = GlyphCache::default();
        let first = cache.get('x');
        let second = cache.get('x');
        assert_eq!(first, second);
    }
}
