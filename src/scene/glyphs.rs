//! Glyph coverage for exporting text objects.
//!
//! Text is laid out with the fonts egui bundles, so exports use the same
//! faces the interactive painter shows.

use std::sync::OnceLock;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use egui::Pos2;

/// Coverage masks never grow past this many cells
const MAX_MASK_CELLS: u64 = 16 * 1024 * 1024;

/// Egui's bundled font for a text object's family
pub fn bundled_font(family: &str) -> Option<&'static FontArc> {
    static PROPORTIONAL: OnceLock<Option<FontArc>> = OnceLock::new();
    static MONOSPACE: OnceLock<Option<FontArc>> = OnceLock::new();

    let (cell, name) = if family.eq_ignore_ascii_case("monospace") {
        (&MONOSPACE, "Hack")
    } else {
        (&PROPORTIONAL, "Ubuntu-Light")
    };
    cell.get_or_init(|| load_bundled(name)).as_ref()
}

fn load_bundled(name: &str) -> Option<FontArc> {
    let definitions = egui::FontDefinitions::default();
    let Some(data) = definitions.font_data.get(name) else {
        log::warn!("Font {} is not bundled, text will be missing from exports", name);
        return None;
    };
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(font) => Some(font),
        Err(err) => {
            log::error!("Failed to load font {}: {}", name, err);
            None
        }
    }
}

/// Anti-aliased coverage of a text block in the object's local space,
/// sampled at `resolution` cells per local unit
#[derive(Debug, Clone)]
pub struct GlyphMask {
    resolution: f32,
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn render(font: &FontArc, content: &str, font_size: f32, resolution: f32) -> Self {
        let empty = Self {
            resolution,
            width: 0,
            height: 0,
            coverage: Vec::new(),
        };
        if font_size <= 0.0 || resolution <= 0.0 || !resolution.is_finite() {
            return empty;
        }

        let scaled = font.as_scaled(font_size * resolution);
        let ascent = scaled.ascent();
        let line_height = scaled.height() + scaled.line_gap();

        let mut placed = Vec::new();
        let mut max_width = 0.0f32;
        let mut lines = 0usize;
        for (row, line) in content.lines().enumerate() {
            lines = row + 1;
            let baseline = ascent + row as f32 * line_height;
            let mut cursor = 0.0;
            let mut previous: Option<GlyphId> = None;
            for c in line.chars() {
                let id = scaled.glyph_id(c);
                if let Some(previous) = previous {
                    cursor += scaled.kern(previous, id);
                }
                placed.push(id.with_scale_and_position(scaled.scale(), point(cursor, baseline)));
                cursor += scaled.h_advance(id);
                previous = Some(id);
            }
            max_width = max_width.max(cursor);
        }

        let width = max_width.ceil().max(0.0) as u64;
        let height = (lines as f32 * line_height).ceil().max(0.0) as u64;
        if width == 0 || height == 0 {
            return empty;
        }
        if width.saturating_mul(height) > MAX_MASK_CELLS {
            log::warn!("Text mask of {}x{} is too large to export", width, height);
            return empty;
        }

        let (width, height) = (width as u32, height as u32);
        let mut coverage = vec![0.0; (width * height) as usize];
        for glyph in placed {
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|x, y, c| {
                let px = bounds.min.x as i64 + x as i64;
                let py = bounds.min.y as i64 + y as i64;
                if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                    return;
                }
                let cell = &mut coverage[py as usize * width as usize + px as usize];
                *cell = (*cell + c).min(1.0);
            });
        }

        Self {
            resolution,
            width,
            height,
            coverage,
        }
    }

    /// Coverage in `0..=1` at a local point
    pub fn coverage_at(&self, local: Pos2) -> f32 {
        if local.x < 0.0 || local.y < 0.0 {
            return 0.0;
        }
        let x = (local.x * self.resolution) as u32;
        let y = (local.y * self.resolution) as u32;
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.coverage[(y * self.width + x) as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.coverage.iter().all(|c| *c <= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_bundled_fonts_are_available() {
        assert!(bundled_font("sans-serif").is_some());
        assert!(bundled_font("monospace").is_some());
    }

    #[test]
    fn test_mask_covers_glyphs_only() {
        let font = bundled_font("sans-serif").unwrap();
        let mask = GlyphMask::render(font, "H", 40.0, 1.0);
        assert!(!mask.is_empty());
        assert_eq!(mask.coverage_at(pos2(-1.0, 5.0)), 0.0);
        assert_eq!(mask.coverage_at(pos2(5000.0, 5.0)), 0.0);
    }

    #[test]
    fn test_blank_text_has_no_coverage() {
        let font = bundled_font("sans-serif").unwrap();
        assert!(GlyphMask::render(font, "", 20.0, 2.0).is_empty());
        assert!(GlyphMask::render(font, "   ", 20.0, 2.0).is_empty());
        assert!(GlyphMask::render(font, "A", 0.0, 2.0).is_empty());
    }
}
