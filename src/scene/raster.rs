//! Software rasterizer used by [`super::MemoryScene`] for exports.
//!
//! Every pixel center inside an object's bounding box is mapped back into the
//! object's local space and shaded there, so rotation, flips and scale come
//! for free. Text is shaded from a glyph coverage mask built once per export.

use std::collections::HashMap;

use egui::{Color32, Pos2, Rect, Vec2, pos2, vec2};
use image::{Rgba, RgbaImage};

use super::glyphs::{GlyphMask, bundled_font};
use super::{ObjectId, SceneObject, Shape};
use crate::error::{EditorError, EditorResult};

type Rgbaf = [f32; 4];

const TRANSPARENT: Rgbaf = [0.0; 4];

/// Largest surface, in pixels, that exports and offscreen scenes may allocate
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

/// Rejects empty surfaces and surfaces past [`MAX_SURFACE_PIXELS`]
pub fn check_surface(width: u32, height: u32) -> EditorResult<()> {
    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_SURFACE_PIXELS {
        return Err(EditorError::RenderContext { width, height });
    }
    Ok(())
}

/// Pixel extent of a scene-space size at `multiplier`
pub fn surface_extent(size: Vec2, multiplier: f32) -> EditorResult<(u32, u32)> {
    // Float to int casts saturate, NaN becomes zero
    let to_pixels = |length: f32| (length * multiplier).round().max(0.0) as u32;
    let (width, height) = (to_pixels(size.x), to_pixels(size.y));
    check_surface(width, height)?;
    Ok((width, height))
}

/// Paints `objects` bottom to top over `background`
pub fn rasterize(
    objects: &[SceneObject],
    size: Vec2,
    background: Color32,
    multiplier: f32,
) -> EditorResult<RgbaImage> {
    let (width, height) = surface_extent(size, multiplier)?;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(background.to_srgba_unmultiplied()));
    for object in objects {
        paint_object(&mut canvas, object, multiplier);
    }
    Ok(canvas)
}

type GlyphMasks = HashMap<ObjectId, GlyphMask>;

/// Builds the coverage masks for every text object in `object`'s subtree
fn collect_glyph_masks(object: &SceneObject, resolution: f32, masks: &mut GlyphMasks) {
    let resolution = resolution * object.scale_x.abs().max(object.scale_y.abs()).max(f32::EPSILON);
    match &object.shape {
        Shape::Text { content, font_size, font_family, .. } => {
            if let Some(font) = bundled_font(font_family) {
                masks.insert(object.id, GlyphMask::render(font, content, *font_size, resolution));
            }
        }
        Shape::Group { children } => {
            for child in children {
                collect_glyph_masks(child, resolution, masks);
            }
        }
        _ => {}
    }
}

fn paint_object(canvas: &mut RgbaImage, object: &SceneObject, multiplier: f32) {
    let mut masks = GlyphMasks::new();
    collect_glyph_masks(object, multiplier, &mut masks);

    let bounds = object.bounding_rect().expand(object.stroke_width.max(1.0));
    let x0 = (bounds.min.x * multiplier).floor().max(0.0) as u32;
    let y0 = (bounds.min.y * multiplier).floor().max(0.0) as u32;
    let x1 = ((bounds.max.x * multiplier).ceil().max(0.0) as u32).min(canvas.width());
    let y1 = ((bounds.max.y * multiplier).ceil().max(0.0) as u32).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let world = pos2((x as f32 + 0.5) / multiplier, (y as f32 + 0.5) / multiplier);
            if let Some(color) = sample(object, world, &masks) {
                let pixel = canvas.get_pixel_mut(x, y);
                let below = to_float(pixel.0);
                pixel.0 = to_bytes(over(color, below));
            }
        }
    }
}

/// Color of `object` at a scene point with the object's opacity applied
fn sample(object: &SceneObject, world: Pos2, masks: &GlyphMasks) -> Option<Rgbaf> {
    let local = object.world_to_local(world)?;
    let half = object.stroke_width / 2.0;
    let stroke = object.stroke.map(color_to_float);
    let fill = object.fill.map(color_to_float);

    let color = match &object.shape {
        Shape::Rect { width, height } => {
            let rect = Rect::from_min_size(Pos2::ZERO, vec2(*width, *height));
            let on_stroke = rect.expand(half).contains(local) && !rect.shrink(half).contains(local);
            if on_stroke && stroke.is_some() {
                stroke
            } else if rect.contains(local) {
                fill
            } else {
                None
            }
        }
        Shape::Ellipse { rx, ry } => {
            if *rx <= 0.0 || *ry <= 0.0 {
                return None;
            }
            let nx = (local.x - rx) / rx;
            let ny = (local.y - ry) / ry;
            let radial = (nx * nx + ny * ny).sqrt();
            let edge_distance = (radial - 1.0) * rx.min(*ry);
            if edge_distance.abs() <= half && stroke.is_some() {
                stroke
            } else if radial <= 1.0 {
                fill
            } else {
                None
            }
        }
        Shape::Line { from, to } => {
            (segment_distance(local, *from, *to) <= half.max(0.5)).then_some(stroke).flatten()
        }
        Shape::Path { points } => {
            let distance = match points.as_slice() {
                [] => f32::INFINITY,
                [only] => local.distance(*only),
                _ => points
                    .windows(2)
                    .map(|pair| segment_distance(local, pair[0], pair[1]))
                    .fold(f32::INFINITY, f32::min),
            };
            (distance <= half.max(0.5)).then_some(stroke).flatten()
        }
        Shape::Text { .. } => {
            let coverage = masks.get(&object.id)?.coverage_at(local);
            let [r, g, b, a] = fill.or(stroke)?;
            (coverage > 0.0).then_some([r, g, b, a * coverage])
        }
        Shape::Image { source } => {
            let pixels = source.pixels()?;
            if local.x < 0.0 || local.y < 0.0 {
                return None;
            }
            let (px, py) = (local.x as u32, local.y as u32);
            (px < pixels.width() && py < pixels.height())
                .then(|| to_float(pixels.get_pixel(px, py).0))
        }
        Shape::Group { children } => {
            let composed = children
                .iter()
                .filter_map(|child| sample(child, local, masks))
                .fold(TRANSPARENT, |below, above| over(above, below));
            (composed[3] > 0.0).then_some(composed)
        }
    }?;

    let [r, g, b, a] = color;
    Some([r, g, b, a * object.opacity.clamp(0.0, 1.0)])
}

fn segment_distance(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Source-over compositing on unmultiplied colors
fn over(above: Rgbaf, below: Rgbaf) -> Rgbaf {
    let alpha = above[3] + below[3] * (1.0 - above[3]);
    if alpha <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |i: usize| (above[i] * above[3] + below[i] * below[3] * (1.0 - above[3])) / alpha;
    [channel(0), channel(1), channel(2), alpha]
}

fn color_to_float(color: Color32) -> Rgbaf {
    to_float(color.to_srgba_unmultiplied())
}

fn to_float(bytes: [u8; 4]) -> Rgbaf {
    bytes.map(|c| c as f32 / 255.0)
}

fn to_bytes(color: Rgbaf) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
