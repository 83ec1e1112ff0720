//! Two-phase image crop.
//!
//! Entering crop mode places a marker rectangle over the active image and
//! remembers which image it targets. Committing maps the marker's bounding
//! box onto the image's source pixels, cuts that region out and swaps the
//! image for the cut. The marker is an ordinary scene object; the link to
//! its target lives here, next to the editor, not on the object.

use egui::{Color32, Rect};
use image::imageops;

use crate::codec::ImageSource;
use crate::error::{EditorError, EditorResult};
use crate::scene::{ObjectId, ObjectKind, Scene, SceneObject, Shape};

use super::Editor;

const MARKER_FILL: Color32 = Color32::from_black_alpha(77);
const MARKER_STROKE: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);
const MARKER_STROKE_WIDTH: f32 = 2.0;

/// A pending crop: the marker rectangle and the image it will cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropSession {
    pub marker: ObjectId,
    pub target: ObjectId,
}

/// Region of an image's source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps `marker` onto the source pixels of an image whose scene bounding box
/// is `image`.
///
/// The marker's offset and size are taken as fractions of the image box and
/// scaled to the natural size, each value rounded to a whole pixel. The
/// result is clipped to the image; `None` when nothing of it remains.
pub fn source_rect(image: Rect, marker: Rect, natural_size: [u32; 2]) -> Option<CropRegion> {
    if image.width() <= 0.0 || image.height() <= 0.0 {
        return None;
    }
    let [natural_width, natural_height] = natural_size;

    let to_pixels = |value: f32, extent: f32, natural: u32| -> i64 {
        ((value / extent) * natural as f32).round() as i64
    };
    let x = to_pixels(marker.left() - image.left(), image.width(), natural_width);
    let y = to_pixels(marker.top() - image.top(), image.height(), natural_height);
    let width = to_pixels(marker.width(), image.width(), natural_width);
    let height = to_pixels(marker.height(), image.height(), natural_height);

    let clip = |start: i64, len: i64, natural: u32| -> (u32, u32) {
        let limit = natural as i64;
        let from = start.clamp(0, limit);
        let to = (start + len).clamp(0, limit);
        (from as u32, (to - from).max(0) as u32)
    };
    let (x, width) = clip(x, width, natural_width);
    let (y, height) = clip(y, height, natural_height);

    (width > 0 && height > 0).then_some(CropRegion { x, y, width, height })
}

impl<S: Scene> Editor<S> {
    /// Starts cropping the active image. Any previous marker is replaced.
    ///
    /// Returns the marker, or `None` when the active object is not an image.
    pub fn enter_crop(&mut self) -> Option<ObjectId> {
        let scene = self.scene.as_mut()?;
        let target = scene.active_object()?;
        if scene.object(target)?.kind() != ObjectKind::Image {
            return None;
        }
        let bounds = scene.bounding_rect(target)?;

        if let Some(previous) = self.crop.take() {
            scene.remove_object(previous.marker);
        }
        scene.discard_active_selection();
        scene.render();

        let inset = self.config.crop_inset;
        let marker = SceneObject::new(Shape::Rect {
            width: bounds.width() * (1.0 - 2.0 * inset),
            height: bounds.height() * (1.0 - 2.0 * inset),
        })
        .at(
            bounds.left() + bounds.width() * inset,
            bounds.top() + bounds.height() * inset,
        )
        .with_fill(MARKER_FILL)
        .with_stroke(MARKER_STROKE, MARKER_STROKE_WIDTH);

        let marker = scene.add_object(marker);
        scene.set_active_object(marker);
        scene.render();
        self.crop = Some(CropSession { marker, target });
        log::info!("Crop started on image {}", target);
        Some(marker)
    }

    /// Whether the active selection is the crop marker
    pub fn is_cropping(&self) -> bool {
        match (self.crop, self.scene.as_ref()) {
            (Some(session), Some(scene)) => scene.active_object() == Some(session.marker),
            _ => false,
        }
    }

    pub fn crop_session(&self) -> Option<CropSession> {
        self.crop
    }

    /// Replaces the target image with the region under the marker.
    ///
    /// Requires the marker to be the active selection. The cropped image is
    /// fully built before anything in the scene changes, so a failure leaves
    /// the marker and the image in place.
    pub fn commit_crop(&mut self) -> EditorResult<Option<ObjectId>> {
        let Some(session) = self.crop else {
            return Ok(None);
        };
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };
        if scene.active_object() != Some(session.marker) {
            return Ok(None);
        }

        let bounds = scene
            .bounding_rect(session.marker)
            .zip(scene.bounding_rect(session.target));
        let source = scene
            .object(session.target)
            .and_then(SceneObject::image_source)
            .cloned();
        let (Some((marker_bounds, image_bounds)), Some(source)) = (bounds, source) else {
            log::warn!("Crop target {} is gone, ending crop", session.target);
            self.crop = None;
            return Ok(None);
        };

        let region = source_rect(image_bounds, marker_bounds, source.natural_size())
            .ok_or(EditorError::EmptyRegion)?;
        let cropped = cut(source, region).inspect_err(|err| {
            log::error!("Failed to crop image {}: {}", session.target, err);
        })?;

        scene.remove_object(session.marker);
        scene.remove_object(session.target);
        let image = SceneObject::new(Shape::Image { source: cropped })
            .at(marker_bounds.left(), marker_bounds.top());
        let id = scene.add_object(image);
        scene.set_active_object(id);
        scene.render();
        self.crop = None;
        log::info!(
            "Cropped image {} to {}x{} at ({}, {})",
            session.target,
            region.width,
            region.height,
            region.x,
            region.y
        );

        self.save_snapshot()?;
        Ok(Some(id))
    }

    /// Drops the marker, leaving the image as it was. Nothing is saved.
    pub fn cancel_crop(&mut self) {
        let Some(session) = self.crop.take() else {
            return;
        };
        if let Some(scene) = self.scene.as_mut() {
            if scene.remove_object(session.marker).is_some() {
                scene.render();
            }
        }
    }
}

fn cut(mut source: ImageSource, region: CropRegion) -> EditorResult<ImageSource> {
    source.ensure_decoded()?;
    let pixels = source
        .pixels()
        .ok_or_else(|| EditorError::InvalidDataUri("image has no pixel data".to_owned()))?;
    let cropped =
        imageops::crop_imm(&**pixels, region.x, region.y, region.width, region.height)
            .to_image();
    ImageSource::from_pixels(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::scene::MemoryScene;
    use crate::tools::ToolKind;
    use egui::{pos2, vec2};
    use futures::executor::block_on;
    use image::{Rgba, RgbaImage};

    fn rect(left: f32, top: f32, width: f32, height: f32) -> Rect {
        Rect::from_min_size(pos2(left, top), vec2(width, height))
    }

    /// Image whose red channel encodes x / 4 and green channel y / 4
    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x / 4) as u8, (y / 4) as u8, 0, 255]))
    }

    fn editor_with_image(pixels: RgbaImage, scale: f32) -> (Editor<MemoryScene>, ObjectId) {
        let mut editor = Editor::new(EditorConfig::default());
        editor.init(MemoryScene::new(800.0, 600.0)).unwrap();
        editor.set_tool(ToolKind::Select);
        let source = ImageSource::from_pixels(pixels).unwrap();
        let scene = editor.scene_mut().unwrap();
        let id = scene.add_object(SceneObject::new(Shape::Image { source }).with_scale(scale));
        scene.set_active_object(id);
        (editor, id)
    }

    #[test]
    fn test_marker_fractions_scale_to_natural_pixels() {
        let region = source_rect(rect(0.0, 0.0, 200.0, 100.0), rect(20.0, 10.0, 160.0, 80.0), [1000, 500]);
        assert_eq!(
            region,
            Some(CropRegion { x: 100, y: 50, width: 800, height: 400 })
        );
    }

    #[test]
    fn test_region_is_clipped_to_image() {
        let region = source_rect(rect(0.0, 0.0, 100.0, 100.0), rect(-10.0, 50.0, 40.0, 80.0), [100, 100]);
        assert_eq!(region, Some(CropRegion { x: 0, y: 50, width: 30, height: 50 }));

        assert_eq!(
            source_rect(rect(0.0, 0.0, 100.0, 100.0), rect(150.0, 0.0, 10.0, 10.0), [100, 100]),
            None
        );
        assert_eq!(
            source_rect(rect(0.0, 0.0, 0.0, 100.0), rect(0.0, 0.0, 10.0, 10.0), [100, 100]),
            None
        );
    }

    #[test]
    fn test_enter_crop_insets_marker() {
        let (mut editor, image) = editor_with_image(gradient(200, 100), 1.0);
        let marker = editor.enter_crop().unwrap();

        let scene = editor.scene().unwrap();
        let bounds = scene.bounding_rect(marker).unwrap();
        assert!((bounds.left() - 20.0).abs() < 1e-4);
        assert!((bounds.top() - 10.0).abs() < 1e-4);
        assert!((bounds.width() - 160.0).abs() < 1e-4);
        assert!((bounds.height() - 80.0).abs() < 1e-4);
        assert_eq!(scene.active_object(), Some(marker));
        assert!(editor.is_cropping());
        assert_eq!(editor.crop_session(), Some(CropSession { marker, target: image }));
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_enter_crop_twice_keeps_one_marker() {
        let (mut editor, image) = editor_with_image(gradient(40, 40), 1.0);
        editor.enter_crop().unwrap();
        editor.scene_mut().unwrap().set_active_object(image);
        editor.enter_crop().unwrap();
        assert_eq!(editor.scene().unwrap().objects().len(), 2);
    }

    #[test]
    fn test_enter_crop_needs_an_image() {
        let (mut editor, _) = editor_with_image(gradient(40, 40), 1.0);
        let scene = editor.scene_mut().unwrap();
        let square = scene.add_object(SceneObject::new(Shape::Rect { width: 5.0, height: 5.0 }));
        scene.set_active_object(square);
        assert_eq!(editor.enter_crop(), None);

        editor.scene_mut().unwrap().discard_active_selection();
        assert_eq!(editor.enter_crop(), None);
        assert!(!editor.is_cropping());
    }

    #[test]
    fn test_commit_replaces_image_with_cut() {
        let (mut editor, image) = editor_with_image(gradient(400, 200), 0.5);
        let marker = editor.enter_crop().unwrap();
        let cropped = editor.commit_crop().unwrap().unwrap();

        let scene = editor.scene().unwrap();
        assert!(!scene.contains(image));
        assert!(!scene.contains(marker));
        assert_eq!(scene.active_object(), Some(cropped));

        let object = scene.object(cropped).unwrap();
        assert_eq!((object.left, object.top), (20.0, 10.0));
        let source = object.image_source().unwrap();
        assert_eq!(source.natural_size(), [320, 160]);
        // First pixel of the cut is source pixel (40, 20)
        assert_eq!(source.pixels().unwrap().get_pixel(0, 0), &Rgba([10, 5, 0, 255]));

        assert_eq!(editor.crop_session(), None);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_commit_requires_marker_selected() {
        let (mut editor, image) = editor_with_image(gradient(40, 40), 1.0);
        editor.enter_crop().unwrap();
        editor.scene_mut().unwrap().set_active_object(image);

        assert_eq!(editor.commit_crop().unwrap(), None);
        assert_eq!(editor.scene().unwrap().objects().len(), 2);
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_commit_with_empty_region_changes_nothing() {
        let (mut editor, _) = editor_with_image(gradient(40, 40), 1.0);
        let marker = editor.enter_crop().unwrap();
        editor.scene_mut().unwrap().object_mut(marker).unwrap().left = 500.0;

        assert!(matches!(editor.commit_crop(), Err(EditorError::EmptyRegion)));
        assert_eq!(editor.scene().unwrap().objects().len(), 2);
        assert!(editor.is_cropping());
    }

    #[test]
    fn test_cancel_removes_marker_without_saving() {
        let (mut editor, image) = editor_with_image(gradient(40, 40), 1.0);
        editor.enter_crop().unwrap();
        editor.cancel_crop();

        let scene = editor.scene().unwrap();
        assert_eq!(scene.objects().len(), 1);
        assert!(scene.contains(image));
        assert!(!editor.is_cropping());
        assert_eq!(editor.history().len(), 1);
        editor.cancel_crop();
    }

    #[test]
    fn test_undo_ends_stale_session() {
        let (mut editor, _) = editor_with_image(gradient(40, 40), 1.0);
        editor.save_snapshot().unwrap();
        editor.enter_crop().unwrap();

        block_on(editor.undo()).unwrap();
        assert_eq!(editor.crop_session(), None);
    }
}
