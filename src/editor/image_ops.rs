use egui::Color32;

use crate::codec::{self, ExportedFile, ImageInput, RasterFormat};
use crate::error::EditorResult;
use crate::scene::{ExportOptions, ObjectId, Scene, SceneObject, Shape};

use super::Editor;

impl<S: Scene> Editor<S> {
    /// Decodes an image and places it centered on the canvas, scaled so that
    /// it covers the configured share of the canvas on its constrained axis.
    pub async fn import_image(&mut self, input: ImageInput) -> EditorResult<Option<ObjectId>> {
        if self.scene.is_none() {
            return Ok(None);
        }
        let source = codec::load_image(input)
            .await
            .inspect_err(|err| log::error!("Image import failed: {}", err))?;
        // The scene may have been disposed while decoding
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };

        let canvas = scene.dimensions();
        let [width, height] = source.natural_size().map(|side| side as f32);
        let fraction = self.config.import_fraction;
        let scale = (canvas.x * fraction / width).min(canvas.y * fraction / height);

        let image = SceneObject::new(Shape::Image { source })
            .with_scale(scale)
            .at(
                (canvas.x - width * scale) / 2.0,
                (canvas.y - height * scale) / 2.0,
            );
        let id = scene.add_object(image);
        scene.set_active_object(id);
        scene.render();
        log::info!("Imported {}x{} image at scale {:.3}", width, height, scale);

        self.save_snapshot()?;
        Ok(Some(id))
    }

    /// Rasterizes the whole canvas at the configured density
    pub fn export_canvas(&self, format: RasterFormat) -> EditorResult<Option<ExportedFile>> {
        let Some(scene) = self.scene.as_ref() else {
            return Ok(None);
        };
        let bytes = scene.export_raster(&ExportOptions {
            format,
            multiplier: self.config.export_multiplier,
        })?;
        let file = ExportedFile::new("drawing", format, bytes);
        log::info!("Exported canvas as {}", file.file_name);
        Ok(Some(file))
    }

    /// Rasterizes only the active object, cropped to its bounding box.
    ///
    /// A clone is rendered on a detached surface, so the live scene and its
    /// selection are left alone. JPEG exports get a white background.
    pub async fn export_object(&self, format: RasterFormat) -> EditorResult<Option<ExportedFile>> {
        let Some(scene) = self.scene.as_ref() else {
            return Ok(None);
        };
        let Some(id) = scene.active_object() else {
            return Ok(None);
        };
        let Some(bounds) = scene.bounding_rect(id) else {
            return Ok(None);
        };
        let kind = self.active_object_type().unwrap_or("object");
        let Some(mut copy) = scene.clone_object(id).await else {
            return Ok(None);
        };

        let multiplier = self.config.export_multiplier;
        let background = match format {
            RasterFormat::Jpeg => Color32::WHITE,
            RasterFormat::Png => Color32::TRANSPARENT,
        };
        let mut surface = scene.create_surface(
            (bounds.width() * multiplier).round() as u32,
            (bounds.height() * multiplier).round() as u32,
            background,
        )?;

        copy.left = (copy.left - bounds.left()) * multiplier;
        copy.top = (copy.top - bounds.top()) * multiplier;
        copy.scale_x *= multiplier;
        copy.scale_y *= multiplier;
        copy.set_interactive(false);
        surface.add_object(copy);
        surface.render();

        let bytes = surface.export_raster(&ExportOptions { format, multiplier: 1.0 });
        surface.dispose();
        let file = ExportedFile::new(kind, format, bytes?);
        log::info!("Exported {} as {}", kind, file.file_name);
        Ok(Some(file))
    }
}
