use std::collections::HashMap;

use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::codec::ImageSource;

/// Errors that can occur during texture generation
#[derive(Error, Debug)]
pub enum TextureGenerationError {
    #[error("Image {0} has no decoded pixels")]
    MissingPixels(Uuid),
    #[error("Invalid texture dimensions")]
    InvalidDimensions,
}

/// Caches one texture per image source, keyed by the source's content key.
///
/// Textures that have not been used for a while are evicted once the cache
/// grows past its limit.
pub struct TextureManager {
    texture_cache: HashMap<Uuid, TextureHandle>,
    /// Frame in which each texture was last used
    last_used: HashMap<Uuid, u64>,
    current_frame: u64,
    max_cache_size: usize,
}

impl TextureManager {
    pub fn new(max_cache_size: usize) -> Self {
        Self {
            texture_cache: HashMap::new(),
            last_used: HashMap::new(),
            current_frame: 0,
            max_cache_size,
        }
    }

    /// Increments the frame counter, should be called at the start of each frame
    pub fn begin_frame(&mut self) {
        self.current_frame += 1;
    }

    /// Gets or creates the texture for `key`
    pub fn get_or_create_texture<F>(
        &mut self,
        key: Uuid,
        generator: F,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError>
    where
        F: FnOnce() -> Result<ColorImage, TextureGenerationError>,
    {
        if let Some(handle) = self.texture_cache.get(&key) {
            self.last_used.insert(key, self.current_frame);
            return Ok(handle.id());
        }

        self.prune_cache_if_needed();

        let image = generator()?;
        let handle = ctx.load_texture(format!("image_{}", key), image, TextureOptions::LINEAR);
        let id = handle.id();
        self.texture_cache.insert(key, handle);
        self.last_used.insert(key, self.current_frame);
        Ok(id)
    }

    /// Texture for an image object's pixels
    pub fn texture_for(
        &mut self,
        source: &ImageSource,
        ctx: &Context,
    ) -> Result<TextureId, TextureGenerationError> {
        self.get_or_create_texture(source.key(), || color_image(source), ctx)
    }

    fn prune_cache_if_needed(&mut self) {
        if self.texture_cache.len() < self.max_cache_size {
            return;
        }

        let mut entries: Vec<(Uuid, u64)> = self.last_used.iter().map(|(k, v)| (*k, *v)).collect();
        // Oldest first
        entries.sort_by_key(|(_, frame)| *frame);

        let to_remove = entries.len() + 1 - self.max_cache_size.max(1);
        for (key, _) in entries.iter().take(to_remove) {
            self.texture_cache.remove(key);
            self.last_used.remove(key);
        }
    }

    pub fn clear_cache(&mut self) {
        self.texture_cache.clear();
        self.last_used.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.texture_cache.len()
    }

    #[cfg(test)]
    fn get_texture(&self, key: Uuid) -> Option<&TextureHandle> {
        self.texture_cache.get(&key)
    }
}

fn color_image(source: &ImageSource) -> Result<ColorImage, TextureGenerationError> {
    let pixels = source
        .pixels()
        .ok_or(TextureGenerationError::MissingPixels(source.key()))?;
    let size = [pixels.width() as usize, pixels.height() as usize];
    if size[0] == 0 || size[1] == 0 {
        return Err(TextureGenerationError::InvalidDimensions);
    }
    Ok(ColorImage::from_rgba_unmultiplied(size, pixels.as_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn mock_texture_generator() -> Result<ColorImage, TextureGenerationError> {
        Ok(ColorImage::new([10, 10], egui::Color32::WHITE))
    }

    #[test]
    fn test_cache_hit() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(10);
        let key = Uuid::new_v4();

        let first = manager.get_or_create_texture(key, mock_texture_generator, &ctx).unwrap();
        let second = manager
            .get_or_create_texture(key, || panic!("cached texture regenerated"), &ctx)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.cache_size(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(2);
        let keys = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        manager.get_or_create_texture(keys[0], mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(keys[1], mock_texture_generator, &ctx).unwrap();
        manager.begin_frame();
        manager.get_or_create_texture(keys[2], mock_texture_generator, &ctx).unwrap();

        assert_eq!(manager.cache_size(), 2);
        assert!(manager.get_texture(keys[0]).is_none());
        assert!(manager.get_texture(keys[1]).is_some());
        assert!(manager.get_texture(keys[2]).is_some());
    }

    #[test]
    fn test_texture_from_image_source() {
        let ctx = Context::default();
        let mut manager = TextureManager::new(4);
        let source = ImageSource::from_pixels(RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))).unwrap();

        manager.texture_for(&source, &ctx).unwrap();
        assert!(manager.get_texture(source.key()).is_some());

        manager.clear_cache();
        assert_eq!(manager.cache_size(), 0);
    }
}
