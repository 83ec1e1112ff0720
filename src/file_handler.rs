use eframe::egui;

use crate::codec::ImageInput;

/// Turns files dropped on the window into image imports
#[derive(Debug, Default)]
pub struct FileHandler;

impl FileHandler {
    pub fn new() -> Self {
        Self
    }

    /// Image inputs for the files dropped this frame
    pub fn take_dropped_images(&mut self, ctx: &egui::Context) -> Vec<ImageInput> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        dropped
            .iter()
            .filter_map(|file| {
                let file_name = display_name(file);
                if !is_image_file(file) {
                    log::warn!("Dropped file is not a supported type: {}", file_name);
                    return None;
                }
                read_bytes(file, &file_name).map(ImageInput::File)
            })
            .collect()
    }

    /// Overlay shown while files are dragged over the application
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, Id, LayerId, Order, TextStyle};

        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let text = ctx.input(|i| {
            let mut text = "Dropping files:\n".to_owned();
            for file in &i.raw.hovered_files {
                if let Some(path) = &file.path {
                    text += &format!("\n{}", path.display());
                } else {
                    text += "\n(Path not available)";
                }
            }
            text
        });

        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            TextStyle::Heading.resolve(&ctx.style()),
            Color32::WHITE,
        );
    }
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

/// Check if a file is an image based on MIME type or extension
fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    let extension = file
        .path
        .as_ref()
        .and_then(|path| path.extension())
        .map(|ext| ext.to_string_lossy().to_lowercase());
    matches!(
        extension.as_deref(),
        Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp")
    )
}

fn read_bytes(file: &egui::DroppedFile, file_name: &str) -> Option<Vec<u8>> {
    if let Some(bytes) = &file.bytes {
        log::info!("Importing dropped image from memory: {} ({} bytes)", file_name, bytes.len());
        return Some(bytes.to_vec());
    }

    #[cfg(not(target_arch = "wasm32"))]
    if let Some(path) = &file.path {
        log::info!("Importing dropped image from path: {}", path.display());
        return match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                log::error!("Failed to read image file: {}: {}", path.display(), err);
                None
            }
        };
    }

    log::warn!("Dropped file has no accessible data: {}", file_name);
    None
}
