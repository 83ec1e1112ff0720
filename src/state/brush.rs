use egui::Color32;
use serde::{Deserialize, Serialize};

/// Brush shared by every drawing tool, read when a gesture starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: 3.0,
            opacity: 1.0,
        }
    }
}

/// Partial brush change; `None` fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrushUpdate {
    pub color: Option<Color32>,
    pub width: Option<f32>,
    pub opacity: Option<f32>,
}

impl BrushSettings {
    pub fn apply(&mut self, update: BrushUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(width) = update.width {
            self.width = width.max(0.0);
        }
        if let Some(opacity) = update.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}
