use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::state::BrushSettings;
use crate::tools::ToolKind;

/// Editor configuration.
///
/// Every field has a default, so a JSON document only needs to name what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Brush the editor starts with
    pub brush: BrushSettings,
    /// Tool activated by `init`
    pub initial_tool: ToolKind,
    /// Canvas background applied by `init`
    pub background: Color32,
    /// Maximum number of snapshots kept in the history
    pub history_limit: usize,
    /// Offset of a duplicate from its original, in scene units
    pub duplicate_offset: f32,
    /// Share of the canvas an imported image may occupy on its constrained axis
    pub import_fraction: f32,
    /// Inset of a new crop marker on each side, as a share of the image bounds
    pub crop_inset: f32,
    /// Pixel density of canvas and object exports
    pub export_multiplier: f32,
    /// Eraser stroke width relative to the brush width
    pub eraser_width_factor: f32,
    pub text_content: String,
    pub text_font_size: f32,
    pub text_font_family: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            brush: BrushSettings::default(),
            initial_tool: ToolKind::Pencil,
            background: Color32::WHITE,
            history_limit: 100,
            duplicate_offset: 20.0,
            import_fraction: 0.2,
            crop_inset: 0.1,
            export_multiplier: 2.0,
            eraser_width_factor: 3.0,
            text_content: "Type here".to_owned(),
            text_font_size: 20.0,
            text_font_family: "sans-serif".to_owned(),
        }
    }
}

impl EditorConfig {
    /// Loads a configuration from JSON, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
