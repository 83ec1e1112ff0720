mod brush;
mod editor_state;

pub use brush::{BrushSettings, BrushUpdate};
pub use editor_state::EditorState;
