#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod codec;
pub mod components;
pub mod config;
pub mod editor;
pub mod error;
pub mod file_handler;
pub mod history;
pub mod input;
pub mod panels;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod stroke;
pub mod texture_manager;
pub mod tools;
pub mod util;

pub use app::PaintApp;
pub use codec::{ExportedFile, ImageInput, RasterFormat};
pub use config::EditorConfig;
pub use editor::{CropRegion, CropSession, Editor, FlipAxis};
pub use error::{EditorError, EditorResult};
pub use history::SnapshotHistory;
pub use input::{InputEvent, InputHandler};
pub use renderer::Renderer;
pub use scene::{MemoryScene, ObjectId, Scene, SceneObject, Shape};
pub use state::{BrushSettings, BrushUpdate, EditorState};
pub use tools::{ToolKind, ToolOutcome, ToolPhase};
