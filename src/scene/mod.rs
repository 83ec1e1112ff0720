//! The scene service the editor drives.
//!
//! A [`Scene`] owns the live object graph, paints it, answers geometry queries
//! and captures the gestures it handles natively (selection dragging and the
//! freehand brush). The editor never paints pixels itself; it issues commands
//! through this trait and reads geometry back.

use egui::{Color32, Pos2, Rect, Vec2};

use crate::codec::RasterFormat;
use crate::error::EditorResult;
use crate::input::InputEvent;
use crate::stroke::FreehandBrush;

mod glyphs;
pub mod memory;
mod object;
pub mod raster;

pub use memory::MemoryScene;
pub use object::{ObjectId, ObjectKind, SceneObject, Shape};

/// Serialized capture of a whole scene at one instant.
///
/// Snapshots are plain values: two snapshots compare equal when their
/// serialized content is equal, independent of any live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSnapshot(String);

impl SceneSnapshot {
    pub fn new(serialized: String) -> Self {
        Self(serialized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How the scene reacts to pointer input it receives through
/// [`Scene::dispatch_pointer`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    /// Pointer input is ignored
    #[default]
    Passive,
    /// Click to select, drag to move
    Select,
    /// Pointer gestures paint freehand strokes with the given brush
    Draw(FreehandBrush),
}

/// Notifications the scene raises from natively handled gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// A freehand stroke was completed and added as a path object
    PathCreated(ObjectId),
    /// An object was moved or reshaped by direct manipulation
    ObjectModified(ObjectId),
}

/// Options for rasterizing a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub format: RasterFormat,
    /// Pixel density relative to scene units
    pub multiplier: f32,
}

/// The scene service consumed by the editor.
///
/// Objects are ordered bottom to top. The async methods mark the points where
/// an implementation may suspend (cloning and snapshot restore).
#[allow(async_fn_in_trait)]
pub trait Scene {
    fn add_object(&mut self, object: SceneObject) -> ObjectId;

    fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject>;

    fn objects(&self) -> &[SceneObject];

    fn object(&self, id: ObjectId) -> Option<&SceneObject>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject>;

    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    /// Sets the interactivity flags of every object at once
    fn set_all_interactive(&mut self, interactive: bool);

    /// The single active object, `None` when nothing or several objects are selected
    fn active_object(&self) -> Option<ObjectId>;

    fn active_objects(&self) -> Vec<ObjectId>;

    fn set_active_object(&mut self, id: ObjectId);

    fn discard_active_selection(&mut self);

    /// Copy of an object under a fresh identity. The copy is not added.
    async fn clone_object(&self, id: ObjectId) -> Option<SceneObject>;

    fn bounding_rect(&self, id: ObjectId) -> Option<Rect>;

    fn pointer_to_scene(&self, screen: Pos2) -> Pos2;

    fn serialize(&self) -> EditorResult<SceneSnapshot>;

    /// Replaces the whole scene with the snapshot's content. On error the
    /// scene is left exactly as it was.
    async fn restore(&mut self, snapshot: &SceneSnapshot) -> EditorResult<()>;

    fn render(&mut self);

    /// Rasterizes the visible scene and encodes it
    fn export_raster(&self, options: &ExportOptions) -> EditorResult<Vec<u8>>;

    /// Moves an object `delta` steps up (positive) or down the stacking order
    fn shift_z_order(&mut self, id: ObjectId, delta: isize);

    fn dimensions(&self) -> Vec2;

    fn set_dimensions(&mut self, width: f32, height: f32);

    fn background(&self) -> Color32;

    fn set_background(&mut self, color: Color32);

    /// Removes every object
    fn clear(&mut self);

    fn set_interaction(&mut self, mode: InteractionMode);

    fn dispatch_pointer(&mut self, event: &InputEvent) -> Option<SceneEvent>;

    /// A detached, off-screen scene of the given pixel size
    fn create_surface(&self, width: u32, height: u32, background: Color32) -> EditorResult<Self>
    where
        Self: Sized;

    fn dispose(&mut self);
}
