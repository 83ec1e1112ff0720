//! The editor facade.
//!
//! [`Editor`] owns the scene, the snapshot history, the tool state and the
//! crop session, and is the single entry point hosts talk to. Every
//! operation that commits a change to the scene ends with exactly one
//! history save; operations whose preconditions are not met (no scene, no
//! selection, no crop session) return without effect.
//!
//! Async operations borrow the editor mutably for their whole duration, so
//! no two of them can interleave. Dropping the returned future abandons the
//! operation before it mutates anything.

use egui::Color32;

use crate::config::EditorConfig;
use crate::error::EditorResult;
use crate::history::SnapshotHistory;
use crate::input::InputEvent;
use crate::scene::{ObjectId, Scene, SceneObject, Shape};
use crate::state::{BrushSettings, BrushUpdate, EditorState};
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutcome, ToolPhase};

mod crop;
mod image_ops;
mod transform;

pub use crop::{CropRegion, CropSession, source_rect};
pub use transform::FlipAxis;

pub struct Editor<S: Scene> {
    scene: Option<S>,
    history: SnapshotHistory,
    state: EditorState,
    crop: Option<CropSession>,
    config: EditorConfig,
}

impl<S: Scene> Default for Editor<S> {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl<S: Scene> Editor<S> {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            scene: None,
            history: SnapshotHistory::new(config.history_limit),
            state: EditorState::new(config.brush, config.initial_tool),
            crop: None,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Attaches the scene, applies the configured background and initial
    /// tool and records the initial snapshot.
    ///
    /// Only the first call has an effect; later calls drop their scene.
    pub fn init(&mut self, mut scene: S) -> EditorResult<()> {
        if !self.state.mark_ready() {
            log::warn!("Editor is already initialized, ignoring init");
            return Ok(());
        }

        scene.set_background(self.config.background);
        self.state
            .set_active_tool(self.config.initial_tool, &mut scene, &self.config);
        scene.render();
        self.scene = Some(scene);
        self.history.clear();
        self.crop = None;

        log::info!("Editor initialized");
        self.save_snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready() && self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&S> {
        self.scene.as_ref()
    }

    /// Direct scene access for hosts, e.g. to update the viewport.
    /// Changes made here are not recorded until [`Self::notify_object_modified`].
    pub fn scene_mut(&mut self) -> Option<&mut S> {
        self.scene.as_mut()
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.scene.is_some() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.scene.is_some() && self.history.can_redo()
    }

    pub fn active_tool(&self) -> ToolKind {
        self.state.active_tool().kind()
    }

    pub fn tool_phase(&self) -> ToolPhase {
        self.state.active_tool().phase()
    }

    pub fn brush(&self) -> &BrushSettings {
        self.state.brush()
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        self.state.set_active_tool(kind, scene, &self.config);
        scene.render();
    }

    pub fn update_brush(&mut self, update: BrushUpdate) {
        match self.scene.as_mut() {
            Some(scene) => self.state.update_brush(update, scene, &self.config),
            None => {
                let mut brush = *self.state.brush();
                brush.apply(update);
                self.state.set_brush(brush);
            }
        }
    }

    /// Routes one pointer event to the active tool. A finished gesture is
    /// saved to the history once.
    pub fn handle_input(&mut self, event: &InputEvent) -> EditorResult<Option<ToolOutcome>> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };

        let brush = *self.state.brush();
        let mut cx = ToolContext {
            scene,
            brush: &brush,
            config: &self.config,
        };
        let outcome = self.state.active_tool_mut().on_input(event, &mut cx);

        if let Some(outcome) = outcome {
            match outcome {
                ToolOutcome::Committed(id) => log::debug!("Gesture committed {}", id),
                ToolOutcome::Modified(id) => log::debug!("Gesture modified {}", id),
            }
            self.save_snapshot()?;
        }
        Ok(outcome)
    }

    /// Records a change the host made to the scene outside of pointer routing
    pub fn notify_object_modified(&mut self) -> EditorResult<()> {
        self.save_snapshot()
    }

    /// Whether the active object is a text still open for in-place editing
    pub fn is_editing_text(&self) -> bool {
        matches!(
            self.active_object().map(|object| &object.shape),
            Some(Shape::Text { editing: true, .. })
        )
    }

    /// Closes in-place editing of the active text and records its content
    pub fn finish_text_edit(&mut self) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let Some(id) = scene.active_object() else {
            return Ok(());
        };
        let Some(Shape::Text { editing, .. }) = scene.object_mut(id).map(|object| &mut object.shape)
        else {
            return Ok(());
        };
        *editing = false;
        scene.render();
        self.save_snapshot()
    }

    /// Captures the live scene at the history cursor, dropping the redo branch
    pub fn save_snapshot(&mut self) -> EditorResult<()> {
        let Some(scene) = self.scene.as_ref() else {
            return Ok(());
        };
        let snapshot = scene.serialize()?;
        self.history.push(snapshot);
        Ok(())
    }

    pub async fn undo(&mut self) -> EditorResult<()> {
        match self.history.previous() {
            Some(index) => self.restore_history(index).await,
            None => Ok(()),
        }
    }

    pub async fn redo(&mut self) -> EditorResult<()> {
        match self.history.next() {
            Some(index) => self.restore_history(index).await,
            None => Ok(()),
        }
    }

    /// Replaces the live scene with the snapshot at `index`.
    ///
    /// The cursor only moves once the snapshot is fully restored; a failed
    /// restore leaves both the scene and the cursor untouched.
    pub async fn restore_history(&mut self, index: usize) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let Some(snapshot) = self.history.get(index) else {
            return Ok(());
        };

        if let Err(err) = scene.restore(snapshot).await {
            log::error!("Failed to restore history entry {}: {}", index, err);
            return Err(err);
        }
        self.history.set_cursor(index);
        log::debug!("History restored to {}", index);

        if self.state.active_tool().kind() == ToolKind::Select {
            scene.set_all_interactive(true);
        }
        if let Some(session) = self.crop {
            if !scene.contains(session.marker) || !scene.contains(session.target) {
                log::warn!("Crop marker {} is gone after restore, ending crop", session.marker);
                self.crop = None;
            }
        }
        scene.render();
        Ok(())
    }

    /// Removes every object and records the empty canvas
    pub fn clear_canvas(&mut self) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        scene.clear();
        scene.render();
        self.crop = None;
        log::info!("Canvas cleared");
        self.save_snapshot()
    }

    pub fn resize_canvas(&mut self, width: f32, height: f32) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        scene.set_dimensions(width, height);
        scene.render();
    }

    pub fn set_canvas_background(&mut self, color: Color32) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        scene.set_background(color);
        // The eraser paints with the background
        self.state
            .update_brush(BrushUpdate::default(), scene, &self.config);
        scene.render();
    }

    /// Tears the scene down. The editor can be initialized again afterwards.
    pub fn dispose(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            self.state.active_tool_mut().deactivate(&mut scene);
            scene.dispose();
            log::info!("Editor disposed");
        }
        self.state.reset();
        self.history.clear();
        self.crop = None;
    }

    /// The single active object, if exactly one is selected
    pub fn active_object(&self) -> Option<&SceneObject> {
        let scene = self.scene.as_ref()?;
        scene.active_object().and_then(|id| scene.object(id))
    }

    pub fn active_object_id(&self) -> Option<ObjectId> {
        self.scene.as_ref()?.active_object()
    }

    /// Label of the active selection: `image`, `rectangle`, `circle`, `line`,
    /// `text`, `path`, or `group` for several objects
    pub fn active_object_type(&self) -> Option<&'static str> {
        let scene = self.scene.as_ref()?;
        if scene.active_objects().len() > 1 {
            return Some(crate::scene::ObjectKind::Group.label());
        }
        self.active_object().map(|object| object.kind().label())
    }
}
