//! Operations on the current selection.
//!
//! Each one needs an active object, changes it in place, renders once and
//! saves once. Without a selection they do nothing.

use crate::error::EditorResult;
use crate::scene::{ObjectId, Scene, SceneObject};

use super::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl<S: Scene> Editor<S> {
    /// Applies `change` to the active object, then renders and saves
    fn modify_active(&mut self, change: impl FnOnce(&mut SceneObject)) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let Some(id) = scene.active_object() else {
            return Ok(());
        };
        let Some(object) = scene.object_mut(id) else {
            return Ok(());
        };
        change(object);
        scene.render();
        self.save_snapshot()
    }

    /// Toggles the flip flag of the active object on one axis
    pub fn flip(&mut self, axis: FlipAxis) -> EditorResult<()> {
        self.modify_active(|object| match axis {
            FlipAxis::Horizontal => object.flip_x = !object.flip_x,
            FlipAxis::Vertical => object.flip_y = !object.flip_y,
        })
    }

    /// Rotates the active object by `degrees` relative to its current angle
    pub fn rotate(&mut self, degrees: f32) -> EditorResult<()> {
        self.modify_active(|object| object.angle += degrees)
    }

    pub fn set_opacity(&mut self, opacity: f32) -> EditorResult<()> {
        let opacity = opacity.clamp(0.0, 1.0);
        self.modify_active(|object| object.opacity = opacity)
    }

    /// Opacity of the active object, fully opaque when nothing is selected
    pub fn opacity(&self) -> f32 {
        self.active_object().map_or(1.0, |object| object.opacity)
    }

    pub fn bring_forward(&mut self) -> EditorResult<()> {
        self.shift_active(1)
    }

    pub fn send_backward(&mut self) -> EditorResult<()> {
        self.shift_active(-1)
    }

    fn shift_active(&mut self, delta: isize) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let Some(id) = scene.active_object() else {
            return Ok(());
        };
        scene.shift_z_order(id, delta);
        scene.render();
        self.save_snapshot()
    }

    /// Clones the active object at a fixed offset and selects the clone
    pub async fn duplicate(&mut self) -> EditorResult<Option<ObjectId>> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(None);
        };
        let Some(original) = scene.active_object() else {
            return Ok(None);
        };
        let Some(mut copy) = scene.clone_object(original).await else {
            return Ok(None);
        };
        if !scene.contains(original) {
            log::warn!("Object {} vanished while being cloned", original);
            return Ok(None);
        }

        let offset = self.config.duplicate_offset;
        copy.left += offset;
        copy.top += offset;
        let id = scene.add_object(copy);
        scene.set_active_object(id);
        scene.render();
        log::info!("Duplicated {} as {}", original, id);

        self.save_snapshot()?;
        Ok(Some(id))
    }

    /// Removes every selected object and clears the selection
    pub fn delete_selected(&mut self) -> EditorResult<()> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(());
        };
        let selected = scene.active_objects();
        if selected.is_empty() {
            return Ok(());
        }

        for id in &selected {
            scene.remove_object(*id);
        }
        scene.discard_active_selection();
        if let Some(session) = self.crop {
            if selected.contains(&session.marker) || selected.contains(&session.target) {
                self.crop = None;
            }
        }
        scene.render();
        log::info!("Deleted {} object(s)", selected.len());
        self.save_snapshot()
    }
}
