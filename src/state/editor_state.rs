//! Shared mutable editor state: the active tool, the brush and canvas readiness.
//!
//! Tool switching is the only way to change the active tool, and it always
//! runs the outgoing tool's `deactivate` before the incoming tool's
//! `activate`, so gesture state never survives a switch.

use crate::config::EditorConfig;
use crate::scene::{InteractionMode, Scene};
use crate::state::brush::{BrushSettings, BrushUpdate};
use crate::tools::{Tool, ToolContext, ToolKind, ToolType, new_tool};

#[derive(Debug, Clone)]
pub struct EditorState {
    tool: ToolType,
    brush: BrushSettings,
    ready: bool,
}

impl EditorState {
    pub fn new(brush: BrushSettings, initial_tool: ToolKind) -> Self {
        Self {
            tool: new_tool(initial_tool),
            brush,
            ready: false,
        }
    }

    pub fn active_tool(&self) -> &ToolType {
        &self.tool
    }

    pub fn active_tool_mut(&mut self) -> &mut ToolType {
        &mut self.tool
    }

    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }

    /// Switches tools, tearing down the current tool's gesture first.
    ///
    /// Re-selecting the active tool is a full restart: a text tool re-arms,
    /// a half-dragged shape is discarded.
    pub fn set_active_tool<S: Scene>(&mut self, kind: ToolKind, scene: &mut S, config: &EditorConfig) {
        log::info!("Switching tool: {} -> {}", self.tool.name(), kind.name());

        self.tool.deactivate(scene);
        scene.set_interaction(InteractionMode::Passive);
        scene.set_all_interactive(false);

        self.tool = new_tool(kind);
        let mut cx = ToolContext { scene, brush: &self.brush, config };
        self.tool.activate(&mut cx);
    }

    /// Applies a partial brush change and lets the active tool pick it up
    pub fn update_brush<S: Scene>(&mut self, update: BrushUpdate, scene: &mut S, config: &EditorConfig) {
        self.brush.apply(update);
        let mut cx = ToolContext { scene, brush: &self.brush, config };
        self.tool.brush_changed(&mut cx);
    }

    /// Replaces the brush without touching any scene
    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.brush = brush;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Marks the canvas as initialized. Returns `false` if it already was.
    pub fn mark_ready(&mut self) -> bool {
        !std::mem::replace(&mut self.ready, true)
    }

    /// Drops readiness and resets the tool to an unattached instance
    pub fn reset(&mut self) {
        self.tool = new_tool(self.tool.kind());
        self.ready = false;
    }
}
