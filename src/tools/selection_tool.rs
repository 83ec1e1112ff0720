use egui::Pos2;

use crate::input::InputEvent;
use crate::scene::{InteractionMode, Scene};
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutcome, ToolPhase, scene_gesture};

/// Select tool: every object becomes selectable and the scene's native
/// selection handles clicking and dragging.
#[derive(Debug, Clone, Default)]
pub struct SelectionTool;

impl SelectionTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        "Select"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn phase(&self) -> ToolPhase {
        ToolPhase::Select
    }

    fn activate<S: Scene>(&mut self, cx: &mut ToolContext<'_, S>) {
        cx.scene.set_all_interactive(true);
        cx.scene.set_interaction(InteractionMode::Select);
    }

    fn deactivate<S: Scene>(&mut self, _scene: &mut S) {}

    fn on_pointer_down<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        scene_gesture(cx, &InputEvent::PointerDown { position: screen })
    }

    fn on_pointer_move<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        scene_gesture(cx, &InputEvent::PointerMove { position: screen })
    }

    fn on_pointer_up<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        scene_gesture(cx, &InputEvent::PointerUp { position: screen })
    }
}
