use egui::Pos2;

use crate::input::InputEvent;
use crate::scene::{InteractionMode, Scene};
use crate::stroke::FreehandBrush;
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutcome, ToolPhase, scene_gesture};

/// Freehand pencil and eraser.
///
/// Stroke capture is delegated to the scene's brush; the tool only configures
/// that brush and turns the finished stroke into a commit. The eraser paints
/// with the canvas background color at a multiple of the brush width, which
/// masks rather than removes what lies below.
#[derive(Debug, Clone)]
pub struct DrawStrokeTool {
    eraser: bool,
}

impl DrawStrokeTool {
    pub fn pencil() -> Self {
        Self { eraser: false }
    }

    pub fn eraser() -> Self {
        Self { eraser: true }
    }

    pub fn is_eraser(&self) -> bool {
        self.eraser
    }

    fn scene_brush<S: Scene>(&self, cx: &ToolContext<'_, S>) -> FreehandBrush {
        if self.eraser {
            FreehandBrush {
                color: cx.scene.background(),
                width: cx.brush.width * cx.config.eraser_width_factor,
                opacity: 1.0,
            }
        } else {
            FreehandBrush {
                color: cx.brush.color,
                width: cx.brush.width,
                opacity: cx.brush.opacity,
            }
        }
    }
}

impl Tool for DrawStrokeTool {
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn kind(&self) -> ToolKind {
        if self.eraser { ToolKind::Eraser } else { ToolKind::Pencil }
    }

    fn phase(&self) -> ToolPhase {
        ToolPhase::DrawingFreehand
    }

    fn activate<S: Scene>(&mut self, cx: &mut ToolContext<'_, S>) {
        let brush = self.scene_brush(cx);
        cx.scene.set_interaction(InteractionMode::Draw(brush));
    }

    fn deactivate<S: Scene>(&mut self, scene: &mut S) {
        // Drops a stroke still being captured
        scene.set_interaction(InteractionMode::Passive);
    }

    fn brush_changed<S: Scene>(&mut self, cx: &mut ToolContext<'_, S>) {
        let brush = self.scene_brush(cx);
        cx.scene.set_interaction(InteractionMode::Draw(brush));
    }

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
