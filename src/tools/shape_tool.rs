use egui::{Pos2, pos2};

use crate::scene::{ObjectId, Scene, SceneObject, Shape};
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutcome, ToolPhase};

/// Shapes drawn by dragging out a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Line,
}

/// The shape being dragged out by the current gesture
#[derive(Debug, Clone, Copy)]
struct ShapeGesture {
    anchor: Pos2,
    object: ObjectId,
}

/// Rectangle, ellipse and line tool.
///
/// Pointer-down adds a zero-sized shape that is neither selectable nor
/// event-receptive, pointer-move stretches it between the anchor and the
/// pointer, pointer-up commits it as is.
#[derive(Debug, Clone)]
pub struct ShapeTool {
    shape: ShapeKind,
    gesture: Option<ShapeGesture>,
}

impl ShapeTool {
    pub fn new(shape: ShapeKind) -> Self {
        Self { shape, gesture: None }
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Object being dragged out, if a gesture is in progress
    pub fn in_progress(&self) -> Option<ObjectId> {
        self.gesture.map(|gesture| gesture.object)
    }

    fn start_shape<S: Scene>(&self, anchor: Pos2, cx: &ToolContext<'_, S>) -> SceneObject {
        let shape = match self.shape {
            ShapeKind::Rectangle => Shape::Rect { width: 0.0, height: 0.0 },
            ShapeKind::Ellipse => Shape::Ellipse { rx: 0.0, ry: 0.0 },
            ShapeKind::Line => Shape::Line { from: Pos2::ZERO, to: Pos2::ZERO },
        };
        SceneObject::new(shape)
            .at(anchor.x, anchor.y)
            .with_stroke(cx.brush.color, cx.brush.width)
            .with_opacity(cx.brush.opacity)
            .with_interactive(false)
    }

    fn stretch(object: &mut SceneObject, anchor: Pos2, pointer: Pos2) {
        let left = anchor.x.min(pointer.x);
        let top = anchor.y.min(pointer.y);
        let dx = (pointer.x - anchor.x).abs();
        let dy = (pointer.y - anchor.y).abs();
        match &mut object.shape {
            Shape::Rect { width, height } => {
                *width = dx;
                *height = dy;
                object.left = left;
                object.top = top;
            }
            Shape::Ellipse { rx, ry } => {
                *rx = dx / 2.0;
                *ry = dy / 2.0;
                object.left = left;
                object.top = top;
            }
            Shape::Line { from, to } => {
                // Start stays pinned to the anchor
                *from = Pos2::ZERO;
                *to = pos2(pointer.x - anchor.x, pointer.y - anchor.y);
                object.left = anchor.x;
                object.top = anchor.y;
            }
            _ => {}
        }
    }

    fn discard_gesture<S: Scene>(&mut self, scene: &mut S) {
        if let Some(gesture) = self.gesture.take() {
            log::debug!("Discarding unfinished shape {}", gesture.object);
            scene.remove_object(gesture.object);
        }
    }
}

impl Tool for ShapeTool {
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn kind(&self) -> ToolKind {
        match self.shape {
            ShapeKind::Rectangle => ToolKind::Rectangle,
            ShapeKind::Ellipse => ToolKind::Ellipse,
            ShapeKind::Line => ToolKind::Line,
        }
    }

    fn phase(&self) -> ToolPhase {
        if self.gesture.is_some() {
            ToolPhase::DraggingShape
        } else {
            ToolPhase::Idle
        }
    }

    fn deactivate<S: Scene>(&mut self, scene: &mut S) {
        self.discard_gesture(scene);
    }

    fn on_pointer_down<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        // A press without a release (pointer lost) never leaves an orphan behind
        self.discard_gesture(cx.scene);

        let anchor = cx.scene.pointer_to_scene(screen);
        let object = self.start_shape(anchor, cx);
        let object = cx.scene.add_object(object);
        self.gesture = Some(ShapeGesture { anchor, object });
        None
    }

    fn on_pointer_move<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        let gesture = self.gesture?;
        let pointer = cx.scene.pointer_to_scene(screen);
        match cx.scene.object_mut(gesture.object) {
            Some(object) => Self::stretch(object, gesture.anchor, pointer),
            None => {
                // Removed underneath us, e.g. by an undo mid-drag
                self.gesture = None;
                return None;
            }
        }
        cx.scene.render();
        None
    }

    fn on_pointer_up<S: Scene>(
        &mut self,
        _screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        let gesture = self.gesture.take()?;
        cx.scene
            .contains(gesture.object)
            .then_some(ToolOutcome::Committed(gesture.object))
    }
}
