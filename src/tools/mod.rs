use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::input::InputEvent;
use crate::scene::{ObjectId, Scene, SceneEvent};
use crate::state::BrushSettings;

/// The fixed set of tools the editor offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Select,
    Pencil,
    Eraser,
    Rectangle,
    #[serde(alias = "circle")]
    Ellipse,
    Line,
    Text,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::Select,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Rectangle,
        ToolKind::Ellipse,
        ToolKind::Line,
        ToolKind::Text,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Pencil => "Pencil",
            Self::Eraser => "Eraser",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
            Self::Line => "Line",
            Self::Text => "Text",
        }
    }
}

/// Where the active tool is in its gesture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    Idle,
    Select,
    DrawingFreehand,
    DraggingShape,
    AwaitingTextPlacement,
}

/// What a finished gesture produced. Each outcome is worth one history save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOutcome {
    /// A new object was committed to the scene
    Committed(ObjectId),
    /// An existing object was changed by direct manipulation
    Modified(ObjectId),
}

/// Everything a tool may touch while handling input
pub struct ToolContext<'a, S: Scene> {
    pub scene: &'a mut S,
    pub brush: &'a BrushSettings,
    pub config: &'a EditorConfig,
}

/// Tool trait defines the interface for all drawing tools.
///
/// `activate` and `deactivate` bracket a tool's lifetime: the editor always
/// deactivates the current tool before the next one is activated, so no two
/// tools ever handle the same pointer stream.
pub trait Tool {
    /// Return the name of the tool
    fn name(&self) -> &'static str;

    fn kind(&self) -> ToolKind;

    fn phase(&self) -> ToolPhase;

    /// Called when the tool is selected (activated).
    fn activate<S: Scene>(&mut self, _cx: &mut ToolContext<'_, S>) {}

    /// Called when the tool is deselected. Must drop any ephemeral state
    /// the tool put into the scene.
    fn deactivate<S: Scene>(&mut self, scene: &mut S);

    /// Called after the shared brush changed
    fn brush_changed<S: Scene>(&mut self, _cx: &mut ToolContext<'_, S>) {}

    /// Routes an event to the pointer handlers
    fn on_input<S: Scene>(
        &mut self,
        event: &InputEvent,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        match *event {
            InputEvent::PointerDown { position } => self.on_pointer_down(position, cx),
            InputEvent::PointerMove { position } => self.on_pointer_move(position, cx),
            InputEvent::PointerUp { position } => self.on_pointer_up(position, cx),
        }
    }

    fn on_pointer_down<S: Scene>(
        &mut self,
        _screen: Pos2,
        _cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        None
    }

    fn on_pointer_move<S: Scene>(
        &mut self,
        _screen: Pos2,
        _cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        None
    }

    fn on_pointer_up<S: Scene>(
        &mut self,
        _screen: Pos2,
        _cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        None
    }
}

/// Hands a pointer event to the scene's native gesture handling and maps
/// what it reports to a tool outcome
pub(crate) fn scene_gesture<S: Scene>(
    cx: &mut ToolContext<'_, S>,
    event: &InputEvent,
) -> Option<ToolOutcome> {
    match cx.scene.dispatch_pointer(event)? {
        SceneEvent::PathCreated(id) => Some(ToolOutcome::Committed(id)),
        SceneEvent::ObjectModified(id) => Some(ToolOutcome::Modified(id)),
    }
}

// Tool implementations
mod draw_stroke_tool;
pub use draw_stroke_tool::DrawStrokeTool;

mod selection_tool;
pub use selection_tool::SelectionTool;

mod shape_tool;
pub use shape_tool::{ShapeKind, ShapeTool};

mod text_tool;
pub use text_tool::TextTool;

/// Enum representing all available tool types
#[derive(Debug, Clone)]
pub enum ToolType {
    DrawStroke(DrawStrokeTool),
    Selection(SelectionTool),
    Shape(ShapeTool),
    Text(TextTool),
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            Self::DrawStroke(tool) => tool.name(),
            Self::Selection(tool) => tool.name(),
            Self::Shape(tool) => tool.name(),
            Self::Text(tool) => tool.name(),
        }
    }

    fn kind(&self) -> ToolKind {
        match self {
            Self::DrawStroke(tool) => tool.kind(),
            Self::Selection(tool) => tool.kind(),
            Self::Shape(tool) => tool.kind(),
            Self::Text(tool) => tool.kind(),
        }
    }

    fn phase(&self) -> ToolPhase {
        match self {
            Self::DrawStroke(tool) => tool.phase(),
            Self::Selection(tool) => tool.phase(),
            Self::Shape(tool) => tool.phase(),
            Self::Text(tool) => tool.phase(),
        }
    }

    fn activate<S: Scene>(&mut self, cx: &mut ToolContext<'_, S>) {
        match self {
            Self::DrawStroke(tool) => tool.activate(cx),
            Self::Selection(tool) => tool.activate(cx),
            Self::Shape(tool) => tool.activate(cx),
            Self::Text(tool) => tool.activate(cx),
        }
    }

    fn deactivate<S: Scene>(&mut self, scene: &mut S) {
        match self {
            Self::DrawStroke(tool) => tool.deactivate(scene),
            Self::Selection(tool) => tool.deactivate(scene),
            Self::Shape(tool) => tool.deactivate(scene),
            Self::Text(tool) => tool.deactivate(scene),
        }
    }

    fn brush_changed<S: Scene>(&mut self, cx: &mut ToolContext<'_, S>) {
        match self {
            Self::DrawStroke(tool) => tool.brush_changed(cx),
            Self::Selection(tool) => tool.brush_changed(cx),
            Self::Shape(tool) => tool.brush_changed(cx),
            Self::Text(tool) => tool.brush_changed(cx),
        }
    }

    fn on_pointer_down<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        match self {
            Self::DrawStroke(tool) => tool.on_pointer_down(screen, cx),
            Self::Selection(tool) => tool.on_pointer_down(screen, cx),
            Self::Shape(tool) => tool.on_pointer_down(screen, cx),
            Self::Text(tool) => tool.on_pointer_down(screen, cx),
        }
    }

    fn on_pointer_move<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        match self {
            Self::DrawStroke(tool) => tool.on_pointer_move(screen, cx),
            Self::Selection(tool) => tool.on_pointer_move(screen, cx),
            Self::Shape(tool) => tool.on_pointer_move(screen, cx),
            Self::Text(tool) => tool.on_pointer_move(screen, cx),
        }
    }

    fn on_pointer_up<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        match self {
            Self::DrawStroke(tool) => tool.on_pointer_up(screen, cx),
            Self::Selection(tool) => tool.on_pointer_up(screen, cx),
            Self::Shape(tool) => tool.on_pointer_up(screen, cx),
            Self::Text(tool) => tool.on_pointer_up(screen, cx),
        }
    }
}

/// Factory function to create a new tool of the specified kind
pub fn new_tool(kind: ToolKind) -> ToolType {
    match kind {
        ToolKind::Select => ToolType::Selection(SelectionTool::new()),
        ToolKind::Pencil => ToolType::DrawStroke(DrawStrokeTool::pencil()),
        ToolKind::Eraser => ToolType::DrawStroke(DrawStrokeTool::eraser()),
        ToolKind::Rectangle => ToolType::Shape(ShapeTool::new(ShapeKind::Rectangle)),
        ToolKind::Ellipse => ToolType::Shape(ShapeTool::new(ShapeKind::Ellipse)),
        ToolKind::Line => ToolType::Shape(ShapeTool::new(ShapeKind::Line)),
        ToolKind::Text => ToolType::Text(TextTool::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_matches_kind() {
        for kind in ToolKind::ALL {
            let tool = new_tool(kind);
            assert_eq!(tool.kind(), kind);
            assert_eq!(tool.name(), kind.name());
        }
    }

    #[test]
    fn test_fresh_tools_start_in_their_resting_phase() {
        assert_eq!(new_tool(ToolKind::Select).phase(), ToolPhase::Select);
        assert_eq!(new_tool(ToolKind::Pencil).phase(), ToolPhase::DrawingFreehand);
        assert_eq!(new_tool(ToolKind::Rectangle).phase(), ToolPhase::Idle);
        assert_eq!(new_tool(ToolKind::Text).phase(), ToolPhase::Idle);
    }

    #[test]
    fn test_pointer_handlers_reach_the_wrapped_tool() {
        use crate::scene::{MemoryScene, Shape};
        use egui::pos2;

        let mut scene = MemoryScene::new(100.0, 100.0);
        let brush = BrushSettings::default();
        let config = EditorConfig::default();
        let mut cx = ToolContext { scene: &mut scene, brush: &brush, config: &config };
        let mut tool = new_tool(ToolKind::Rectangle);

        assert_eq!(tool.on_pointer_down(pos2(10.0, 10.0), &mut cx), None);
        assert_eq!(tool.phase(), ToolPhase::DraggingShape);
        tool.on_pointer_move(pos2(30.0, 50.0), &mut cx);
        let outcome = tool.on_pointer_up(pos2(30.0, 50.0), &mut cx);
        assert!(matches!(outcome, Some(ToolOutcome::Committed(_))));
        assert_eq!(tool.phase(), ToolPhase::Idle);
        assert_eq!(scene.objects()[0].shape, Shape::Rect { width: 20.0, height: 40.0 });
    }

    #[test]
    fn test_scene_gestures_route_through_pointer_handlers() {
        use crate::scene::MemoryScene;
        use egui::pos2;

        let mut scene = MemoryScene::new(100.0, 100.0);
        let brush = BrushSettings::default();
        let config = EditorConfig::default();
        let mut cx = ToolContext { scene: &mut scene, brush: &brush, config: &config };
        let mut tool = new_tool(ToolKind::Pencil);
        tool.activate(&mut cx);

        tool.on_pointer_down(pos2(5.0, 5.0), &mut cx);
        tool.on_pointer_move(pos2(20.0, 25.0), &mut cx);
        let outcome = tool.on_pointer_up(pos2(30.0, 30.0), &mut cx);
        assert!(matches!(outcome, Some(ToolOutcome::Committed(_))));
        assert_eq!(scene.objects().len(), 1);
    }
}
