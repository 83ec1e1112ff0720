use egui::Pos2;

use crate::scene::{Scene, SceneObject, Shape};
use crate::tools::{Tool, ToolContext, ToolKind, ToolOutcome, ToolPhase};

/// Places one editable text object at the next click, then disarms
#[derive(Debug, Clone, Default)]
pub struct TextTool {
    armed: bool,
}

impl TextTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl Tool for TextTool {
    fn name(&self) -> &'static str {
        "Text"
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Text
    }

    fn phase(&self) -> ToolPhase {
        if self.armed {
            ToolPhase::AwaitingTextPlacement
        } else {
            ToolPhase::Idle
        }
    }

    fn activate<S: Scene>(&mut self, _cx: &mut ToolContext<'_, S>) {
        self.armed = true;
    }

    fn deactivate<S: Scene>(&mut self, _scene: &mut S) {
        self.armed = false;
    }

    fn on_pointer_down<S: Scene>(
        &mut self,
        screen: Pos2,
        cx: &mut ToolContext<'_, S>,
    ) -> Option<ToolOutcome> {
        if !self.armed {
            return None;
        }
        self.armed = false;

        let at = cx.scene.pointer_to_scene(screen);
        let text = SceneObject::new(Shape::Text {
            content: cx.config.text_content.clone(),
            font_size: cx.config.text_font_size,
            font_family: cx.config.text_font_family.clone(),
            editing: true,
        })
        .at(at.x, at.y)
        .with_fill(cx.brush.color);

        let id = cx.scene.add_object(text);
        cx.scene.set_active_object(id);
        cx.scene.render();
        log::debug!("Text placed at ({}, {})", at.x, at.y);
        Some(ToolOutcome::Committed(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::scene::MemoryScene;
    use crate::state::BrushSettings;
    use egui::{Color32, pos2};

    #[test]
    fn test_places_exactly_one_text_per_activation() {
        let mut scene = MemoryScene::new(200.0, 200.0);
        let brush = BrushSettings {
            color: Color32::RED,
            ..Default::default()
        };
        let config = EditorConfig::default();
        let mut cx = ToolContext { scene: &mut scene, brush: &brush, config: &config };

        let mut tool = TextTool::new();
        tool.activate(&mut cx);
        assert_eq!(tool.phase(), ToolPhase::AwaitingTextPlacement);

        let first = tool.on_pointer_down(pos2(40.0, 60.0), &mut cx);
        let second = tool.on_pointer_down(pos2(80.0, 90.0), &mut cx);
        assert!(matches!(first, Some(ToolOutcome::Committed(_))));
        assert_eq!(second, None);
        assert_eq!(tool.phase(), ToolPhase::Idle);

        let Some(ToolOutcome::Committed(id)) = first else { unreachable!() };
        assert_eq!(scene.objects().len(), 1);
        assert_eq!(scene.active_object(), Some(id));
        let text = scene.object(id).unwrap();
        assert_eq!((text.left, text.top), (40.0, 60.0));
        assert_eq!(text.fill, Some(Color32::RED));
        assert!(matches!(
            &text.shape,
            Shape::Text { content, editing: true, .. } if content == "Type here"
        ));
    }

    #[test]
    fn test_deactivate_disarms() {
        let mut scene = MemoryScene::new(200.0, 200.0);
        let brush = BrushSettings::default();
        let config = EditorConfig::default();
        let mut cx = ToolContext { scene: &mut scene, brush: &brush, config: &config };

        let mut tool = TextTool::new();
        tool.activate(&mut cx);
        tool.deactivate(cx.scene);
        assert_eq!(tool.on_pointer_down(pos2(1.0, 1.0), &mut cx), None);
        assert!(scene.objects().is_empty());
    }
}
