use egui::{Color32, Pos2, Rect, Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::raster;
use super::{
    ExportOptions, InteractionMode, ObjectId, Scene, SceneEvent, SceneObject, SceneSnapshot,
};
use crate::codec;
use crate::error::EditorResult;
use crate::input::InputEvent;
use crate::stroke::MutableStroke;

#[derive(Serialize)]
struct SceneDocumentRef<'a> {
    version: &'a str,
    background: Color32,
    objects: &'a [SceneObject],
}

#[derive(Deserialize)]
struct SceneDocument {
    version: String,
    background: Color32,
    objects: Vec<SceneObject>,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    id: ObjectId,
    last: Pos2,
    moved: bool,
}

/// In-process scene: a flat, bottom-to-top list of objects plus the
/// selection and the natively handled gestures.
///
/// Painting on screen is left to the host, which reads [`Scene::objects`]
/// every frame; [`Scene::render`] only counts repaint requests.
#[derive(Debug)]
pub struct MemoryScene {
    objects: Vec<SceneObject>,
    selection: Vec<ObjectId>,
    size: Vec2,
    background: Color32,
    origin: Pos2,
    zoom: f32,
    interaction: InteractionMode,
    pending_stroke: Option<MutableStroke>,
    drag: Option<DragState>,
    render_count: u64,
    disposed: bool,
}

impl MemoryScene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: Vec::new(),
            selection: Vec::new(),
            size: vec2(width, height),
            background: Color32::TRANSPARENT,
            origin: Pos2::ZERO,
            zoom: 1.0,
            interaction: InteractionMode::Passive,
            pending_stroke: None,
            drag: None,
            render_count: 0,
            disposed: false,
        }
    }

    /// Places the scene on screen: `origin` is where scene (0, 0) is painted
    pub fn set_viewport(&mut self, origin: Pos2, zoom: f32) {
        self.origin = origin;
        self.zoom = zoom.max(f32::EPSILON);
    }

    pub fn viewport_origin(&self) -> Pos2 {
        self.origin
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn interaction(&self) -> InteractionMode {
        self.interaction
    }

    /// The freehand stroke being captured, for live preview
    pub fn pending_stroke(&self) -> Option<&MutableStroke> {
        self.pending_stroke.as_ref()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Replaces the selection with several objects at once
    pub fn select_many(&mut self, ids: &[ObjectId]) {
        self.selection = ids.iter().copied().filter(|id| self.contains(*id)).collect();
    }

    /// Topmost event-receptive object under a scene point
    pub fn object_at(&self, point: Pos2) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|object| object.evented && object.contains(point))
            .map(|object| object.id)
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    fn handle_select(&mut self, event: &InputEvent) -> Option<SceneEvent> {
        let point = self.pointer_to_scene(event.position());
        match event {
            InputEvent::PointerDown { .. } => {
                match self.object_at(point) {
                    Some(id) if self.object(id).is_some_and(|o| o.selectable) => {
                        self.selection = vec![id];
                        self.drag = Some(DragState { id, last: point, moved: false });
                    }
                    _ => self.discard_active_selection(),
                }
                None
            }
            InputEvent::PointerMove { .. } => {
                let drag = self.drag.as_mut()?;
                let delta = point - drag.last;
                drag.last = point;
                drag.moved |= delta != Vec2::ZERO;
                let id = drag.id;
                if let Some(object) = self.object_mut(id) {
                    object.left += delta.x;
                    object.top += delta.y;
                }
                None
            }
            InputEvent::PointerUp { .. } => {
                let drag = self.drag.take()?;
                (drag.moved && self.contains(drag.id)).then_some(SceneEvent::ObjectModified(drag.id))
            }
        }
    }

    fn handle_draw(&mut self, event: &InputEvent) -> Option<SceneEvent> {
        let InteractionMode::Draw(brush) = self.interaction else {
            return None;
        };
        let point = self.pointer_to_scene(event.position());
        match event {
            InputEvent::PointerDown { .. } => {
                let mut stroke = MutableStroke::new(brush);
                stroke.add_point(point);
                self.pending_stroke = Some(stroke);
                None
            }
            InputEvent::PointerMove { .. } => {
                self.pending_stroke.as_mut()?.add_point(point);
                None
            }
            InputEvent::PointerUp { .. } => {
                let mut stroke = self.pending_stroke.take()?;
                stroke.add_point(point);
                let object = stroke.into_object()?;
                let id = self.add_object(object);
                log::debug!("Freehand path created: {}", id);
                Some(SceneEvent::PathCreated(id))
            }
        }
    }
}

impl Scene for MemoryScene {
    fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        self.selection.retain(|selected| *selected != id);
        if self.drag.is_some_and(|drag| drag.id == id) {
            self.drag = None;
        }
        Some(self.objects.remove(index))
    }

    fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn set_all_interactive(&mut self, interactive: bool) {
        for object in &mut self.objects {
            object.set_interactive(interactive);
        }
    }

    fn active_object(&self) -> Option<ObjectId> {
        match self.selection.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    fn active_objects(&self) -> Vec<ObjectId> {
        self.selection.clone()
    }

    fn set_active_object(&mut self, id: ObjectId) {
        if self.contains(id) {
            self.selection = vec![id];
        }
    }

    fn discard_active_selection(&mut self) {
        self.selection.clear();
    }

    async fn clone_object(&self, id: ObjectId) -> Option<SceneObject> {
        self.object(id).map(SceneObject::duplicate)
    }

    fn bounding_rect(&self, id: ObjectId) -> Option<Rect> {
        self.object(id).map(SceneObject::bounding_rect)
    }

    fn pointer_to_scene(&self, screen: Pos2) -> Pos2 {
        Pos2::ZERO + (screen - self.origin) / self.zoom
    }

    fn serialize(&self) -> EditorResult<SceneSnapshot> {
        let document = SceneDocumentRef {
            version: env!("CARGO_PKG_VERSION"),
            background: self.background,
            objects: &self.objects,
        };
        Ok(SceneSnapshot::new(serde_json::to_string(&document)?))
    }

    async fn restore(&mut self, snapshot: &SceneSnapshot) -> EditorResult<()> {
        let mut document: SceneDocument = serde_json::from_str(snapshot.as_str())?;
        if document.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Snapshot version {} differs from current version {}",
                document.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        // Decode everything before touching the live scene
        for object in &mut document.objects {
            object.ensure_decoded()?;
        }

        self.objects = document.objects;
        self.background = document.background;
        self.selection.clear();
        self.drag = None;
        self.pending_stroke = None;
        self.render();
        Ok(())
    }

    fn render(&mut self) {
        self.render_count += 1;
    }

    fn export_raster(&self, options: &ExportOptions) -> EditorResult<Vec<u8>> {
        let pixels = raster::rasterize(&self.objects, self.size, self.background, options.multiplier)?;
        codec::encode_raster(&pixels, options.format)
    }

    fn shift_z_order(&mut self, id: ObjectId, delta: isize) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let last = self.objects.len() as isize - 1;
        let target = (index as isize + delta).clamp(0, last) as usize;
        if target != index {
            let object = self.objects.remove(index);
            self.objects.insert(target, object);
        }
    }

    fn dimensions(&self) -> Vec2 {
        self.size
    }

    fn set_dimensions(&mut self, width: f32, height: f32) {
        self.size = vec2(width, height);
    }

    fn background(&self) -> Color32 {
        self.background
    }

    fn set_background(&mut self, color: Color32) {
        self.background = color;
    }

    fn clear(&mut self) {
        self.objects.clear();
        self.selection.clear();
        self.drag = None;
    }

    fn set_interaction(&mut self, mode: InteractionMode) {
        // An in-flight stroke keeps its own brush across brush updates
        if !matches!(mode, InteractionMode::Draw(_)) {
            self.pending_stroke = None;
        }
        if mode != InteractionMode::Select {
            self.drag = None;
        }
        self.interaction = mode;
    }

    fn dispatch_pointer(&mut self, event: &InputEvent) -> Option<SceneEvent> {
        match self.interaction {
            InteractionMode::Passive => None,
            InteractionMode::Select => self.handle_select(event),
            InteractionMode::Draw(_) => self.handle_draw(event),
        }
    }

    fn create_surface(&self, width: u32, height: u32, background: Color32) -> EditorResult<Self> {
        raster::check_surface(width, height)?;
        let mut surface = MemoryScene::new(width as f32, height as f32);
        surface.set_background(background);
        Ok(surface)
    }

    fn dispose(&mut self) {
        self.objects.clear();
        self.selection.clear();
        self.pending_stroke = None;
        self.drag = None;
        self.interaction = InteractionMode::Passive;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RasterFormat;
    use crate::error::EditorError;
    use crate::scene::Shape;
    use crate::stroke::FreehandBrush;
    use egui::pos2;
    use futures::executor::block_on;

    fn rect_at(left: f32, top: f32) -> SceneObject {
        SceneObject::new(Shape::Rect { width: 10.0, height: 10.0 })
            .at(left, top)
            .with_fill(Color32::RED)
    }

    fn down(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerDown { position: pos2(x, y) }
    }

    fn drag_to(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMove { position: pos2(x, y) }
    }

    fn up(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerUp { position: pos2(x, y) }
    }

    #[test]
    fn test_z_order_moves_one_step() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        let a = scene.add_object(rect_at(0.0, 0.0));
        let b = scene.add_object(rect_at(0.0, 0.0));
        let c = scene.add_object(rect_at(0.0, 0.0));

        scene.shift_z_order(a, 1);
        let order: Vec<_> = scene.objects().iter().map(|o| o.id).collect();
        assert_eq!(order, vec![b, a, c]);

        // Clamped at the top
        scene.shift_z_order(c, 1);
        scene.shift_z_order(c, -1);
        let order: Vec<_> = scene.objects().iter().map(|o| o.id).collect();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn test_pointer_mapping_uses_viewport() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.set_viewport(pos2(50.0, 20.0), 2.0);
        assert_eq!(scene.pointer_to_scene(pos2(70.0, 40.0)), pos2(10.0, 10.0));
    }

    #[test]
    fn test_select_drag_reports_modification() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        let id = scene.add_object(rect_at(10.0, 10.0));
        scene.set_interaction(InteractionMode::Select);

        assert_eq!(scene.dispatch_pointer(&down(15.0, 15.0)), None);
        assert_eq!(scene.active_object(), Some(id));
        scene.dispatch_pointer(&drag_to(25.0, 20.0));
        let event = scene.dispatch_pointer(&up(25.0, 20.0));
        assert_eq!(event, Some(SceneEvent::ObjectModified(id)));
        let object = scene.object(id).unwrap();
        assert_eq!((object.left, object.top), (20.0, 15.0));
    }

    #[test]
    fn test_click_without_move_is_not_a_modification() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.add_object(rect_at(10.0, 10.0));
        scene.set_interaction(InteractionMode::Select);
        scene.dispatch_pointer(&down(15.0, 15.0));
        assert_eq!(scene.dispatch_pointer(&up(15.0, 15.0)), None);

        // Clicking empty space clears the selection
        scene.dispatch_pointer(&down(90.0, 90.0));
        assert_eq!(scene.active_objects(), vec![]);
    }

    #[test]
    fn test_draw_mode_creates_path() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.set_interaction(InteractionMode::Draw(FreehandBrush {
            color: Color32::BLACK,
            width: 3.0,
            opacity: 1.0,
        }));
        scene.dispatch_pointer(&down(1.0, 1.0));
        scene.dispatch_pointer(&drag_to(5.0, 9.0));
        let Some(SceneEvent::PathCreated(id)) = scene.dispatch_pointer(&up(8.0, 4.0)) else {
            panic!("expected a path");
        };
        let path = scene.object(id).unwrap();
        assert_eq!((path.left, path.top), (1.0, 1.0));
        assert!(scene.pending_stroke().is_none());
    }

    #[test]
    fn test_leaving_draw_mode_drops_pending_stroke() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.set_interaction(InteractionMode::Draw(FreehandBrush {
            color: Color32::BLACK,
            width: 3.0,
            opacity: 1.0,
        }));
        scene.dispatch_pointer(&down(1.0, 1.0));
        scene.set_interaction(InteractionMode::Passive);
        assert!(scene.pending_stroke().is_none());
        assert_eq!(scene.dispatch_pointer(&up(2.0, 2.0)), None);
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn test_restore_round_trip() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.set_background(Color32::WHITE);
        scene.add_object(rect_at(1.0, 2.0));
        let snapshot = scene.serialize().unwrap();

        scene.clear();
        scene.set_background(Color32::BLACK);
        block_on(scene.restore(&snapshot)).unwrap();

        assert_eq!(scene.objects().len(), 1);
        assert_eq!(scene.background(), Color32::WHITE);
        assert_eq!(scene.serialize().unwrap(), snapshot);
    }

    #[test]
    fn test_corrupt_snapshot_leaves_scene_untouched() {
        let mut scene = MemoryScene::new(100.0, 100.0);
        scene.add_object(rect_at(1.0, 2.0));
        let before = scene.serialize().unwrap();

        let result = block_on(scene.restore(&SceneSnapshot::new("{not json".to_owned())));
        assert!(matches!(result, Err(EditorError::Snapshot(_))));
        assert_eq!(scene.serialize().unwrap(), before);
    }

    #[test]
    fn test_zero_sized_surface_is_rejected() {
        let scene = MemoryScene::new(100.0, 100.0);
        assert!(matches!(
            scene.create_surface(0, 10, Color32::WHITE),
            Err(EditorError::RenderContext { width: 0, height: 10 })
        ));
        assert!(scene.create_surface(4, 4, Color32::WHITE).is_ok());
    }

    #[test]
    fn test_oversized_surfaces_are_rejected() {
        let scene = MemoryScene::new(100.0, 100.0);
        assert!(matches!(
            scene.create_surface(u32::MAX, u32::MAX, Color32::WHITE),
            Err(EditorError::RenderContext { .. })
        ));

        let mut huge = MemoryScene::new(100.0, 100.0);
        huge.set_dimensions(1.0e9, 1.0e9);
        let options = ExportOptions {
            format: RasterFormat::Png,
            multiplier: 2.0,
        };
        assert!(matches!(
            huge.export_raster(&options),
            Err(EditorError::RenderContext { .. })
        ));
    }
}
