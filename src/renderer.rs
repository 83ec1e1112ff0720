use egui::epaint::{Mesh, TextShape, Vertex};
use egui::{Color32, Context, FontFamily, FontId, Painter, Pos2, Rect, Shape as PaintShape, Stroke, pos2, vec2};

use crate::scene::{MemoryScene, Scene, SceneObject, Shape};
use crate::texture_manager::TextureManager;

const ELLIPSE_SEGMENTS: usize = 64;
const SELECTION_COLOR: Color32 = Color32::from_rgb(33, 150, 243);

/// Paints a [`MemoryScene`] with the egui painter.
///
/// The scene's viewport decides where the canvas lands on screen; call
/// [`MemoryScene::set_viewport`] before rendering.
pub struct Renderer {
    textures: TextureManager,
    ctx: Context,
}

impl Renderer {
    pub fn new(ctx: &Context) -> Self {
        Self {
            textures: TextureManager::new(64),
            ctx: ctx.clone(),
        }
    }

    /// Screen rectangle covered by the canvas
    pub fn canvas_rect(scene: &MemoryScene) -> Rect {
        Rect::from_min_size(scene.viewport_origin(), scene.dimensions() * scene.zoom())
    }

    pub fn render(&mut self, painter: &Painter, scene: &MemoryScene) {
        self.textures.begin_frame();

        let canvas = Self::canvas_rect(scene);
        paint_checkerboard(painter, canvas);
        painter.rect_filled(canvas, 0.0, scene.background());

        let painter = painter.with_clip_rect(canvas.intersect(painter.clip_rect()));
        let origin = scene.viewport_origin();
        let zoom = scene.zoom();
        let to_screen = |p: Pos2| origin + p.to_vec2() * zoom;

        for object in scene.objects() {
            self.paint_object(&painter, object, &to_screen, 1.0);
        }

        if let Some(stroke) = scene.pending_stroke() {
            let brush = stroke.brush();
            let points: Vec<Pos2> = stroke.points().iter().map(|p| to_screen(*p)).collect();
            painter.add(PaintShape::line(
                points,
                Stroke::new(brush.width * zoom, brush.color.gamma_multiply(brush.opacity)),
            ));
        }

        for id in scene.active_objects() {
            if let Some(bounds) = scene.bounding_rect(id) {
                let screen = Rect::from_two_pos(to_screen(bounds.min), to_screen(bounds.max));
                painter.rect_stroke(screen.expand(2.0), 0.0, Stroke::new(1.5, SELECTION_COLOR));
            }
        }
    }

    /// Paints one object. `parent` maps the object's parent space to the screen.
    fn paint_object(
        &mut self,
        painter: &Painter,
        object: &SceneObject,
        parent: &dyn Fn(Pos2) -> Pos2,
        parent_opacity: f32,
    ) {
        let map = |local: Pos2| parent(object.local_to_world(local));
        let opacity = parent_opacity * object.opacity.clamp(0.0, 1.0);
        // Screen pixels per local unit, used for stroke widths and font sizes
        let unit = map(pos2(1.0, 0.0)).distance(map(Pos2::ZERO));
        let stroke = object.stroke.map_or(Stroke::NONE, |color| {
            Stroke::new(object.stroke_width * unit, color.gamma_multiply(opacity))
        });
        let fill = object
            .fill
            .map_or(Color32::TRANSPARENT, |color| color.gamma_multiply(opacity));

        match &object.shape {
            Shape::Path { points } => {
                let points: Vec<Pos2> = points.iter().map(|p| map(*p)).collect();
                painter.add(PaintShape::line(points, stroke));
            }
            Shape::Rect { width, height } => {
                let corners = [
                    pos2(0.0, 0.0),
                    pos2(*width, 0.0),
                    pos2(*width, *height),
                    pos2(0.0, *height),
                ]
                .map(map)
                .to_vec();
                painter.add(PaintShape::convex_polygon(corners, fill, stroke));
            }
            Shape::Ellipse { rx, ry } => {
                let points = (0..ELLIPSE_SEGMENTS)
                    .map(|i| {
                        let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                        map(pos2(rx + rx * t.cos(), ry + ry * t.sin()))
                    })
                    .collect();
                painter.add(PaintShape::convex_polygon(points, fill, stroke));
            }
            Shape::Line { from, to } => {
                painter.line_segment([map(*from), map(*to)], stroke);
            }
            Shape::Text { content, font_size, font_family, .. } => {
                let family = match font_family.as_str() {
                    "monospace" => FontFamily::Monospace,
                    _ => FontFamily::Proportional,
                };
                let galley = painter.layout_no_wrap(
                    content.clone(),
                    FontId::new(font_size * unit, family),
                    fill,
                );
                let angle = (map(pos2(1.0, 0.0)) - map(Pos2::ZERO)).angle();
                painter.add(TextShape::new(map(Pos2::ZERO), galley, fill).with_angle(angle));
            }
            Shape::Image { source } => match self.textures.texture_for(source, &self.ctx) {
                Ok(texture) => {
                    let [width, height] = source.natural_size().map(|side| side as f32);
                    let tint = Color32::WHITE.gamma_multiply(opacity);
                    let mut mesh = Mesh::with_texture(texture);
                    let corners = [
                        (pos2(0.0, 0.0), pos2(0.0, 0.0)),
                        (pos2(width, 0.0), pos2(1.0, 0.0)),
                        (pos2(width, height), pos2(1.0, 1.0)),
                        (pos2(0.0, height), pos2(0.0, 1.0)),
                    ];
                    for (local, uv) in corners {
                        mesh.vertices.push(Vertex { pos: map(local), uv, color: tint });
                    }
                    mesh.add_triangle(0, 1, 2);
                    mesh.add_triangle(0, 2, 3);
                    painter.add(PaintShape::mesh(mesh));
                }
                Err(err) => log::warn!("Skipping image {}: {}", source.key(), err),
            },
            Shape::Group { children } => {
                for child in children {
                    self.paint_object(painter, child, &map, opacity);
                }
            }
        }
    }
}

fn paint_checkerboard(painter: &Painter, rect: Rect) {
    const CELL: f32 = 12.0;
    painter.rect_filled(rect, 0.0, Color32::from_gray(200));
    let columns = (rect.width() / CELL).ceil() as usize;
    let rows = (rect.height() / CELL).ceil() as usize;
    for row in 0..rows {
        for column in (row % 2..columns).step_by(2) {
            let min = rect.min + vec2(column as f32 * CELL, row as f32 * CELL);
            let cell = Rect::from_min_size(min, vec2(CELL, CELL)).intersect(rect);
            painter.rect_filled(cell, 0.0, Color32::from_gray(160));
        }
    }
}
