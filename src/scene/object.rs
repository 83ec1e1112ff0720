use egui::emath::Rot2;
use egui::{Color32, Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::ImageSource;
use crate::error::EditorResult;

/// Stable identity of an object inside a scene.
///
/// Identities are part of the serialized scene, so an object restored from a
/// snapshot keeps the id it had when the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a scene object, as reported to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Path,
    Rectangle,
    Ellipse,
    Line,
    Text,
    Image,
    Group,
}

impl ObjectKind {
    /// Name used by the UI and as the prefix of exported object files
    pub fn label(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "circle",
            Self::Line => "line",
            Self::Text => "text",
            Self::Image => "image",
            Self::Group => "group",
        }
    }
}

/// Geometry of an object in its local coordinate space.
///
/// Local coordinates are unscaled and unrotated; the object's `left`/`top`
/// places the local origin on the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Freehand polyline
    Path { points: Vec<Pos2> },
    Rect { width: f32, height: f32 },
    /// Ellipse inscribed in `(0, 0)..(2 * rx, 2 * ry)`
    Ellipse { rx: f32, ry: f32 },
    Line { from: Pos2, to: Pos2 },
    Text {
        content: String,
        font_size: f32,
        font_family: String,
        editing: bool,
    },
    Image { source: ImageSource },
    Group { children: Vec<SceneObject> },
}

impl Shape {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Path { .. } => ObjectKind::Path,
            Self::Rect { .. } => ObjectKind::Rectangle,
            Self::Ellipse { .. } => ObjectKind::Ellipse,
            Self::Line { .. } => ObjectKind::Line,
            Self::Text { .. } => ObjectKind::Text,
            Self::Image { .. } => ObjectKind::Image,
            Self::Group { .. } => ObjectKind::Group,
        }
    }

    /// Extent of the shape in local coordinates
    pub fn local_bounds(&self) -> Rect {
        match self {
            Self::Path { points } => {
                if points.is_empty() {
                    Rect::ZERO
                } else {
                    Rect::from_points(points)
                }
            }
            Self::Rect { width, height } => Rect::from_min_size(Pos2::ZERO, vec2(*width, *height)),
            Self::Ellipse { rx, ry } => Rect::from_min_size(Pos2::ZERO, vec2(rx * 2.0, ry * 2.0)),
            Self::Line { from, to } => Rect::from_two_pos(*from, *to),
            Self::Text { content, font_size, .. } => {
                // Rough metrics; the host measures real glyphs when it paints.
                let lines = content.lines().count().max(1) as f32;
                let columns = content.lines().map(|l| l.chars().count()).max().unwrap_or(0) as f32;
                Rect::from_min_size(
                    Pos2::ZERO,
                    vec2(columns * font_size * 0.6, lines * font_size * 1.16),
                )
            }
            Self::Image { source } => {
                let [width, height] = source.natural_size();
                Rect::from_min_size(Pos2::ZERO, vec2(width as f32, height as f32))
            }
            Self::Group { children } => children
                .iter()
                .map(SceneObject::bounding_rect)
                .reduce(|a, b| a.union(b))
                .unwrap_or(Rect::ZERO),
        }
    }
}

/// A drawable object owned by a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub shape: Shape,
    pub left: f32,
    pub top: f32,
    /// Rotation in degrees, clockwise, around the object's center
    pub angle: f32,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub fill: Option<Color32>,
    pub stroke: Option<Color32>,
    pub stroke_width: f32,
    pub selectable: bool,
    pub evented: bool,
}

impl SceneObject {
    pub fn new(shape: Shape) -> Self {
        Self {
            id: ObjectId::new(),
            shape,
            left: 0.0,
            top: 0.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            selectable: true,
            evented: true,
        }
    }

    pub fn at(mut self, left: f32, top: f32) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn with_stroke(mut self, color: Color32, width: f32) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }

    pub fn with_fill(mut self, color: Color32) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale_x = scale;
        self.scale_y = scale;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.set_interactive(interactive);
        self
    }

    /// Sets both the selectable and the event-receptive flag
    pub fn set_interactive(&mut self, interactive: bool) {
        self.selectable = interactive;
        self.evented = interactive;
    }

    pub fn kind(&self) -> ObjectKind {
        self.shape.kind()
    }

    pub fn image_source(&self) -> Option<&ImageSource> {
        match &self.shape {
            Shape::Image { source } => Some(source),
            _ => None,
        }
    }

    /// Copy of this object (and its children) under fresh identities
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::new();
        if let Shape::Group { children } = &mut copy.shape {
            for child in children.iter_mut() {
                *child = child.duplicate();
            }
        }
        copy
    }

    /// Decodes every image source held by this object
    pub fn ensure_decoded(&mut self) -> EditorResult<()> {
        match &mut self.shape {
            Shape::Image { source } => source.ensure_decoded(),
            Shape::Group { children } => children.iter_mut().try_for_each(Self::ensure_decoded),
            _ => Ok(()),
        }
    }

    fn signed_scale(&self) -> Vec2 {
        vec2(
            if self.flip_x { -self.scale_x } else { self.scale_x },
            if self.flip_y { -self.scale_y } else { self.scale_y },
        )
    }

    fn rotation(&self) -> Rot2 {
        Rot2::from_angle(self.angle.to_radians())
    }

    /// Scene position of the local bounds' center
    pub fn world_center(&self) -> Pos2 {
        let center = self.shape.local_bounds().center();
        pos2(
            self.left + center.x * self.scale_x,
            self.top + center.y * self.scale_y,
        )
    }

    /// Maps a local point onto the scene
    pub fn local_to_world(&self, local: Pos2) -> Pos2 {
        let center = self.shape.local_bounds().center();
        let scale = self.signed_scale();
        let offset = local - center;
        self.world_center() + self.rotation() * vec2(offset.x * scale.x, offset.y * scale.y)
    }

    /// Maps a scene point into local coordinates. `None` for degenerate scales.
    pub fn world_to_local(&self, world: Pos2) -> Option<Pos2> {
        let scale = self.signed_scale();
        if scale.x == 0.0 || scale.y == 0.0 {
            return None;
        }
        let center = self.shape.local_bounds().center();
        let offset = self.rotation().inverse() * (world - self.world_center());
        Some(center + vec2(offset.x / scale.x, offset.y / scale.y))
    }

    /// Axis-aligned bounding box on the scene, after scale, flip and rotation
    pub fn bounding_rect(&self) -> Rect {
        let bounds = self.shape.local_bounds();
        let corners = [
            bounds.left_top(),
            bounds.right_top(),
            bounds.right_bottom(),
            bounds.left_bottom(),
        ]
        .map(|corner| self.local_to_world(corner));
        Rect::from_points(&corners)
    }

    /// Whether a scene point lies inside the object's local bounds
    pub fn contains(&self, world: Pos2) -> bool {
        let bounds = self.shape.local_bounds().expand(self.stroke_width.max(1.0) / 2.0);
        self.world_to_local(world)
            .is_some_and(|local| bounds.contains(local))
    }
}
