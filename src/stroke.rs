use egui::{Color32, Pos2, pos2};

use crate::scene::{SceneObject, Shape};

/// Settings of the scene's freehand brush
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreehandBrush {
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
}

// Mutable stroke for capturing a gesture
#[derive(Debug, Clone)]
pub struct MutableStroke {
    points: Vec<Pos2>,
    brush: FreehandBrush,
}

impl MutableStroke {
    // The brush is copied so later brush changes leave this stroke alone
    pub fn new(brush: FreehandBrush) -> Self {
        Self {
            points: Vec::new(),
            brush,
        }
    }

    pub fn add_point(&mut self, point: Pos2) {
        // Skip repeats, pointer-move fires even when nothing moved
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    // Get a reference to the points for preview
    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn brush(&self) -> FreehandBrush {
        self.brush
    }

    /// Converts the captured points into a path object whose local origin is
    /// the top-left of the points' bounding box.
    pub fn into_object(self) -> Option<SceneObject> {
        let first = *self.points.first()?;
        let (min_x, min_y) = self
            .points
            .iter()
            .fold((first.x, first.y), |(x, y), p| (x.min(p.x), y.min(p.y)));
        let points = self
            .points
            .iter()
            .map(|p| pos2(p.x - min_x, p.y - min_y))
            .collect();
        Some(
            SceneObject::new(Shape::Path { points })
                .at(min_x, min_y)
                .with_stroke(self.brush.color, self.brush.width)
                .with_opacity(self.brush.opacity),
        )
    }
}
