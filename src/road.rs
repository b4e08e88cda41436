use crate::{
    config::settings::{HeadingMode, Road as RoadParams},
    model::{DrawBuffer, Material, ModelAsset, Vertex},
};

use cgmath::{EuclideanSpace, InnerSpace, Point2, Vector2};
use rand::Rng;

use std::collections::HashMap;

/// Extra width of the grass strip on each side of the paved road.
pub const GRASS_MARGIN: f32 = 15.0;
/// Side of the square ground tiles placed at the corridor's ends.
pub const GROUND_TILE: f32 = 70.0;

pub const GRASS_HEIGHT: f32 = -0.01;
pub const PAVED_HEIGHT: f32 = 0.0;
pub const GROUND_HEIGHT: f32 = -0.05;

pub const ROAD_COLOR: [f32; 3] = [0.40, 0.25, 0.13];
pub const GRASS_COLOR: [f32; 3] = [0.3, 0.8, 0.2];
pub const GROUND_COLOR: [f32; 3] = [0.9, 1.0, 0.9];

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RoadError {
    #[error("corridor needs at least one step")]
    NoSteps,
    #[error("invalid step length {0}")]
    BadStepLength(f32),
    #[error("invalid turn limit {0}")]
    BadTurn(f32),
    #[error("invalid road width {0}")]
    BadWidth(f32),
}

/// Ground plane direction for a heading in degrees, measured from +Z.
pub fn heading_direction(degrees: f32) -> Vector2<f32> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vector2::new(sin, cos)
}

/// Corners of a quad lying across a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub left_start: Point2<f32>,
    pub right_start: Point2<f32>,
    pub left_end: Point2<f32>,
    pub right_end: Point2<f32>,
}

/// A straight piece of the road, in ground coordinates `(x, z)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point2<f32>,
    pub end: Point2<f32>,
}

impl Segment {
    pub fn new(start: Point2<f32>, end: Point2<f32>) -> Self {
        Segment { start, end }
    }

    pub fn length(&self) -> f32 {
        (self.end - self.start).magnitude()
    }

    pub fn midpoint(&self) -> Point2<f32> {
        self.start.midpoint(self.end)
    }

    pub fn direction(&self) -> Option<Vector2<f32>> {
        let dir = self.end - self.start;
        if dir.magnitude2() > 0.0 {
            Some(dir.normalize())
        } else {
            None
        }
    }

    /// Unit vector pointing to the left of the driving direction.
    pub fn left(&self) -> Option<Vector2<f32>> {
        self.direction().map(|dir| Vector2::new(dir.y, -dir.x))
    }

    /// Squared distance from a point to the closest point of the segment.
    pub fn distance2(&self, point: Point2<f32>) -> Option<f32> {
        let dir = self.end - self.start;
        let length2 = dir.magnitude2();
        if length2 <= 0.0 {
            return None;
        }
        let t = ((point - self.start).dot(dir) / length2).clamp(0.0, 1.0);
        let closest = self.start + dir * t;
        Some((point - closest).magnitude2())
    }

    pub fn contains(&self, point: Point2<f32>, tolerance: f32) -> bool {
        match self.distance2(point) {
            Some(d2) => d2 <= tolerance * tolerance,
            None => false,
        }
    }

    pub fn quad(&self, half_width: f32) -> Option<Quad> {
        self.left().map(|left| {
            let offset = left * half_width;
            Quad {
                left_start: self.start + offset,
                right_start: self.start - offset,
                left_end: self.end + offset,
                right_end: self.end - offset,
            }
        })
    }
}

/// Triangle lists of the three corridor layers.
#[derive(Clone, Debug, Default)]
pub struct Surface {
    pub ground: Vec<Vertex>,
    pub grass: Vec<Vertex>,
    pub paved: Vec<Vertex>,
}

fn push_quad(
    out: &mut Vec<Vertex>,
    corners: [Point2<f32>; 4],
    height: f32,
) {
    let vertex = |p: Point2<f32>, tc: [f32; 2]| Vertex {
        pos: [p.x, height, p.y],
        tex_coord: tc,
        normal: [0.0, 1.0, 0.0],
    };
    let [a, b, c, d] = corners;
    out.extend_from_slice(&[
        vertex(a, [0.0, 0.0]),
        vertex(b, [1.0, 0.0]),
        vertex(c, [1.0, 1.0]),
        vertex(a, [0.0, 0.0]),
        vertex(c, [1.0, 1.0]),
        vertex(d, [0.0, 1.0]),
    ]);
}

fn push_tile(out: &mut Vec<Vertex>, center: Point2<f32>, size: f32, height: f32) {
    let h = 0.5 * size;
    push_quad(
        out,
        [
            Point2::new(center.x - h, center.y - h),
            Point2::new(center.x + h, center.y - h),
            Point2::new(center.x + h, center.y + h),
            Point2::new(center.x - h, center.y + h),
        ],
        height,
    );
}

#[derive(Clone, Debug)]
pub struct Corridor {
    points: Vec<Point2<f32>>,
    segments: Vec<Segment>,
    width: f32,
}

impl Corridor {
    pub fn generate<R: Rng + ?Sized>(params: &RoadParams, rng: &mut R) -> Result<Self, RoadError> {
        if params.step_count == 0 {
            return Err(RoadError::NoSteps);
        }
        if !params.step_length.is_finite() || params.step_length <= 0.0 {
            return Err(RoadError::BadStepLength(params.step_length));
        }
        if !params.max_turn.is_finite() || params.max_turn < 0.0 {
            return Err(RoadError::BadTurn(params.max_turn));
        }

        let mut points = Vec::with_capacity(params.step_count + 1);
        let mut point = Point2::new(0.0, 0.0);
        let mut heading = 0.0f32;
        points.push(point);
        for _ in 0..params.step_count {
            let turn = rng.gen_range(-params.max_turn..=params.max_turn);
            heading = match params.heading {
                HeadingMode::Cumulative => heading + turn,
                HeadingMode::Absolute => turn,
            };
            point += heading_direction(heading) * params.step_length;
            points.push(point);
        }

        let corridor = Self::from_points(points, params.width)?;
        debug!(
            "Generated corridor of {} segments, ending at {:?}",
            corridor.segments.len(),
            corridor.end()
        );
        Ok(corridor)
    }

    /// Builds a corridor through the given points, dropping repeated ones.
    pub fn from_points(points: Vec<Point2<f32>>, width: f32) -> Result<Self, RoadError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(RoadError::BadWidth(width));
        }
        let mut unique = Vec::<Point2<f32>>::with_capacity(points.len());
        for p in points {
            if unique.last() != Some(&p) {
                unique.push(p);
            }
        }
        if unique.len() < 2 {
            return Err(RoadError::NoSteps);
        }
        let segments = unique
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect();
        Ok(Corridor {
            points: unique,
            segments,
            width,
        })
    }

    pub fn points(&self) -> &[Point2<f32>] {
        &self.points
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn start(&self) -> Point2<f32> {
        self.points[0]
    }

    pub fn end(&self) -> Point2<f32> {
        self.points[self.points.len() - 1]
    }

    pub fn contains(&self, point: Point2<f32>, tolerance: f32) -> bool {
        self.segments
            .iter()
            .any(|segment| segment.contains(point, tolerance))
    }

    pub fn paved_quads(&self) -> Vec<Quad> {
        let half = 0.5 * self.width;
        self.segments.iter().filter_map(|s| s.quad(half)).collect()
    }

    pub fn grass_quads(&self) -> Vec<Quad> {
        let half = 0.5 * self.width + GRASS_MARGIN;
        self.segments.iter().filter_map(|s| s.quad(half)).collect()
    }

    fn push_layer(out: &mut Vec<Vertex>, quads: &[Quad], height: f32) {
        for q in quads {
            push_quad(out, [q.left_start, q.right_start, q.right_end, q.left_end], height);
        }
        // close the gaps at the joints
        for pair in quads.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            push_quad(out, [a.left_end, a.right_end, b.right_start, b.left_start], height);
        }
    }

    pub fn surface(&self) -> Surface {
        let mut surface = Surface::default();
        push_tile(&mut surface.ground, self.start(), GROUND_TILE, GROUND_HEIGHT);
        push_tile(&mut surface.ground, self.end(), GROUND_TILE, GROUND_HEIGHT);
        Self::push_layer(&mut surface.grass, &self.grass_quads(), GRASS_HEIGHT);
        Self::push_layer(&mut surface.paved, &self.paved_quads(), PAVED_HEIGHT);
        surface
    }

    /// Road surface as a model with one draw buffer per layer, bottom first.
    pub fn surface_model(&self) -> ModelAsset {
        let surface = self.surface();
        let layers = [
            ("ground", GROUND_COLOR, surface.ground),
            ("grass", GRASS_COLOR, surface.grass),
            ("road", ROAD_COLOR, surface.paved),
        ];
        let mut materials = HashMap::new();
        let mut buffers = Vec::with_capacity(layers.len());
        for (name, color, vertices) in layers {
            materials.insert(name.to_string(), Material::with_diffuse(name, color));
            buffers.push(DrawBuffer {
                material: Some(name.to_string()),
                vertices,
            });
        }
        ModelAsset::from_parts("corridor", materials, buffers)
    }
}
