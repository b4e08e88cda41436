use crate::{
    config::settings::Scenery as SceneryParams,
    model::{DrawBuffer, Material, ModelAsset, Vertex},
    road::Corridor,
};

use cgmath::{Point2, Vector2};
use rand::Rng;

use std::collections::HashMap;

pub const BASE_COLOR: [f32; 3] = [0.2, 0.9, 0.3];

/// Where to put a prop on the ground plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Point2<f32>,
    pub scale: f32,
    /// Index into the list of candidate models.
    pub variant: usize,
}

/// Trees along both sides of the corridor, a few per segment.
pub fn roadside<R: Rng + ?Sized>(
    corridor: &Corridor,
    params: &SceneryParams,
    rng: &mut R,
) -> Vec<Placement> {
    let (min_count, max_count) = params.trees_per_segment;
    let (min_dist, max_dist) = params.tree_distance;
    let mut placements = Vec::new();
    for segment in corridor.segments() {
        let left = match segment.left() {
            Some(left) => left,
            None => continue,
        };
        let mid = segment.midpoint();
        for _ in 0..rng.gen_range(min_count..=max_count) {
            let side = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            let dist = rng.gen_range(min_dist..=max_dist);
            placements.push(Placement {
                position: mid + left * (side * dist),
                scale: params.tree_scale,
                variant: 0,
            });
        }
    }
    debug!("Placed {} roadside trees", placements.len());
    placements
}

/// Parameters of a random ring of props around the origin.
#[derive(Clone, Debug)]
pub struct Scatter {
    pub count: usize,
    pub radius: (f32, f32),
    pub min_distance: f32,
    pub scale: f32,
    pub variants: usize,
}

impl Scatter {
    pub const TREES: Scatter = Scatter {
        count: 30,
        radius: (5.0, 21.0),
        min_distance: 2.5,
        scale: 0.2,
        variants: 1,
    };
    pub const GRASS: Scatter = Scatter {
        count: 250,
        radius: (3.0, 21.0),
        min_distance: 1.5,
        scale: 0.5,
        variants: 2,
    };

    const ATTEMPTS_PER_ITEM: usize = 100;

    /// Places up to `count` props, keeping them `min_distance` apart from
    /// each other and from everything in `occupied`, which gets updated.
    pub fn place<R: Rng + ?Sized>(
        &self,
        occupied: &mut Vec<Point2<f32>>,
        rng: &mut R,
    ) -> Vec<Placement> {
        let mut placements = Vec::with_capacity(self.count);
        let min_dist2 = self.min_distance * self.min_distance;
        let mut attempts = self.count * Self::ATTEMPTS_PER_ITEM;
        while placements.len() < self.count && attempts != 0 {
            attempts -= 1;
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let radius = rng.gen_range(self.radius.0..=self.radius.1);
            let position = Point2::new(radius * angle.cos(), radius * angle.sin());
            let free = occupied.iter().all(|other| {
                let d: Vector2<f32> = position - *other;
                d.x * d.x + d.y * d.y > min_dist2
            });
            if free {
                occupied.push(position);
                placements.push(Placement {
                    position,
                    scale: self.scale,
                    variant: rng.gen_range(0..self.variants.max(1)),
                });
            }
        }
        if placements.len() < self.count {
            warn!(
                "Only {} of {} props fit into the ring",
                placements.len(),
                self.count
            );
        }
        placements
    }
}

/// Flat unlit disc under the model viewer's stage.
pub fn base_disc(radius: f32, height: f32) -> ModelAsset {
    const STEP_DEGREES: usize = 5;
    let vertex = |x: f32, z: f32| Vertex {
        pos: [x, height, z],
        tex_coord: [0.0; 2],
        normal: [0.0; 3],
    };
    let rim = (0..=360)
        .step_by(STEP_DEGREES)
        .map(|deg| {
            let (sin, cos) = (deg as f32).to_radians().sin_cos();
            vertex(radius * cos, radius * sin)
        })
        .collect::<Vec<_>>();
    let mut vertices = Vec::with_capacity(rim.len() * 3);
    for pair in rim.windows(2) {
        vertices.extend_from_slice(&[vertex(0.0, 0.0), pair[0], pair[1]]);
    }

    let mut materials = HashMap::new();
    materials.insert("base".to_string(), Material::with_diffuse("base", BASE_COLOR));
    ModelAsset::from_parts(
        "base",
        materials,
        vec![DrawBuffer {
            material: Some("base".to_string()),
            vertices,
        }],
    )
}
