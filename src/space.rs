use crate::{car::CarState, config::settings::Camera as CameraParams};

use cgmath::{Deg, EuclideanSpace, Matrix4, Point3, Vector3};

/// Maps OpenGL clip depth `[-1, 1]` to the `[0, 1]` range used by wgpu.
#[rustfmt::skip]
pub const DEPTH_CORRECTION: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Which side of the car the chase camera looks from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Look {
    Back,
    Front,
    Left,
    Right,
}

impl Default for Look {
    fn default() -> Self {
        Look::Back
    }
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub proj: cgmath::PerspectiveFov<f32>,
}

impl Camera {
    pub fn new(params: &CameraParams, aspect: f32) -> Self {
        Camera {
            eye: Point3::new(0.0, params.height, -params.offset),
            target: Point3::origin(),
            proj: cgmath::PerspectiveFov {
                fovy: Deg(params.fov).into(),
                aspect,
                near: params.depth_range.0,
                far: params.depth_range.1,
            },
        }
    }

    pub fn get_view_proj(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.eye, self.target, Vector3::unit_y());
        let proj: Matrix4<f32> = self.proj.into();
        DEPTH_CORRECTION * proj * view
    }

    /// Places the eye around the car according to the look direction.
    pub fn follow(&mut self, car: &CarState, look: Look, params: &CameraParams) {
        let (sin, cos) = car.heading.to_radians().sin_cos();
        let r = params.offset;
        let (dx, dz) = match look {
            Look::Back => (-sin * r, -cos * r),
            Look::Front => (sin * r, cos * r),
            Look::Left => (cos * r, -sin * r),
            Look::Right => (-cos * r, sin * r),
        };
        let p = car.position;
        self.eye = Point3::new(p.x + dx, params.height, p.y + dz);
        self.target = Point3::new(p.x, 0.0, p.y);
    }

    /// Spherical orbit around the origin, angles in degrees.
    pub fn orbit(&mut self, yaw: f32, pitch: f32, radius: f32) {
        let (sy, cy) = yaw.to_radians().sin_cos();
        let (sp, cp) = pitch.to_radians().sin_cos();
        self.target = Point3::origin();
        self.eye = Point3::new(-radius * cp * sy, radius * sp, radius * cp * cy);
    }
}
