use crate::{config::settings::Car as CarParams, road::heading_direction};

use cgmath::{Point2, Vector2};

/// Held driving keys for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Input {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub faster: bool,
    pub slower: bool,
}

impl Input {
    pub fn is_active(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Thrust {
    Coasting,
    Forward,
    Backward,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    pub max_speed: f32,
    pub acceleration: f32,
    pub brake: f32,
    pub friction: f32,
}

impl Tuning {
    pub const BASE: Tuning = Tuning {
        max_speed: 0.5,
        acceleration: 0.1,
        brake: 0.05,
        friction: 0.02,
    };

    pub fn scaled(times: f32) -> Self {
        let base = Self::BASE;
        Tuning {
            max_speed: base.max_speed * times,
            acceleration: base.acceleration * times,
            brake: base.brake * times,
            friction: base.friction * times,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CarState {
    /// Ground coordinates `(x, z)`.
    pub position: Point2<f32>,
    /// Degrees, 0 is facing +Z, positive turns left.
    pub heading: f32,
    pub speed: f32,
    /// Difficulty multiplier.
    pub times: f32,
}

impl CarState {
    pub fn new(position: Point2<f32>, times: f32) -> Self {
        CarState {
            position,
            heading: 0.0,
            speed: 0.0,
            times,
        }
    }

    pub fn tuning(&self) -> Tuning {
        Tuning::scaled(self.times)
    }

    pub fn direction(&self) -> Vector2<f32> {
        heading_direction(self.heading)
    }

    /// Puts the car back at `position`, standing still and facing +Z.
    pub fn reset(&mut self, position: Point2<f32>) {
        self.position = position;
        self.heading = 0.0;
        self.speed = 0.0;
    }
}

/// Advances the car by one frame and reports what the engine is doing.
pub fn integrate(state: &mut CarState, input: &Input, dt: f32, params: &CarParams) -> Thrust {
    let dt = dt.max(0.0).min(params.max_dt);
    let rate = dt * params.frame_scale;
    let tuning = state.tuning();

    let thrust = if input.forward {
        Thrust::Forward
    } else if input.backward {
        Thrust::Backward
    } else {
        Thrust::Coasting
    };

    state.speed = match thrust {
        Thrust::Forward if state.speed < 0.0 => state.speed + tuning.brake * rate,
        Thrust::Forward => (state.speed + tuning.acceleration * rate).min(tuning.max_speed),
        Thrust::Backward if state.speed > 0.0 => state.speed - tuning.brake * rate,
        Thrust::Backward => (state.speed - tuning.acceleration * rate)
            .max(-tuning.max_speed * params.reverse_ratio),
        Thrust::Coasting if state.speed > 0.0 => (state.speed - tuning.friction * rate).max(0.0),
        Thrust::Coasting => (state.speed + tuning.friction * rate).min(0.0),
    };

    if input.faster {
        state.times += params.times_step * rate;
    }
    if input.slower {
        state.times -= params.times_step * rate;
    }
    state.times = state.times.max(params.times_range.0).min(params.times_range.1);

    if state.speed != 0.0 {
        let turn = dt
            * params.steering_rate
            * state.times
            * (state.speed / state.tuning().max_speed)
            * params.steering_factor;
        if input.left {
            state.heading += turn;
        }
        if input.right {
            state.heading -= turn;
        }
    }

    state.position += state.direction() * (state.speed * dt * params.movement_scale);
    thrust
}
