use crate::{
    car::{self, CarState, Input, Thrust},
    config::settings::{Car as CarParams, Game as GameParams},
    road::Corridor,
};

use cgmath::MetricSpace;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Driving,
    GameOver,
    GameWon,
}

/// Looping engine sound.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineSound {
    Idle,
    Acceleration,
    Brake,
}

/// Audio events produced by a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cue {
    /// Switch the engine loop.
    Engine(EngineSound),
    Horn,
    Crash,
}

/// Everything the player pressed during a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Controls {
    pub drive: Input,
    pub horn: bool,
    pub restart: bool,
}

pub struct Game {
    pub corridor: Corridor,
    pub car: CarState,
    pub status: Status,
    car_params: CarParams,
    params: GameParams,
    run_time: Option<f32>,
    best_time: Option<f32>,
    engine: EngineSound,
    horn_held: bool,
    crash_played: bool,
}

impl Game {
    pub fn new(corridor: Corridor, car_params: CarParams, params: GameParams) -> Self {
        let (min_times, max_times) = car_params.times_range;
        let times = car_params.times.max(min_times).min(max_times);
        let car = CarState::new(corridor.start(), times);
        Game {
            corridor,
            car,
            status: Status::Driving,
            car_params,
            params,
            run_time: None,
            best_time: None,
            engine: EngineSound::Idle,
            horn_held: false,
            crash_played: false,
        }
    }

    pub fn params(&self) -> &GameParams {
        &self.params
    }

    /// Seconds since the first movement of the current run.
    pub fn run_time(&self) -> Option<f32> {
        self.run_time
    }

    pub fn best_time(&self) -> Option<f32> {
        self.best_time
    }

    pub fn engine(&self) -> EngineSound {
        self.engine
    }

    pub fn step(&mut self, controls: &Controls, dt: f32) -> Vec<Cue> {
        profiling::scope!("Game::step");
        let mut cues = Vec::new();

        if self.status != Status::Driving {
            self.horn_held = false;
            if controls.restart {
                self.restart();
                self.set_engine(EngineSound::Idle, &mut cues);
            }
            return cues;
        }

        if self.run_time.is_none() && controls.drive.is_active() {
            self.run_time = Some(0.0);
        }
        let thrust = car::integrate(&mut self.car, &controls.drive, dt, &self.car_params);
        if let Some(ref mut time) = self.run_time {
            *time += dt.max(0.0).min(self.car_params.max_dt);
        }

        match self.check_status() {
            Status::Driving => {
                if controls.horn && !self.horn_held {
                    cues.push(Cue::Horn);
                }
                self.horn_held = controls.horn;
                let speed = self.car.speed;
                let sound = match thrust {
                    Thrust::Forward if speed > 0.0 => EngineSound::Acceleration,
                    Thrust::Backward if speed < 0.0 => EngineSound::Acceleration,
                    Thrust::Forward if speed < 0.0 => EngineSound::Brake,
                    Thrust::Backward if speed > 0.0 => EngineSound::Brake,
                    _ => EngineSound::Idle,
                };
                self.set_engine(sound, &mut cues);
            }
            Status::GameOver => {
                if !self.crash_played {
                    cues.push(Cue::Crash);
                    self.crash_played = true;
                }
            }
            Status::GameWon => {
                self.set_engine(EngineSound::Idle, &mut cues);
            }
        }
        cues
    }

    fn set_engine(&mut self, sound: EngineSound, cues: &mut Vec<Cue>) {
        if self.engine != sound {
            self.engine = sound;
            cues.push(Cue::Engine(sound));
        }
    }

    /// Checks the car against the finish and the road borders.
    pub fn check_status(&mut self) -> Status {
        if self.status != Status::Driving {
            return self.status;
        }
        let position = self.car.position;
        if position.distance(self.corridor.end()) < self.params.win_radius {
            let time = self.run_time.unwrap_or(0.0);
            info!("Finished the road in {:.2}s", time);
            self.best_time = Some(match self.best_time {
                Some(best) => best.min(time),
                None => time,
            });
            self.status = Status::GameWon;
        } else if !self.corridor.contains(position, self.params.road_tolerance) {
            info!("Drove off the road at {:?}", position);
            self.status = Status::GameOver;
        }
        self.status
    }

    /// Starts a new run from the beginning of the road, keeping the difficulty.
    pub fn restart(&mut self) {
        self.car.reset(self.corridor.start());
        self.status = Status::Driving;
        self.run_time = None;
        self.crash_played = false;
        self.horn_held = false;
    }

    pub fn hud(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Best Time: {:.2}s", self.best_time.unwrap_or(0.0)),
            format!("Speed: {}", (self.car.speed * 100.0) as i32),
            format!("Times: {:.1}", self.car.times),
        ];
        match self.status {
            Status::Driving => {
                if let Some(time) = self.run_time {
                    lines.push(format!("Time: {:.2}s", time));
                }
            }
            Status::GameOver => {
                lines.push("GAME OVER".to_string());
                lines.push("Press ENTER to Restart".to_string());
            }
            Status::GameWon => {
                lines.push(format!(
                    "YOU WIN! Time: {:.2}s",
                    self.run_time.unwrap_or(0.0)
                ));
                lines.push("Press ENTER to Restart".to_string());
            }
        }
        lines
    }
}

/// Which half of the program has the keyboard.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Screen {
    /// Turntable for picking the car's paint.
    Viewer,
    /// Driving with the chosen override texture.
    Driving { texture: usize },
}

impl Screen {
    /// Enter in the viewer starts a drive. Elsewhere it belongs to the game.
    pub fn select(self, texture: usize) -> Screen {
        match self {
            Screen::Viewer => Screen::Driving { texture },
            driving => driving,
        }
    }

    /// Escape goes from the drive back to the viewer. `None` means quit.
    pub fn back(self) -> Option<Screen> {
        match self {
            Screen::Viewer => None,
            Screen::Driving { .. } => Some(Screen::Viewer),
        }
    }
}

/// Light source circling the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Sun {
    /// Degrees around the vertical axis.
    pub angle: f32,
}

impl Sun {
    pub const DRIFT: f32 = 0.1;
    pub const TURN_RATE: f32 = 2.0;

    pub fn new() -> Self {
        Sun { angle: 0.0 }
    }

    /// Drifts a little each frame, `turn` is -1, 0 or 1.
    pub fn advance(&mut self, turn: f32, dt: f32) {
        self.angle += Self::DRIFT + turn * Self::TURN_RATE * dt * 60.0;
        self.angle %= 360.0;
    }

    pub fn position(&self, radius: f32, height: f32) -> [f32; 3] {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        [sin * radius, height, cos * radius]
    }
}

impl Default for Sun {
    fn default() -> Self {
        Self::new()
    }
}
