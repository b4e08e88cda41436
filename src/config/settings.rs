use std::{
    fs::File,
    path::{Path, PathBuf},
};

#[derive(Copy, Clone, Debug, Deserialize)]
pub enum Backend {
    Auto,
    Metal,
    Vulkan,
    DX12,
    DX11,
    GL,
}

impl Backend {
    pub fn to_wgpu(&self) -> wgpu::Backends {
        match *self {
            Backend::Auto => wgpu::Backends::PRIMARY,
            Backend::Metal => wgpu::Backends::METAL,
            Backend::Vulkan => wgpu::Backends::VULKAN,
            Backend::DX12 => wgpu::Backends::DX12,
            Backend::DX11 => wgpu::Backends::DX11,
            Backend::GL => wgpu::Backends::GL,
        }
    }
}

#[derive(Deserialize)]
pub struct Window {
    pub title: String,
    pub size: [u32; 2],
    pub reload_on_focus: bool,
}

#[derive(Clone, Deserialize)]
pub struct Assets {
    pub car: String,
    pub tree: String,
    pub grass: Vec<String>,
    /// Override texture path with `{}` standing for the 1-based texture index.
    pub car_texture: String,
    pub car_texture_count: usize,
}

impl Assets {
    pub fn car_texture(&self, index: usize) -> String {
        self.car_texture.replace("{}", &index.to_string())
    }
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub enum HeadingMode {
    /// Each turn is added to the heading of the previous step.
    Cumulative,
    /// Each turn is measured from the +Z axis.
    Absolute,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Road {
    pub step_count: usize,
    pub step_length: f32,
    pub max_turn: f32,
    pub width: f32,
    pub heading: HeadingMode,
    pub seed: Option<u64>,
}

impl Default for Road {
    fn default() -> Self {
        Road {
            step_count: 99,
            step_length: 6.0,
            max_turn: 30.0,
            width: 4.0,
            heading: HeadingMode::Cumulative,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Car {
    /// Scales per-frame rates so that they feel the same as at 15 FPS.
    pub frame_scale: f32,
    pub max_dt: f32,
    pub steering_rate: f32,
    pub steering_factor: f32,
    pub movement_scale: f32,
    pub times: f32,
    pub times_range: (f32, f32),
    pub times_step: f32,
    pub reverse_ratio: f32,
}

impl Default for Car {
    fn default() -> Self {
        Car {
            frame_scale: 15.0,
            max_dt: 0.1,
            steering_rate: 60.0,
            steering_factor: 0.7,
            movement_scale: 30.0,
            times: 1.0,
            times_range: (0.5, 4.9),
            times_step: 0.1,
            reverse_ratio: 0.5,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Camera {
    pub offset: f32,
    pub height: f32,
    pub fov: f32,
    pub depth_range: (f32, f32),
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            offset: 10.0,
            height: 4.0,
            fov: 45.0,
            depth_range: (0.1, 200.0),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Scenery {
    pub trees_per_segment: (usize, usize),
    pub tree_distance: (f32, f32),
    pub tree_scale: f32,
}

impl Default for Scenery {
    fn default() -> Self {
        Scenery {
            trees_per_segment: (1, 3),
            tree_distance: (4.0, 12.0),
            tree_scale: 1.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Game {
    pub win_radius: f32,
    pub road_tolerance: f32,
    pub camera: Camera,
    pub scenery: Scenery,
}

impl Default for Game {
    fn default() -> Self {
        Game {
            win_radius: 1.5,
            road_tolerance: 2.0,
            camera: Camera::default(),
            scenery: Scenery::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Light {
    pub radius: f32,
    pub height: f32,
    pub ambient: [f32; 4],
    pub color: [f32; 4],
}

#[derive(Clone, Deserialize)]
pub struct Render {
    pub max_draws: usize,
    pub clear_color: [f32; 4],
    pub light: Light,
}

#[derive(Deserialize)]
pub struct Settings {
    pub data_path: PathBuf,
    pub backend: Backend,
    pub window: Window,
    pub assets: Assets,
    pub road: Road,
    pub car: Car,
    pub game: Game,
    pub render: Render,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Unable to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unable to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let file = File::open(path).map_err(|source| SettingsError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        ron::de::from_reader(file).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.data_path.join(path)
    }
}
