use roadtrip::{
    config::{settings, Settings},
    model::TextureCache,
    render::{Batch, GraphicsContext, Object, Render, ScreenTargets},
    scenery::{self, Placement, Scatter},
    space::Camera,
};

use cgmath::Matrix4;
use log::info;
use rand::{rngs::StdRng, SeedableRng as _};
use winit::event::{
    ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode as Key,
};

use std::path::PathBuf;

const ZOOM_RANGE: (f32, f32) = (5.0, 50.0);
const ZOOM_STEP: f32 = 0.8;
const PITCH_LIMIT: f32 = 89.0;
const DRAG_SPEED: f32 = 0.3;
const LIGHT_STEP: f32 = 2.0;
const LIGHT_RADIUS: f32 = 100.0;
const LIGHT_HEIGHT: f32 = 100.0;
const BASE_RADIUS: f32 = 25.0;

/// Turntable with the car in the middle, for picking a paint job.
pub struct Viewer {
    path: PathBuf,
    assets: settings::Assets,
    car: Object,
    texture_index: usize,
    base: Object,
    tree: Option<Object>,
    grass: Vec<Object>,
    trees: Vec<Placement>,
    grass_tufts: Vec<Placement>,
    cam: Camera,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    light_angle: f32,
    drag: Option<(f64, f64)>,
    cursor: (f64, f64),
    /// Texture switch requested by the arrows, applied on the next update.
    pending: Option<bool>,
}

fn load_optional(
    path: PathBuf,
    render: &mut Render,
    textures: &mut TextureCache,
    gfx: &GraphicsContext,
) -> Option<Object> {
    match Object::load(&path, None, render, textures, gfx) {
        Ok(object) => Some(object),
        Err(e) => {
            log::warn!("Skipping scenery: {}", e);
            None
        }
    }
}

impl Viewer {
    pub fn new(
        settings: &Settings,
        texture_index: usize,
        render: &mut Render,
        textures: &mut TextureCache,
        gfx: &GraphicsContext,
    ) -> Self {
        let path = settings.resolve(&settings.assets.car);
        let override_texture = PathBuf::from(settings.assets.car_texture(texture_index));
        let car = Object::load(&path, Some(&override_texture), render, textures, gfx)
            .unwrap_or_else(|e| panic!("Unable to load {:?}: {}", path, e));

        let tree = load_optional(settings.resolve(&settings.assets.tree), render, textures, gfx);
        let grass = settings
            .assets
            .grass
            .iter()
            .filter_map(|name| load_optional(settings.resolve(name), render, textures, gfx))
            .collect::<Vec<_>>();

        let mut rng = match settings.road.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut occupied = Vec::new();
        let trees = Scatter::TREES.place(&mut occupied, &mut rng);
        let grass_tufts = Scatter {
            variants: grass.len(),
            ..Scatter::GRASS
        }
        .place(&mut occupied, &mut rng);

        let aspect = gfx.screen_size.width as f32 / gfx.screen_size.height as f32;
        let mut viewer = Viewer {
            path,
            assets: settings.assets.clone(),
            car,
            texture_index,
            base: Object::new(&gfx.device, scenery::base_disc(BASE_RADIUS, -0.01)),
            tree,
            grass,
            trees,
            grass_tufts,
            cam: Camera::new(&settings.game.camera, aspect),
            yaw: 0.0,
            pitch: 20.0,
            zoom: 12.0,
            light_angle: 0.0,
            drag: None,
            cursor: (0.0, 0.0),
            pending: None,
        };
        viewer.cam.orbit(viewer.yaw, viewer.pitch, viewer.zoom);
        viewer
    }

    pub fn texture_index(&self) -> usize {
        self.texture_index
    }

    fn select_texture(
        &mut self,
        index: usize,
        render: &mut Render,
        textures: &mut TextureCache,
        gfx: &GraphicsContext,
    ) {
        let override_texture = PathBuf::from(self.assets.car_texture(index));
        match Object::load(&self.path, Some(&override_texture), render, textures, gfx) {
            Ok(car) => {
                info!("Showing texture {}", index);
                self.car = car;
                self.texture_index = index;
            }
            Err(e) => log::error!("Unable to reload the car: {}", e),
        }
    }

    fn next_texture(&self, forward: bool) -> usize {
        let count = self.assets.car_texture_count.max(1);
        if forward {
            self.texture_index % count + 1
        } else if self.texture_index <= 1 {
            count
        } else {
            self.texture_index - 1
        }
    }

    pub fn on_key(&mut self, input: KeyboardInput) {
        if input.state != ElementState::Pressed {
            return;
        }
        match input.virtual_keycode {
            Some(Key::Left) => self.pending = Some(false),
            Some(Key::Right) => self.pending = Some(true),
            Some(Key::Q) => self.light_angle = (self.light_angle + LIGHT_STEP) % 360.0,
            Some(Key::E) => self.light_angle = (self.light_angle - LIGHT_STEP) % 360.0,
            _ => {}
        }
    }

    pub fn on_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
        };
        self.zoom = (self.zoom - lines * ZOOM_STEP).max(ZOOM_RANGE.0).min(ZOOM_RANGE.1);
    }

    pub fn on_cursor_move(&mut self, position: (f64, f64)) {
        self.cursor = position;
        if let Some(last) = self.drag {
            let dx = (position.0 - last.0) as f32;
            let dy = (position.1 - last.1) as f32;
            self.yaw += dx * DRAG_SPEED;
            self.pitch = (self.pitch + dy * DRAG_SPEED)
                .max(-PITCH_LIMIT)
                .min(PITCH_LIMIT);
            self.drag = Some(position);
        }
    }

    pub fn on_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        if button == MouseButton::Left {
            self.drag = match state {
                ElementState::Pressed => Some(self.cursor),
                ElementState::Released => None,
            };
        }
    }

    pub fn resize(&mut self, gfx: &GraphicsContext) {
        self.cam.proj.aspect = gfx.screen_size.width as f32 / gfx.screen_size.height as f32;
    }

    pub fn update(&mut self, render: &mut Render, textures: &mut TextureCache, gfx: &GraphicsContext) {
        if let Some(forward) = self.pending.take() {
            let index = self.next_texture(forward);
            self.select_texture(index, render, textures, gfx);
        }
        self.cam.orbit(self.yaw, self.pitch, self.zoom);
    }

    pub fn title(&self) -> String {
        format!(
            "Texture {} of {} | Left/Right to repaint, Enter to drive, Escape to quit",
            self.texture_index, self.assets.car_texture_count
        )
    }

    pub fn draw(
        &self,
        render: &Render,
        gfx: &GraphicsContext,
        targets: ScreenTargets,
    ) -> wgpu::CommandBuffer {
        let place = |p: &Placement| {
            Matrix4::from_translation(cgmath::vec3(p.position.x, -0.01, p.position.y))
                * Matrix4::from_scale(p.scale)
        };

        let mut batch = Batch::new();
        // the base hides everything below it
        if self.pitch >= 0.0 {
            batch.add(&self.base.asset, &self.base.gpu, Matrix4::from_scale(1.0));
        }
        batch.add(&self.car.asset, &self.car.gpu, Matrix4::from_scale(1.0));
        if let Some(ref tree) = self.tree {
            for p in self.trees.iter() {
                batch.add(&tree.asset, &tree.gpu, place(p));
            }
        }
        for p in self.grass_tufts.iter() {
            if let Some(grass) = self.grass.get(p.variant) {
                batch.add(&grass.asset, &grass.gpu, place(p));
            }
        }

        let (sin, cos) = self.light_angle.to_radians().sin_cos();
        let light_pos = [sin * LIGHT_RADIUS, LIGHT_HEIGHT, cos * LIGHT_RADIUS];
        render.draw(gfx, targets, &self.cam, light_pos, &batch)
    }
}
