use roadtrip::{
    car::Input,
    config::{settings, Settings},
    game::{Controls, Cue, Game, Sun},
    model::TextureCache,
    render::{Batch, GraphicsContext, Object, Render, ScreenTargets},
    road::Corridor,
    scenery::{self, Placement},
    space::{Camera, Look},
};

use cgmath::{Deg, Matrix4};
use log::info;
use rand::{rngs::StdRng, SeedableRng as _};
use winit::event::{ElementState, KeyboardInput, VirtualKeyCode as Key};

use std::{collections::HashSet, path::PathBuf};

fn ground_transform(x: f32, z: f32, angle: Deg<f32>, scale: f32) -> Matrix4<f32> {
    Matrix4::from_translation(cgmath::vec3(x, 0.0, z))
        * Matrix4::from_angle_y(angle)
        * Matrix4::from_scale(scale)
}

/// One drive down a freshly generated road.
pub struct Drive {
    game: Game,
    camera: Camera,
    camera_config: settings::Camera,
    car: Object,
    road: Object,
    tree: Option<Object>,
    trees: Vec<Placement>,
    keys: HashSet<Key>,
    sun: Sun,
}

impl Drive {
    pub fn new(
        settings: &Settings,
        texture: usize,
        render: &mut Render,
        textures: &mut TextureCache,
        gfx: &GraphicsContext,
    ) -> Self {
        info!("Loading the car with texture {}", texture);
        let override_texture = PathBuf::from(settings.assets.car_texture(texture));
        let car = Object::load(
            &settings.resolve(&settings.assets.car),
            Some(&override_texture),
            render,
            textures,
            gfx,
        )
        .unwrap_or_else(|e| panic!("Unable to load the car: {}", e));
        let tree = match Object::load(
            &settings.resolve(&settings.assets.tree),
            None,
            render,
            textures,
            gfx,
        ) {
            Ok(tree) => Some(tree),
            Err(e) => {
                log::warn!("Road side will be empty: {}", e);
                None
            }
        };

        let mut rng = match settings.road.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!("Generating the road");
        let corridor = Corridor::generate(&settings.road, &mut rng)
            .unwrap_or_else(|e| panic!("Unable to generate the road: {}", e));
        let trees = scenery::roadside(&corridor, &settings.game.scenery, &mut rng);
        let road = Object::new(&gfx.device, corridor.surface_model());
        info!("{} textures loaded", render.texture_count());

        let aspect = gfx.screen_size.width as f32 / gfx.screen_size.height as f32;
        Drive {
            game: Game::new(corridor, settings.car.clone(), settings.game.clone()),
            camera: Camera::new(&settings.game.camera, aspect),
            camera_config: settings.game.camera.clone(),
            car,
            road,
            tree,
            trees,
            keys: HashSet::new(),
            sun: Sun::new(),
        }
    }

    fn is_held(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn look(&self) -> Look {
        if self.is_held(Key::W) {
            Look::Front
        } else if self.is_held(Key::A) {
            Look::Left
        } else if self.is_held(Key::D) {
            Look::Right
        } else {
            Look::Back
        }
    }

    pub fn on_key(&mut self, input: KeyboardInput) {
        match input {
            KeyboardInput {
                state: ElementState::Pressed,
                virtual_keycode: Some(key),
                ..
            } => {
                self.keys.insert(key);
            }
            KeyboardInput {
                state: ElementState::Released,
                virtual_keycode: Some(key),
                ..
            } => {
                self.keys.remove(&key);
            }
            _ => {}
        }
    }

    pub fn resize(&mut self, gfx: &GraphicsContext) {
        self.camera.proj.aspect = gfx.screen_size.width as f32 / gfx.screen_size.height as f32;
    }

    pub fn update(&mut self, delta: f32) {
        profiling::scope!("Update");
        let controls = Controls {
            drive: Input {
                forward: self.is_held(Key::Up),
                backward: self.is_held(Key::Down),
                left: self.is_held(Key::Left),
                right: self.is_held(Key::Right),
                faster: self.is_held(Key::R),
                slower: self.is_held(Key::F),
            },
            horn: self.is_held(Key::H),
            restart: self.is_held(Key::Return),
        };

        for cue in self.game.step(&controls, delta) {
            match cue {
                Cue::Engine(sound) => info!("Audio: engine loop {:?}", sound),
                Cue::Horn => info!("Audio: horn"),
                Cue::Crash => info!("Audio: crash"),
            }
        }

        let look = self.look();
        self.camera.follow(&self.game.car, look, &self.camera_config);

        let turn = self.is_held(Key::Q) as i32 - self.is_held(Key::E) as i32;
        self.sun.advance(turn as f32, delta);
    }

    pub fn title(&self) -> String {
        self.game.hud().join(" | ")
    }

    pub fn draw(
        &self,
        render: &Render,
        gfx: &GraphicsContext,
        targets: ScreenTargets,
    ) -> wgpu::CommandBuffer {
        let mut batch = Batch::new();
        batch.add(&self.road.asset, &self.road.gpu, Matrix4::from_scale(1.0));
        if let Some(ref tree) = self.tree {
            for placement in self.trees.iter() {
                let p = placement.position;
                let transform = ground_transform(p.x, p.y, Deg(0.0), placement.scale);
                batch.add(&tree.asset, &tree.gpu, transform);
            }
        }
        let car = &self.game.car;
        let transform = ground_transform(car.position.x, car.position.y, Deg(car.heading), 1.0);
        batch.add(&self.car.asset, &self.car.gpu, transform);

        let light = &render.light_config;
        let light_pos = self.sun.position(light.radius, light.height);
        render.draw(gfx, targets, &self.camera, light_pos, &batch)
    }
}
