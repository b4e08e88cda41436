use crate::{boilerplate::Application, drive::Drive, viewer::Viewer};
use roadtrip::{
    config::Settings,
    game::Screen,
    model::TextureCache,
    render::{GraphicsContext, Render, ScreenTargets},
};

use log::info;
use winit::event::{
    ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode as Key,
};

/// The viewer and the game sharing one window, renderer and texture cache.
pub struct RoadApp {
    settings: Settings,
    render: Render,
    textures: TextureCache,
    screen: Screen,
    viewer: Viewer,
    drive: Option<Drive>,
    /// Screen to switch to on the next update.
    pending: Option<Screen>,
}

impl RoadApp {
    pub fn new(settings: Settings, gfx: &GraphicsContext, screen: Screen) -> Self {
        let mut render = Render::new(gfx, &settings.render);
        let mut textures = TextureCache::new();
        let texture = match screen {
            Screen::Driving { texture } => texture,
            Screen::Viewer => 1,
        };
        let viewer = Viewer::new(&settings, texture, &mut render, &mut textures, gfx);
        RoadApp {
            settings,
            render,
            textures,
            screen: Screen::Viewer,
            viewer,
            drive: None,
            pending: Some(screen),
        }
    }

    fn switch(&mut self, screen: Screen, gfx: &GraphicsContext) {
        info!("Switching to {:?}", screen);
        self.drive = match screen {
            Screen::Driving { texture } => Some(Drive::new(
                &self.settings,
                texture,
                &mut self.render,
                &mut self.textures,
                gfx,
            )),
            Screen::Viewer => None,
        };
        self.screen = screen;
    }
}

impl Application for RoadApp {
    fn on_key(&mut self, input: KeyboardInput) -> bool {
        if input.state == ElementState::Pressed {
            match input.virtual_keycode {
                Some(Key::Escape) => {
                    match self.screen.back() {
                        Some(screen) => self.pending = Some(screen),
                        None => return false,
                    }
                    return true;
                }
                Some(Key::Return) if self.screen == Screen::Viewer => {
                    let texture = self.viewer.texture_index();
                    self.pending = Some(self.screen.select(texture));
                    return true;
                }
                _ => {}
            }
        }
        match self.drive {
            Some(ref mut drive) => drive.on_key(input),
            None => self.viewer.on_key(input),
        }
        true
    }

    fn on_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        if self.drive.is_none() {
            self.viewer.on_mouse_wheel(delta);
        }
    }

    fn on_cursor_move(&mut self, position: (f64, f64)) {
        self.viewer.on_cursor_move(position);
    }

    fn on_mouse_button(&mut self, state: ElementState, button: MouseButton) {
        if self.drive.is_none() {
            self.viewer.on_mouse_button(state, button);
        }
    }

    fn resize(&mut self, gfx: &GraphicsContext) {
        self.viewer.resize(gfx);
        if let Some(ref mut drive) = self.drive {
            drive.resize(gfx);
        }
    }

    fn reload(&mut self, device: &wgpu::Device) {
        self.render.reload(device);
    }

    fn update(&mut self, gfx: &GraphicsContext, delta: f32) {
        if let Some(screen) = self.pending.take() {
            if screen != self.screen {
                self.switch(screen, gfx);
            }
        }
        match self.drive {
            Some(ref mut drive) => drive.update(delta),
            None => self
                .viewer
                .update(&mut self.render, &mut self.textures, gfx),
        }
    }

    fn title(&self) -> Option<String> {
        let status = match self.drive {
            Some(ref drive) => drive.title(),
            None => self.viewer.title(),
        };
        Some(format!("{} | {}", self.settings.window.title, status))
    }

    fn draw(&mut self, gfx: &GraphicsContext, targets: ScreenTargets) -> wgpu::CommandBuffer {
        match self.drive {
            Some(ref drive) => drive.draw(&self.render, gfx, targets),
            None => self.viewer.draw(&self.render, gfx, targets),
        }
    }
}
