use crate::{
    config::settings,
    model::{LoadContext, LoadError, ModelAsset, TextureCache},
    space::Camera,
};

use std::{
    fs::File,
    io::{Error as IoError, Read as _},
    path::{Path, PathBuf},
};

pub mod global;
pub mod object;

pub use self::object::{Batch, GpuModel, GpuTextureLoader};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct GraphicsContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub color_format: wgpu::TextureFormat,
    pub screen_size: wgpu::Extent3d,
}

pub struct ScreenTargets<'a> {
    pub extent: wgpu::Extent3d,
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

/// Reads `res/shader/<name>.wgsl`, replacing every `{key}` with its value.
pub fn make_shader_code(name: &str, substitutions: &[(&str, String)]) -> Result<String, IoError> {
    let path = PathBuf::from("res")
        .join("shader")
        .join(name)
        .with_extension("wgsl");
    if !path.is_file() {
        panic!("Shader not found: {:?}", path);
    }

    let mut code = String::new();
    File::open(&path)?.read_to_string(&mut code)?;
    for &(key, ref value) in substitutions {
        code = code.replace(&format!("{{{}}}", key), value);
    }
    Ok(code)
}

pub fn load_shader(
    name: &str,
    substitutions: &[(&str, String)],
    device: &wgpu::Device,
) -> Result<wgpu::ShaderModule, IoError> {
    profiling::scope!("load_shader");
    let code = make_shader_code(name, substitutions)?;
    log::debug!("shader '{}':\n{}", name, code);
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(code.into()),
    }))
}

pub struct Render {
    global: global::Context,
    object: object::Context,
    pub light_config: settings::Light,
    pub clear_color: wgpu::Color,
}

impl Render {
    pub fn new(gfx: &GraphicsContext, settings: &settings::Render) -> Self {
        let global = global::Context::new(&gfx.device, gfx.color_format);
        let object = object::Context::new(&gfx.device, &gfx.queue, &global, settings.max_draws);
        let [r, g, b, a] = settings.clear_color;
        Render {
            global,
            object,
            light_config: settings.light.clone(),
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
        }
    }

    pub fn reload(&mut self, device: &wgpu::Device) {
        info!("Reloading shaders");
        self.object.reload(device);
    }

    /// Texture loader that uploads into this renderer.
    pub fn texture_loader<'a>(&'a mut self, gfx: &'a GraphicsContext) -> GpuTextureLoader<'a> {
        GpuTextureLoader {
            device: &gfx.device,
            queue: &gfx.queue,
            store: &mut self.object.textures,
        }
    }

    pub fn texture_count(&self) -> usize {
        self.object.textures.len()
    }

    pub fn draw(
        &self,
        gfx: &GraphicsContext,
        targets: ScreenTargets,
        cam: &Camera,
        light_pos: [f32; 3],
        batch: &Batch,
    ) -> wgpu::CommandBuffer {
        profiling::scope!("draw");
        let constants = global::Constants::new(cam, &self.light_config, light_pos);
        gfx.queue.write_buffer(
            &self.global.uniform_buf,
            0,
            bytemuck::bytes_of(&constants),
        );
        let count = self.object.prepare(&gfx.queue, batch);

        let mut encoder = gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Draw") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: targets.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            pass.set_bind_group(0, &self.global.bind_group, &[]);
            self.object.draw(&mut pass, batch, count);
        }
        encoder.finish()
    }
}

/// A model together with its GPU buffers.
pub struct Object {
    pub asset: ModelAsset,
    pub gpu: GpuModel,
}

impl Object {
    pub fn new(device: &wgpu::Device, asset: ModelAsset) -> Self {
        Object {
            gpu: GpuModel::new(device, &asset),
            asset,
        }
    }

    pub fn load(
        path: &Path,
        override_texture: Option<&Path>,
        render: &mut Render,
        textures: &mut TextureCache,
        gfx: &GraphicsContext,
    ) -> Result<Self, LoadError> {
        let mut loader = render.texture_loader(gfx);
        let mut context = LoadContext {
            textures,
            loader: &mut loader,
            override_texture,
        };
        let asset = ModelAsset::load(path, &mut context)?;
        Ok(Self::new(&gfx.device, asset))
    }
}
