use crate::{
    model::{self, DrawCall, ModelAsset, Painter, TextureError, TextureId, TextureLoader},
    render::{global::Context as GlobalContext, DEPTH_FORMAT},
};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt as _;

use std::{mem, num::NonZeroU32, path::Path};

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Locals {
    transform: [[f32; 4]; 4],
    color: [f32; 4],
}
unsafe impl Pod for Locals {}
unsafe impl Zeroable for Locals {}

/// Vertex buffers of a model, one per draw buffer.
pub struct GpuModel {
    buffers: Vec<(wgpu::Buffer, u32)>,
}

impl GpuModel {
    pub fn new(device: &wgpu::Device, asset: &ModelAsset) -> Self {
        let buffers = asset
            .draw_buffers
            .iter()
            .map(|db| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&asset.name),
                    contents: bytemuck::cast_slice(&db.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                (buffer, db.vertices.len() as u32)
            })
            .collect();
        GpuModel { buffers }
    }
}

/// Bind groups of the uploaded textures, indexed by `TextureId`.
pub struct TextureStore {
    pub bind_group_layout: wgpu::BindGroupLayout,
    bind_groups: Vec<wgpu::BindGroup>,
    white: wgpu::BindGroup,
}

impl TextureStore {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });
        let white = Self::create_bind_group(
            device,
            queue,
            &bind_group_layout,
            "white",
            1,
            1,
            &[0xFF; 4],
        );
        TextureStore {
            bind_group_layout,
            bind_groups: Vec::new(),
            white,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> wgpu::BindGroup {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        queue.write_texture(
            texture.as_image_copy(),
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(width * 4),
                rows_per_image: None,
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        })
    }

    pub fn len(&self) -> usize {
        self.bind_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bind_groups.is_empty()
    }

    fn get(&self, texture: Option<TextureId>) -> &wgpu::BindGroup {
        texture
            .and_then(|TextureId(index)| self.bind_groups.get(index as usize))
            .unwrap_or(&self.white)
    }
}

/// Decodes images and uploads them into the texture store.
pub struct GpuTextureLoader<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub store: &'a mut TextureStore,
}

impl TextureLoader for GpuTextureLoader<'_> {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId, TextureError> {
        let image = model::load_image(path)?;
        let rgba = image
            .data
            .chunks(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 0xFF])
            .collect::<Vec<u8>>();
        let label = path.to_string_lossy();
        let bind_group = TextureStore::create_bind_group(
            self.device,
            self.queue,
            &self.store.bind_group_layout,
            &label,
            image.width,
            image.height,
            &rgba,
        );
        let id = TextureId(self.store.bind_groups.len() as u32);
        self.store.bind_groups.push(bind_group);
        Ok(id)
    }
}

struct Draw<'a> {
    buffer: &'a wgpu::Buffer,
    vertex_count: u32,
    texture: Option<TextureId>,
    blend: bool,
    locals: Locals,
}

/// Draw calls of a frame, in submission order.
#[derive(Default)]
pub struct Batch<'a> {
    draws: Vec<Draw<'a>>,
}

struct BatchPainter<'a, 'b> {
    batch: &'b mut Batch<'a>,
    model: &'a GpuModel,
    transform: [[f32; 4]; 4],
}

impl Painter for BatchPainter<'_, '_> {
    fn draw(&mut self, call: DrawCall) {
        let model = self.model;
        let (buffer, count) = match model.buffers.get(call.buffer) {
            Some(&(ref buffer, count)) => (buffer, count),
            None => {
                log::warn!("Draw buffer {} is not uploaded", call.buffer);
                return;
            }
        };
        self.batch.draws.push(Draw {
            buffer,
            vertex_count: count.min(call.vertex_count as u32),
            texture: call.texture,
            blend: call.blend,
            locals: Locals {
                transform: self.transform,
                color: call.color,
            },
        });
    }
}

impl<'a> Batch<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn add(
        &mut self,
        asset: &ModelAsset,
        model: &'a GpuModel,
        transform: cgmath::Matrix4<f32>,
    ) {
        let mut painter = BatchPainter {
            batch: self,
            model,
            transform: transform.into(),
        };
        asset.render(&mut painter);
    }
}

pub struct Context {
    pub pipeline_layout: wgpu::PipelineLayout,
    pub opaque: wgpu::RenderPipeline,
    pub blended: wgpu::RenderPipeline,
    pub textures: TextureStore,
    color_format: wgpu::TextureFormat,
    locals_buf: wgpu::Buffer,
    locals_bind_group: wgpu::BindGroup,
    locals_stride: wgpu::BufferAddress,
    max_draws: usize,
}

impl Context {
    fn create_pipeline(
        layout: &wgpu::PipelineLayout,
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        blend: bool,
    ) -> wgpu::RenderPipeline {
        let vertex_descriptor = wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<model::Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3],
        };
        let shader = super::load_shader("object", &[], device).unwrap();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(if blend { "object-blended" } else { "object" }),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "main_vs",
                buffers: &[vertex_descriptor],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "main_fs",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: if blend {
                        Some(wgpu::BlendState::ALPHA_BLENDING)
                    } else {
                        None
                    },
                    write_mask: wgpu::ColorWrites::all(),
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // exported meshes have mixed winding
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: !blend,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        global: &GlobalContext,
        max_draws: usize,
    ) -> Self {
        let locals_size = mem::size_of::<Locals>() as wgpu::BufferAddress;
        let alignment = device.limits().min_uniform_buffer_offset_alignment as wgpu::BufferAddress;
        let locals_stride = (locals_size + alignment - 1) / alignment * alignment;

        let locals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Locals"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(locals_size),
                },
                count: None,
            }],
        });
        let locals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Locals"),
            size: locals_stride * max_draws.max(1) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let locals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Locals"),
            layout: &locals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &locals_buf,
                    offset: 0,
                    size: wgpu::BufferSize::new(locals_size),
                }),
            }],
        });

        let textures = TextureStore::new(device, queue);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("object"),
            bind_group_layouts: &[
                &global.bind_group_layout,
                &locals_layout,
                &textures.bind_group_layout,
            ],
            push_constant_ranges: &[],
        });
        let opaque = Self::create_pipeline(&pipeline_layout, device, global.color_format, false);
        let blended = Self::create_pipeline(&pipeline_layout, device, global.color_format, true);

        Context {
            pipeline_layout,
            opaque,
            blended,
            textures,
            color_format: global.color_format,
            locals_buf,
            locals_bind_group,
            locals_stride,
            max_draws,
        }
    }

    pub fn reload(&mut self, device: &wgpu::Device) {
        self.opaque = Self::create_pipeline(&self.pipeline_layout, device, self.color_format, false);
        self.blended = Self::create_pipeline(&self.pipeline_layout, device, self.color_format, true);
    }

    /// Uploads per-draw constants, returns the number of draws that fit.
    pub fn prepare(&self, queue: &wgpu::Queue, batch: &Batch<'_>) -> usize {
        let count = if batch.draws.len() > self.max_draws {
            log::error!(
                "Too many draws: {} out of {} allowed",
                batch.draws.len(),
                self.max_draws
            );
            self.max_draws
        } else {
            batch.draws.len()
        };
        let stride = self.locals_stride as usize;
        let mut data = vec![0u8; count * stride];
        for (chunk, draw) in data.chunks_mut(stride).zip(batch.draws.iter()) {
            let bytes = bytemuck::bytes_of(&draw.locals);
            chunk[..bytes.len()].copy_from_slice(bytes);
        }
        if !data.is_empty() {
            queue.write_buffer(&self.locals_buf, 0, &data);
        }
        count
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, batch: &'a Batch<'a>, count: usize) {
        let mut blending = None;
        for (i, draw) in batch.draws.iter().take(count).enumerate() {
            if blending != Some(draw.blend) {
                pass.set_pipeline(if draw.blend {
                    &self.blended
                } else {
                    &self.opaque
                });
                blending = Some(draw.blend);
            }
            let offset = (i as wgpu::BufferAddress * self.locals_stride) as wgpu::DynamicOffset;
            pass.set_bind_group(1, &self.locals_bind_group, &[offset]);
            pass.set_bind_group(2, self.textures.get(draw.texture), &[]);
            pass.set_vertex_buffer(0, draw.buffer.slice(..));
            pass.draw(0..draw.vertex_count, 0..1);
        }
    }
}
