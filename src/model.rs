use bytemuck::{Pod, Zeroable};
use wavefront::{Library, Obj, ParseError};

use std::{
    collections::HashMap,
    fs::File,
    path::{Component, Path, PathBuf},
};

pub use wavefront::IndexTuple as VertexKey;

/// Alpha applied to translucent materials, such as car windows.
pub const TRANSLUCENT_ALPHA: f32 = 0.4;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TextureId(pub u32);

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaterialRole {
    Opaque,
    Translucent,
    TextureOverrideTarget,
}

impl MaterialRole {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("window") {
            MaterialRole::Translucent
        } else if name.eq_ignore_ascii_case("main") {
            MaterialRole::TextureOverrideTarget
        } else {
            MaterialRole::Opaque
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub diffuse: [f32; 3],
    pub role: MaterialRole,
    pub texture_path: Option<PathBuf>,
    pub texture: Option<TextureId>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Material {
            diffuse: [1.0; 3],
            role: MaterialRole::from_name(name),
            texture_path: None,
            texture: None,
        }
    }

    pub fn with_diffuse(name: &str, diffuse: [f32; 3]) -> Self {
        Material {
            diffuse,
            ..Material::new(name)
        }
    }
}

/// RGB8 image with rows stored bottom-up.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG decoding error: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("unsupported color type {0:?}")]
    Unsupported(png::ColorType),
}

pub fn load_image(path: &Path) -> Result<Image, TextureError> {
    let mut decoder = png::Decoder::new(File::open(path)?);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => return Err(TextureError::Unsupported(other)),
    };
    let row_size = info.width as usize * channels;
    let mut data = Vec::with_capacity(info.width as usize * info.height as usize * 3);
    for row in buf[..info.buffer_size()].chunks(info.line_size).rev() {
        for pixel in row[..row_size].chunks(channels) {
            if channels < 3 {
                data.extend_from_slice(&[pixel[0]; 3]);
            } else {
                data.extend_from_slice(&pixel[..3]);
            }
        }
    }

    Ok(Image {
        width: info.width,
        height: info.height,
        data,
    })
}

/// Decodes an image file and makes a texture out of it.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<TextureId, TextureError>;
}

fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match result.components().next_back() {
                Some(Component::Normal(_)) => {
                    result.pop();
                }
                _ => result.push(component),
            },
            _ => result.push(component),
        }
    }
    result
}

/// Texture handles by normalized path. Lives for the whole process.
#[derive(Debug, Default)]
pub struct TextureCache {
    handles: HashMap<PathBuf, TextureId>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn fetch<L: TextureLoader + ?Sized>(
        &mut self,
        path: &Path,
        loader: &mut L,
    ) -> Option<TextureId> {
        let key = normalize_path(path);
        if let Some(&id) = self.handles.get(&key) {
            return Some(id);
        }
        match loader.load_texture(&key) {
            Ok(id) => {
                debug!("Loaded texture {:?} as {:?}", key, id);
                self.handles.insert(key, id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to load texture {:?}: {}", key, e);
                None
            }
        }
    }
}

pub struct LoadContext<'a> {
    pub textures: &'a mut TextureCache,
    pub loader: &'a mut dyn TextureLoader,
    /// Replaces the diffuse map of the `TextureOverrideTarget` material.
    pub override_texture: Option<&'a Path>,
}

/// Turns a `map_Kd` argument into a relative path the way exported assets
/// are named on disk.
pub fn sanitize_texture_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.replace('\\', "/").replace(' ', "_"))
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Unable to load {path:?}: {source}")]
    Parse { path: PathBuf, source: ParseError },
    #[error("Invalid mesh: {0}")]
    Mesh(#[source] ParseError),
}

#[derive(Clone, Debug)]
pub struct DrawBuffer {
    pub material: Option<String>,
    pub vertices: Vec<Vertex>,
}

impl DrawBuffer {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub buffer: usize,
    pub vertex_count: usize,
    pub texture: Option<TextureId>,
    pub color: [f32; 4],
    pub blend: bool,
}

/// Receives the draw calls of a model, one per material.
pub trait Painter {
    fn draw(&mut self, call: DrawCall);
}

/// Gives every `usemtl` name without a library entry a white material,
/// with the role resolved from the name.
fn add_missing_materials(materials: &mut HashMap<String, Material>, buffers: &[DrawBuffer]) {
    for name in buffers.iter().filter_map(|buffer| buffer.material.as_ref()) {
        if !materials.contains_key(name) {
            debug!("Material '{}' is not in the library", name);
            materials.insert(name.clone(), Material::new(name));
        }
    }
}

pub struct ModelAsset {
    pub name: String,
    pub source: Obj,
    pub materials: HashMap<String, Material>,
    pub vertex_cache: HashMap<VertexKey, Vertex>,
    pub draw_buffers: Vec<DrawBuffer>,
}

impl ModelAsset {
    pub fn load(path: &Path, context: &mut LoadContext) -> Result<Self, LoadError> {
        info!("Loading model {:?}", path);
        let source = Obj::load(path).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut materials = HashMap::new();
        for lib_name in source.material_libs.iter() {
            let lib_path = dir.join(lib_name);
            match Library::load(&lib_path) {
                Ok(library) => {
                    let lib_dir = lib_path.parent().unwrap_or_else(|| Path::new(""));
                    Self::add_materials(library, lib_dir, context, &mut materials);
                }
                Err(e) => warn!("Unable to load material library {:?}: {}", lib_path, e),
            }
        }

        let name = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
        Self::from_obj(name, source, materials)
    }

    fn add_materials(
        library: Library,
        lib_dir: &Path,
        context: &mut LoadContext,
        materials: &mut HashMap<String, Material>,
    ) {
        for desc in library.materials {
            let mut material = Material::with_diffuse(&desc.name, desc.diffuse);
            if let Some(ref raw) = desc.diffuse_map {
                let relative = match context.override_texture {
                    Some(path) if material.role == MaterialRole::TextureOverrideTarget => {
                        path.to_path_buf()
                    }
                    _ => sanitize_texture_path(raw),
                };
                let path = lib_dir.join(relative);
                material.texture = context.textures.fetch(&path, &mut *context.loader);
                material.texture_path = Some(path);
            }
            materials.insert(desc.name, material);
        }
    }

    pub fn from_obj(
        name: String,
        source: Obj,
        mut materials: HashMap<String, Material>,
    ) -> Result<Self, LoadError> {
        source.validate().map_err(LoadError::Mesh)?;

        let mut vertex_cache = HashMap::new();
        let mut draw_buffers = Vec::<DrawBuffer>::new();
        let mut buffer_indices = HashMap::<Option<&str>, usize>::new();

        for face in source.faces.iter() {
            let buffer_index = *buffer_indices
                .entry(face.material.as_deref())
                .or_insert_with(|| {
                    draw_buffers.push(DrawBuffer {
                        material: face.material.clone(),
                        vertices: Vec::new(),
                    });
                    draw_buffers.len() - 1
                });
            for key in face.corners.iter() {
                let vertex = *vertex_cache
                    .entry(*key)
                    .or_insert_with(|| Self::flatten(&source, key));
                draw_buffers[buffer_index].vertices.push(vertex);
            }
        }

        add_missing_materials(&mut materials, &draw_buffers);
        debug!(
            "Model '{}': {} unique vertices in {} draw buffers",
            name,
            vertex_cache.len(),
            draw_buffers.len()
        );
        Ok(ModelAsset {
            name,
            source,
            materials,
            vertex_cache,
            draw_buffers,
        })
    }

    /// Builds an asset out of ready-made draw buffers.
    pub fn from_parts(
        name: &str,
        mut materials: HashMap<String, Material>,
        draw_buffers: Vec<DrawBuffer>,
    ) -> Self {
        add_missing_materials(&mut materials, &draw_buffers);
        ModelAsset {
            name: name.to_string(),
            source: Obj::default(),
            materials,
            vertex_cache: HashMap::new(),
            draw_buffers,
        }
    }

    fn flatten(source: &Obj, key: &VertexKey) -> Vertex {
        Vertex {
            pos: source.positions[key.vertex],
            tex_coord: key
                .texcoord
                .and_then(|index| source.texcoords.get(index).cloned())
                .unwrap_or([0.0; 2]),
            normal: key
                .normal
                .and_then(|index| source.normals.get(index).cloned())
                .unwrap_or([0.0; 3]),
        }
    }

    pub fn draw_buffer(&self, material: Option<&str>) -> Option<&DrawBuffer> {
        self.draw_buffers
            .iter()
            .find(|buffer| buffer.material.as_deref() == material)
    }

    pub fn render<P: Painter + ?Sized>(&self, painter: &mut P) {
        for (index, buffer) in self.draw_buffers.iter().enumerate() {
            let material = buffer
                .material
                .as_ref()
                .and_then(|name| self.materials.get(name));
            let (diffuse, role, texture) = match material {
                Some(mat) => (mat.diffuse, mat.role, mat.texture),
                None => ([1.0; 3], MaterialRole::Opaque, None),
            };
            let blend = role == MaterialRole::Translucent;
            let alpha = if blend { TRANSLUCENT_ALPHA } else { 1.0 };
            painter.draw(DrawCall {
                buffer: index,
                vertex_count: buffer.vertex_count(),
                texture,
                color: [diffuse[0], diffuse[1], diffuse[2], alpha],
                blend,
            });
        }
    }
}
