//! Loading of glTF assets.
//!
//! [`AssetLoader`] is the seam the viewer loads through. [`GltfLoader`] is the
//! production implementation: it fetches a `.glb` (or `.gltf` with external
//! buffers), resolves buffers and images, and builds a [`SceneAsset`] whose
//! node ids follow the document's node order.

use std::{pin::Pin, sync::Arc};

use futures::channel::mpsc;

use crate::{
    config::ViewerConfig,
    data_structures::{
        animation::AnimationClip,
        colour::Colour,
        instance::Instance,
        material::{
            ColourSpace, FilterMode, FlatSurface, Material, SamplerSettings, Side, Surface,
            TextureMap, TextureSlot, TexturedSurface,
        },
        scene_graph::{Geometry, Mesh, SceneAsset, SceneNode},
    },
    error::{DecoderKind, LoadError},
    resources::{
        decoders::{BASISU_EXTENSION, DRACO_EXTENSION, DecoderSet},
        texture::{decode_image, guess_mime_type, load_binary, resolve_relative},
    },
};

pub mod animation;
pub mod decoders;
#[cfg(all(feature = "ktx2", not(target_arch = "wasm32")))]
pub mod ktx2_transcoder;
pub mod texture;

/// Extensions the loader understands without a sub-decoder.
const NATIVE_EXTENSIONS: &[&str] = &[
    "KHR_materials_emissive_strength",
    "KHR_texture_transform",
    "KHR_mesh_quantization",
];

/// Result of a successful load.
#[derive(Clone, Debug, Default)]
pub struct LoadedAsset {
    pub scene: SceneAsset,
    pub clips: Vec<AnimationClip>,
}

/// Best-effort load progress reporting.
///
/// Fractions are clamped to `[0, 1]`. A dropped receiver is not an error.
#[derive(Clone, Debug, Default)]
pub struct Progress {
    sender: Option<mpsc::UnboundedSender<f32>>,
}

impl Progress {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<f32>) {
        let (sender, receiver) = mpsc::unbounded();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// Progress that nobody listens to.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn report(&self, fraction: f32) {
        if let Some(sender) = &self.sender {
            let _ = sender.unbounded_send(fraction.clamp(0.0, 1.0));
        }
    }
}

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<LoadedAsset, LoadError>> + 'a>>;

/// Anything that can produce a scene from a URI.
pub trait AssetLoader {
    fn load<'a>(&'a self, uri: &'a str, progress: Progress) -> LoadFuture<'a>;
}

/// Loads binary glTF through [`load_binary`].
#[derive(Clone, Debug)]
pub struct GltfLoader {
    asset_root: String,
    decoders: DecoderSet,
}

impl GltfLoader {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            asset_root: config.asset_root.clone(),
            decoders: DecoderSet::new(config.decoders.clone()),
        }
    }

    pub fn with_decoders(mut self, decoders: DecoderSet) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn decoders(&self) -> &DecoderSet {
        &self.decoders
    }

    /// Build an asset from the bytes of a glTF document that was fetched from `uri`.
    ///
    /// External buffers and images are still fetched relative to `uri`.
    pub async fn from_bytes(
        &self,
        uri: &str,
        bytes: &[u8],
        progress: &Progress,
    ) -> Result<LoadedAsset, LoadError> {
        let decode = |reason: String| LoadError::Decode {
            uri: uri.to_string(),
            reason,
        };
        if !looks_like_gltf(bytes) {
            return Err(LoadError::UnsupportedFormat(format!(
                "{} is neither binary nor JSON glTF",
                uri
            )));
        }
        let gltf::Gltf { document, mut blob } =
            gltf::Gltf::from_slice_without_validation(bytes).map_err(|e| decode(e.to_string()))?;
        validate_document(&document).map_err(decode)?;
        self.check_required_extensions(&document)?;

        let mut buffers = Vec::new();
        for buffer in document.buffers() {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .take()
                    .ok_or_else(|| decode("missing binary chunk".to_string()))?,
                gltf::buffer::Source::Uri(buffer_uri) => {
                    load_binary(&resolve_relative(uri, buffer_uri), &self.asset_root).await?
                }
            };
            if data.len() < buffer.length() {
                return Err(decode(format!(
                    "buffer {} holds {} bytes, {} declared",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                )));
            }
            buffers.push(data);
        }
        for view in document.views() {
            if view.offset() + view.length() > view.buffer().length() {
                return Err(decode(format!("buffer view {} is out of bounds", view.index())));
            }
        }
        progress.report(0.5);

        let images = self.load_images(uri, &document, &buffers).await;
        progress.report(0.75);

        let materials: Vec<Material> = document
            .materials()
            .map(|material| load_material(&material, &images))
            .collect();

        let mut scene = SceneAsset::new();
        for node in document.nodes() {
            let name = node.name().map(str::to_string);
            let scene_node = match node.mesh() {
                Some(mesh) => SceneNode::mesh(name, self.load_mesh(uri, &mesh, &buffers, &materials)?),
                None => SceneNode::group(name),
            };
            scene.add_node(scene_node.with_local(Instance::from(node.transform())));
        }
        for node in document.nodes() {
            for child in node.children() {
                scene.attach(node.index(), child.index());
            }
        }
        match document.default_scene().or_else(|| document.scenes().next()) {
            Some(root) => root.nodes().for_each(|node| scene.mark_root(node.index())),
            None => log::warn!("{} contains no scene", uri),
        }

        let clips = animation::load_clips(&document, &buffers);
        log::info!(
            "Loaded {}: {} nodes, {} materials, {} clips",
            uri,
            scene.len(),
            materials.len(),
            clips.len()
        );
        progress.report(1.0);
        Ok(LoadedAsset { scene, clips })
    }

    fn check_required_extensions(&self, document: &gltf::Document) -> Result<(), LoadError> {
        for extension in document.extensions_required() {
            match extension {
                DRACO_EXTENSION if self.decoders.geometry_decoder().is_none() => {
                    return Err(LoadError::MissingDecoder {
                        extension: extension.to_string(),
                        kind: DecoderKind::Geometry,
                    });
                }
                BASISU_EXTENSION if self.decoders.texture_transcoder().is_none() => {
                    return Err(LoadError::MissingDecoder {
                        extension: extension.to_string(),
                        kind: DecoderKind::Texture,
                    });
                }
                DRACO_EXTENSION | BASISU_EXTENSION => (),
                other if NATIVE_EXTENSIONS.contains(&other) => (),
                other => log::warn!("Required extension {} is not supported, loading anyway", other),
            }
        }
        Ok(())
    }

    /// Decode every image of the document once. Failures leave a `None` slot.
    async fn load_images(
        &self,
        uri: &str,
        document: &gltf::Document,
        buffers: &[Vec<u8>],
    ) -> Vec<Option<Arc<image::RgbaImage>>> {
        let transcoder = self.decoders.texture_transcoder();
        let mut images = Vec::new();
        for image in document.images() {
            let label = image
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}#image{}", uri, image.index()));
            let decoded = match image.source() {
                gltf::image::Source::View { view, mime_type } => {
                    let start = view.offset();
                    let bytes = buffers
                        .get(view.buffer().index())
                        .and_then(|buffer| buffer.get(start..start + view.length()));
                    match bytes {
                        Some(bytes) => decode_image(&label, bytes, Some(mime_type), transcoder),
                        None => {
                            log::warn!("Image {} points outside its buffer", label);
                            None
                        }
                    }
                }
                gltf::image::Source::Uri { uri: image_uri, mime_type } => {
                    match load_binary(&resolve_relative(uri, image_uri), &self.asset_root).await {
                        Ok(bytes) => decode_image(
                            &label,
                            &bytes,
                            guess_mime_type(image_uri, mime_type),
                            transcoder,
                        ),
                        Err(e) => {
                            log::warn!("Could not fetch image {}: {}", label, e);
                            None
                        }
                    }
                }
            };
            images.push(decoded.map(Arc::new));
        }
        images
    }

    fn load_mesh(
        &self,
        uri: &str,
        mesh: &gltf::Mesh,
        buffers: &[Vec<u8>],
        materials: &[Material],
    ) -> Result<Mesh, LoadError> {
        let mut parts = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {:?}: only triangles are drawn",
                    primitive.index(),
                    mesh.name()
                );
                continue;
            }
            let geometry = if is_draco_compressed(&primitive) {
                let decoder = self
                    .decoders
                    .geometry_decoder()
                    .ok_or_else(|| LoadError::MissingDecoder {
                        extension: DRACO_EXTENSION.to_string(),
                        kind: DecoderKind::Geometry,
                    })?;
                decoder
                    .decode(&primitive, buffers)
                    .map_err(|e| LoadError::Decode {
                        uri: uri.to_string(),
                        reason: e.to_string(),
                    })?
            } else {
                read_geometry(&primitive, buffers).ok_or_else(|| LoadError::Decode {
                    uri: uri.to_string(),
                    reason: format!(
                        "primitive {} of mesh {} has no readable POSITION attribute",
                        primitive.index(),
                        mesh.index()
                    ),
                })?
            };
            let material = primitive
                .material()
                .index()
                .and_then(|index| materials.get(index))
                .cloned();
            parts.push((geometry.complete(), material));
        }
        Ok(Mesh::new(mesh.name().map(str::to_string), parts))
    }
}

impl AssetLoader for GltfLoader {
    fn load<'a>(&'a self, uri: &'a str, progress: Progress) -> LoadFuture<'a> {
        Box::pin(async move {
            log::info!("Loading {}", uri);
            progress.report(0.0);
            let bytes = load_binary(uri, &self.asset_root).await?;
            progress.report(0.25);
            self.from_bytes(uri, &bytes, &progress).await
        })
    }
}

/// Run the index and schema checks the `gltf` accessors rely on.
///
/// Accessors without a buffer view are accepted, compressed primitives
/// declare their attributes that way. Unknown required extensions are left to
/// [`GltfLoader::check_required_extensions`].
fn validate_document(document: &gltf::Document) -> Result<(), String> {
    use gltf::json::validation::{Error, Validate};

    let root = document.as_json();
    // the POSITION hook of the validator indexes the accessor list directly
    for (m, mesh) in root.meshes.iter().enumerate() {
        for (p, primitive) in mesh.primitives.iter().enumerate() {
            if let Some(accessor) = primitive
                .attributes
                .values()
                .find(|accessor| accessor.value() >= root.accessors.len())
            {
                return Err(format!(
                    "meshes[{}].primitives[{}] references accessor {}, the document has {}",
                    m,
                    p,
                    accessor.value(),
                    root.accessors.len()
                ));
            }
        }
    }

    for (i, image) in root.images.iter().enumerate() {
        let embedded = image.buffer_view.is_some();
        if (embedded && image.mime_type.is_none()) || (!embedded && image.uri.is_none()) {
            return Err(format!("images[{}] has neither a typed buffer view nor a uri", i));
        }
    }

    let mut errors = Vec::new();
    root.validate(root, gltf::json::Path::new, &mut |path, error| {
        let path = path().to_string();
        let tolerated = error == Error::Unsupported
            || (error == Error::Missing && path.ends_with(".bufferView"));
        if !tolerated {
            errors.push(format!("{}: {}", path, error));
        }
    });
    if errors.is_empty() {
        Ok(())
    } else {
        Err(format!("invalid glTF: {}", errors.join(", ")))
    }
}

fn looks_like_gltf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"glTF")
        || bytes
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|&b| b == b'{')
}

/// Draco-compressed attributes have no buffer view of their own.
fn is_draco_compressed(primitive: &gltf::Primitive) -> bool {
    primitive
        .get(&gltf::Semantic::Positions)
        .is_some_and(|positions| positions.view().is_none())
}

/// `None` when the positions cannot be read, e.g. an accessor overruns its view.
fn read_geometry(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Option<Geometry> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
    Some(Geometry {
        positions: reader.read_positions()?.collect(),
        normals: reader
            .read_normals()
            .map(|normals| normals.collect())
            .unwrap_or_default(),
        tex_coords: reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().collect())
            .unwrap_or_default(),
        indices: reader
            .read_indices()
            .map(|indices| indices.into_u32().collect())
            .unwrap_or_default(),
    })
}

fn sampler_settings(sampler: &gltf::texture::Sampler) -> SamplerSettings {
    use gltf::texture::{MagFilter, MinFilter};
    let mag_filter = match sampler.mag_filter() {
        Some(MagFilter::Nearest) => FilterMode::Nearest,
        _ => FilterMode::Linear,
    };
    let (min_filter, mipmaps) = match sampler.min_filter() {
        Some(MinFilter::Nearest) => (FilterMode::Nearest, false),
        Some(MinFilter::Linear) | None => (FilterMode::Linear, false),
        Some(MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear) => {
            (FilterMode::Nearest, true)
        }
        Some(MinFilter::LinearMipmapNearest | MinFilter::LinearMipmapLinear) => {
            (FilterMode::Linear, true)
        }
    };
    SamplerSettings {
        mag_filter,
        min_filter,
        mipmaps,
        anisotropy: 1,
    }
}

fn texture_map(
    texture: gltf::Texture,
    slot: TextureSlot,
    images: &[Option<Arc<image::RgbaImage>>],
) -> TextureMap {
    let decoded = |index: &usize| images.get(*index).is_some_and(Option::is_some);
    let basisu = texture
        .extension_value(BASISU_EXTENSION)
        .and_then(|extension| extension.get("source"))
        .and_then(|source| source.as_u64())
        .and_then(|index| usize::try_from(index).ok());
    let plain = texture.source().map(|image| image.index());
    // a basisu texture may carry a plain fallback image; use whichever decoded
    let index = basisu.filter(decoded).or(plain.filter(decoded)).or(basisu).or(plain);
    let label = texture
        .source()
        .and_then(|image| image.name())
        .or(texture.name())
        .map(str::to_string)
        .unwrap_or_else(|| format!("texture{}", texture.index()));
    TextureMap {
        label,
        image: index.and_then(|index| images.get(index).cloned().flatten()),
        sampler: sampler_settings(&texture.sampler()),
        colour_space: slot.colour_space(),
    }
}

fn load_material(material: &gltf::Material, images: &[Option<Arc<image::RgbaImage>>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();
    let base_colour = Colour::new(r, g, b);
    let roughness = pbr.roughness_factor();
    let metalness = pbr.metallic_factor();

    let textured = TexturedSurface {
        albedo: pbr
            .base_color_texture()
            .map(|info| texture_map(info.texture(), TextureSlot::Albedo, images)),
        normal: material
            .normal_texture()
            .map(|info| texture_map(info.texture(), TextureSlot::Normal, images)),
        metallic_roughness: pbr
            .metallic_roughness_texture()
            .map(|info| texture_map(info.texture(), TextureSlot::MetallicRoughness, images)),
        occlusion: material
            .occlusion_texture()
            .map(|info| texture_map(info.texture(), TextureSlot::Occlusion, images)),
        emissive: material
            .emissive_texture()
            .map(|info| texture_map(info.texture(), TextureSlot::Emissive, images)),
        base_colour,
        roughness,
        metalness,
    };
    let has_maps = TextureSlot::ALL
        .iter()
        .any(|&slot| textured.map(slot).is_some());
    let surface = if has_maps {
        Surface::Textured(textured)
    } else {
        Surface::Flat(FlatSurface {
            colour: base_colour,
            roughness,
            metalness,
        })
    };

    let (transparent, alpha_test) = match material.alpha_mode() {
        gltf::material::AlphaMode::Blend => (true, 0.0),
        gltf::material::AlphaMode::Mask => (false, material.alpha_cutoff().unwrap_or(0.5)),
        gltf::material::AlphaMode::Opaque => (false, 0.0),
    };
    Material {
        name: material.name().map(str::to_string),
        surface,
        transparent,
        opacity: a,
        side: if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        },
        alpha_test,
    }
}
