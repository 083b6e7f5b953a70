#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    io::Cursor,
};

use flow_viewer::{
    composer::Scene,
    data_structures::{
        animation::{AnimationClip, Channel, Interpolation, Keyframes},
        colour::Colour,
        material::{
            ColourSpace, Material, Side, Surface, TextureMap, TexturedSurface,
        },
        scene_graph::{Geometry, Mesh, NodeId, SceneAsset, SceneNode},
    },
    error::{DecodeError, LoadError, RenderError},
    host::{Container, Host},
    render::DrawSurface,
    resources::{AssetLoader, LoadFuture, LoadedAsset, Progress, decoders::{GeometryDecoder, TextureTranscoder}},
};

/// A draw surface that records what the viewer asked of it.
#[derive(Debug)]
pub struct FakeSurface {
    pub resizes: Vec<(u32, u32)>,
    pub uploads: usize,
    pub uploaded_meshes: usize,
    pub renders: usize,
    pub max_anisotropy: u16,
    /// Errors returned by the next renders, in order.
    pub failures: VecDeque<RenderError>,
    /// Diagonal of the asset bounds seen by the last render.
    pub last_diagonal: Option<f32>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            resizes: Vec::new(),
            uploads: 0,
            uploaded_meshes: 0,
            renders: 0,
            max_anisotropy: 8,
            failures: VecDeque::new(),
            last_diagonal: None,
        }
    }

    pub fn failing_with(failures: impl IntoIterator<Item = RenderError>) -> Self {
        Self {
            failures: failures.into_iter().collect(),
            ..Self::new()
        }
    }
}

impl Default for FakeSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for FakeSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn max_anisotropy(&self) -> u16 {
        self.max_anisotropy
    }

    fn upload(&mut self, asset: &SceneAsset) {
        self.uploads += 1;
        self.uploaded_meshes = asset.mesh_ids().len();
    }

    fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
        self.renders += 1;
        self.last_diagonal = scene
            .asset()
            .and_then(SceneAsset::bounding_box)
            .map(|bounds| bounds.diagonal());
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// A page with a fixed set of containers.
#[derive(Debug, Default)]
pub struct FakeHost {
    containers: HashMap<String, Container>,
}

impl FakeHost {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, id: &str, container: Container) -> Self {
        self.containers.insert(id.to_string(), container);
        self
    }
}

impl Host for FakeHost {
    fn container(&self, id: &str) -> Option<Container> {
        self.containers.get(id).copied()
    }
}

/// Hands out one prepared result, then fails.
pub struct FakeLoader {
    result: RefCell<Option<Result<LoadedAsset, LoadError>>>,
    pub requested: RefCell<Vec<String>>,
}

impl FakeLoader {
    pub fn ok(asset: LoadedAsset) -> Self {
        Self::with_result(Ok(asset))
    }

    pub fn failing(error: LoadError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<LoadedAsset, LoadError>) -> Self {
        Self {
            result: RefCell::new(Some(result)),
            requested: RefCell::new(Vec::new()),
        }
    }
}

impl AssetLoader for FakeLoader {
    fn load<'a>(&'a self, uri: &'a str, progress: Progress) -> LoadFuture<'a> {
        Box::pin(async move {
            self.requested.borrow_mut().push(uri.to_string());
            progress.report(1.0);
            self.result
                .borrow_mut()
                .take()
                .unwrap_or_else(|| {
                    Err(LoadError::Network {
                        uri: uri.to_string(),
                        reason: "already loaded".to_string(),
                    })
                })
        })
    }
}

/// Stands in for a Draco decoder: every primitive becomes the same triangle.
#[derive(Debug, Default)]
pub struct TriangleDecoder;

impl GeometryDecoder for TriangleDecoder {
    fn decode(&self, _: &gltf::Primitive, _: &[Vec<u8>]) -> Result<Geometry, DecodeError> {
        Ok(triangle_geometry())
    }
}

/// A decoder that rejects everything.
#[derive(Debug, Default)]
pub struct BrokenDecoder;

impl GeometryDecoder for BrokenDecoder {
    fn decode(&self, _: &gltf::Primitive, _: &[Vec<u8>]) -> Result<Geometry, DecodeError> {
        Err(DecodeError::new("corrupt draco stream"))
    }
}

/// Transcodes any KTX2 payload to the checker image.
#[derive(Debug, Default)]
pub struct CheckerTranscoder;

impl TextureTranscoder for CheckerTranscoder {
    fn transcode(&self, _: &[u8]) -> Result<image::RgbaImage, DecodeError> {
        Ok(checker_image())
    }
}

pub fn triangle_geometry() -> Geometry {
    Geometry {
        positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 3],
        tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        indices: vec![0, 1, 2],
    }
}

/// The eight corners of the box spanned by `min` and `max`.
pub fn box_geometry(min: [f32; 3], max: [f32; 3]) -> Geometry {
    let mut positions = Vec::new();
    for &x in &[min[0], max[0]] {
        for &y in &[min[1], max[1]] {
            for &z in &[min[2], max[2]] {
                positions.push([x, y, z]);
            }
        }
    }
    Geometry {
        positions,
        indices: vec![0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7],
        ..Default::default()
    }
    .complete()
}

pub fn checker_image() -> image::RgbaImage {
    image::RgbaImage::from_fn(2, 2, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
}

pub fn png_bytes(image: &image::RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("PNG encoding of a test image");
    bytes
}

pub fn textured_material(name: &str, image: Option<image::RgbaImage>) -> Material {
    Material {
        name: Some(name.to_string()),
        surface: Surface::Textured(TexturedSurface {
            albedo: Some(TextureMap::new(format!("{}_albedo", name), image, ColourSpace::Linear)),
            normal: Some(TextureMap::new(format!("{}_normal", name), None, ColourSpace::Srgb)),
            metallic_roughness: None,
            occlusion: None,
            emissive: None,
            base_colour: Colour::WHITE,
            roughness: 1.0,
            metalness: 0.0,
        }),
        transparent: false,
        opacity: 1.0,
        side: Side::Front,
        alpha_test: 0.0,
    }
}

pub fn working_material(name: &str) -> Material {
    textured_material(name, Some(checker_image()))
}

/// A textured material whose albedo could not be decoded.
pub fn broken_material(name: &str) -> Material {
    textured_material(name, None)
}

pub fn transparent(mut material: Material, opacity: f32) -> Material {
    material.transparent = true;
    material.opacity = opacity;
    material
}

/// A group root holding one mesh per entry of `meshes`; each mesh gets one
/// box primitive per material slot.
pub fn asset_with_meshes(meshes: Vec<Vec<Option<Material>>>) -> SceneAsset {
    let mut asset = SceneAsset::new();
    let root = asset.add_root(SceneNode::group(Some("root".to_string())));
    for (i, slots) in meshes.into_iter().enumerate() {
        let parts = slots
            .into_iter()
            .map(|material| (box_geometry([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]), material))
            .collect();
        asset.add_child(
            root,
            SceneNode::mesh(
                Some(format!("mesh{}", i)),
                Mesh::new(Some(format!("mesh{}", i)), parts),
            ),
        );
    }
    asset
}

/// A single mesh spanning `min`..`max`.
pub fn box_asset(min: [f32; 3], max: [f32; 3]) -> SceneAsset {
    let mut asset = SceneAsset::new();
    let root = asset.add_root(SceneNode::group(None));
    asset.add_child(
        root,
        SceneNode::mesh(
            Some("box".to_string()),
            Mesh::new(None, vec![(box_geometry(min, max), Some(working_material("box")))]),
        ),
    );
    asset
}

/// Moves `target` from the origin to `(2, 0, 0)` over one second.
pub fn slide_clip(target: NodeId) -> AnimationClip {
    AnimationClip::new(
        "slide",
        vec![Channel {
            target,
            interpolation: Interpolation::Linear,
            timestamps: vec![0.0, 1.0],
            keyframes: Keyframes::Translation(vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(2.0, 0.0, 0.0),
            ]),
        }],
    )
}

pub fn animated_asset() -> LoadedAsset {
    let scene = box_asset([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]);
    LoadedAsset {
        clips: vec![slide_clip(1)],
        scene,
    }
}

/// Assembles a binary glTF file in memory.
#[derive(Debug, Default)]
pub struct GlbBuilder {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
    images: Vec<String>,
    textures: Vec<String>,
    materials: Vec<String>,
    meshes: Vec<String>,
    nodes: Vec<String>,
    scene_nodes: Vec<usize>,
    animations: Vec<String>,
    extensions_required: Vec<String>,
}

impl GlbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            offset,
            bytes.len()
        ));
        self.views.len() - 1
    }

    fn accessor(&mut self, json: String) -> usize {
        self.accessors.push(json);
        self.accessors.len() - 1
    }

    pub fn positions(&mut self, positions: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = positions.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes);
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"VEC3","min":{:?},"max":{:?}}}"#,
            view,
            positions.len(),
            min,
            max
        ))
    }

    pub fn tex_coords(&mut self, coords: &[[f32; 2]]) -> usize {
        let bytes: Vec<u8> = coords.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes);
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"VEC2"}}"#,
            view,
            coords.len()
        ))
    }

    pub fn indices(&mut self, indices: &[u32]) -> usize {
        let bytes: Vec<u8> = indices.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes);
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5125,"count":{},"type":"SCALAR"}}"#,
            view,
            indices.len()
        ))
    }

    pub fn times(&mut self, times: &[f32]) -> usize {
        let bytes: Vec<u8> = times.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes);
        let min = times.iter().copied().fold(f32::MAX, f32::min);
        let max = times.iter().copied().fold(f32::MIN, f32::max);
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"SCALAR","min":[{:?}],"max":[{:?}]}}"#,
            view,
            times.len(),
            min,
            max
        ))
    }

    pub fn vec3s(&mut self, values: &[[f32; 3]]) -> usize {
        let bytes: Vec<u8> = values.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
        let view = self.view(&bytes);
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"VEC3"}}"#,
            view,
            values.len()
        ))
    }

    /// An accessor without a buffer view, as Draco-compressed primitives declare them.
    pub fn compressed_positions(&mut self, count: usize) -> usize {
        self.accessor(format!(
            r#"{{"componentType":5126,"count":{},"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,0.0]}}"#,
            count
        ))
    }

    /// An embedded image with its texture; returns the texture index.
    pub fn image(&mut self, bytes: &[u8], mime_type: &str) -> usize {
        let view = self.view(bytes);
        self.images.push(format!(
            r#"{{"bufferView":{},"mimeType":"{}"}}"#,
            view, mime_type
        ));
        self.textures
            .push(format!(r#"{{"source":{}}}"#, self.images.len() - 1));
        self.textures.len() - 1
    }

    /// A texture that names its image only through `KHR_texture_basisu`; returns the texture index.
    pub fn basisu_texture(&mut self, ktx2: &[u8]) -> usize {
        let view = self.view(ktx2);
        self.images
            .push(format!(r#"{{"bufferView":{},"mimeType":"image/ktx2"}}"#, view));
        self.textures.push(format!(
            r#"{{"extensions":{{"KHR_texture_basisu":{{"source":{}}}}}}}"#,
            self.images.len() - 1
        ));
        self.textures.len() - 1
    }

    /// Positions whose accessor claims `count` vertices but whose view holds one.
    pub fn truncated_positions(&mut self, count: usize) -> usize {
        let view = self.view(&[0; 12]);
        self.accessor(format!(
            r#"{{"bufferView":{},"componentType":5126,"count":{},"type":"VEC3","min":[0.0,0.0,0.0],"max":[1.0,1.0,1.0]}}"#,
            view, count
        ))
    }

    pub fn png_texture(&mut self, image: &image::RgbaImage) -> usize {
        self.image(&png_bytes(image), "image/png")
    }

    pub fn material(&mut self, json: &str) -> usize {
        self.materials.push(json.to_string());
        self.materials.len() - 1
    }

    pub fn textured_material(&mut self, name: &str, texture: usize) -> usize {
        self.material(&format!(
            r#"{{"name":"{}","pbrMetallicRoughness":{{"baseColorTexture":{{"index":{}}}}}}}"#,
            name, texture
        ))
    }

    pub fn flat_material(&mut self, name: &str, colour: [f32; 4]) -> usize {
        self.material(&format!(
            r#"{{"name":"{}","pbrMetallicRoughness":{{"baseColorFactor":{:?}}}}}"#,
            name, colour
        ))
    }

    /// A plain triangle primitive.
    pub fn triangle(&mut self, material: Option<usize>) -> String {
        let geometry = triangle_geometry();
        let position = self.positions(&geometry.positions);
        let tex_coord = self.tex_coords(&geometry.tex_coords);
        let indices = self.indices(&geometry.indices);
        let material = material
            .map(|m| format!(r#","material":{}"#, m))
            .unwrap_or_default();
        format!(
            r#"{{"attributes":{{"POSITION":{},"TEXCOORD_0":{}}},"indices":{}{}}}"#,
            position, tex_coord, indices, material
        )
    }

    /// A triangle whose geometry lives in a Draco stream.
    pub fn draco_triangle(&mut self) -> String {
        let stream = self.view(&[0xd7, 0xac, 0x00, 0x01]);
        let position = self.compressed_positions(3);
        format!(
            r#"{{"attributes":{{"POSITION":{}}},"extensions":{{"KHR_draco_mesh_compression":{{"bufferView":{},"attributes":{{"POSITION":0}}}}}}}}"#,
            position, stream
        )
    }

    pub fn mesh(&mut self, primitives: Vec<String>) -> usize {
        self.meshes
            .push(format!(r#"{{"primitives":[{}]}}"#, primitives.join(",")));
        self.meshes.len() - 1
    }

    pub fn node(&mut self, json: String) -> usize {
        self.nodes.push(json);
        self.nodes.len() - 1
    }

    pub fn mesh_node(&mut self, name: &str, mesh: usize) -> usize {
        self.node(format!(r#"{{"name":"{}","mesh":{}}}"#, name, mesh))
    }

    pub fn root(&mut self, node: usize) -> &mut Self {
        self.scene_nodes.push(node);
        self
    }

    /// Translate `node` from `from` to `to` over `[0, duration]`.
    pub fn translation_animation(&mut self, name: &str, node: usize, duration: f32, from: [f32; 3], to: [f32; 3]) {
        let input = self.times(&[0.0, duration]);
        let output = self.vec3s(&[from, to]);
        self.animations.push(format!(
            r#"{{"name":"{}","samplers":[{{"input":{},"output":{},"interpolation":"LINEAR"}}],"channels":[{{"sampler":0,"target":{{"node":{},"path":"translation"}}}}]}}"#,
            name, input, output, node
        ));
    }

    pub fn require_extension(&mut self, extension: &str) -> &mut Self {
        self.extensions_required.push(extension.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bin = self.bin.clone();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let list = |items: &[String]| format!("[{}]", items.join(","));
        let extensions = if self.extensions_required.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = self
                .extensions_required
                .iter()
                .map(|e| format!("\"{}\"", e))
                .collect();
            format!(
                r#","extensionsUsed":{0},"extensionsRequired":{0}"#,
                list(&names)
            )
        };
        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},"buffers":[{{"byteLength":{}}}],"bufferViews":{},"accessors":{},"images":{},"textures":{},"materials":{},"meshes":{},"nodes":{},"scene":0,"scenes":[{{"nodes":{:?}}}],"animations":{}{}}}"#,
            bin.len(),
            list(&self.views),
            list(&self.accessors),
            list(&self.images),
            list(&self.textures),
            list(&self.materials),
            list(&self.meshes),
            list(&self.nodes),
            self.scene_nodes,
            list(&self.animations),
            extensions
        )
        .into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }
}
