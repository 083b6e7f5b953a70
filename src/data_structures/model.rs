//! GPU-side representation of an uploaded asset.
//!
//! Geometry is uploaded once after composition. Only the per-mesh instance
//! buffers are rewritten per frame, as animation moves the nodes.

use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::InstanceRaw,
    material::{Material, Side, Surface},
    scene_graph::{Geometry, Mesh, NodeId},
    texture::Texture,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Interleave the attributes of a completed geometry.
pub fn interleave(geometry: &Geometry) -> Vec<ModelVertex> {
    geometry
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| ModelVertex {
            position,
            tex_coords: geometry.tex_coords.get(i).copied().unwrap_or_default(),
            normal: geometry.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect()
}

/// Scalar material parameters, bound next to the albedo texture.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Linear RGB and opacity.
    base_colour: [f32; 4],
    /// Roughness, metalness, alpha-test threshold, unused.
    params: [f32; 4],
}

impl MaterialUniform {
    pub fn new(material: &Material) -> Self {
        let (colour, roughness, metalness) = match &material.surface {
            Surface::Textured(textured) => {
                (textured.base_colour, textured.roughness, textured.metalness)
            }
            Surface::Flat(flat) => (flat.colour.to_linear(), flat.roughness, flat.metalness),
        };
        let [r, g, b] = colour.to_array();
        Self {
            base_colour: [r, g, b, material.opacity],
            params: [roughness, metalness, material.alpha_test, 0.0],
        }
    }
}

pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

#[derive(Debug)]
pub struct GpuMaterial {
    pub bind_group: wgpu::BindGroup,
    pub transparent: bool,
    pub side: Side,
    #[allow(unused)]
    albedo: Option<Texture>,
    #[allow(unused)]
    buffer: wgpu::Buffer,
}

impl GpuMaterial {
    /// Upload `material`. Flat materials and missing albedo images bind `placeholder`.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        material: &Material,
        placeholder: &Texture,
    ) -> Self {
        let albedo = material
            .textured()
            .and_then(|textured| textured.albedo.as_ref())
            .and_then(|map| Texture::from_map(device, queue, map));
        let texture = albedo.as_ref().unwrap_or(placeholder);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Buffer"),
            contents: bytemuck::cast_slice(&[MaterialUniform::new(material)]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: material.name.as_deref(),
        });
        Self {
            bind_group,
            transparent: material.transparent,
            side: material.side,
            albedo,
            buffer,
        }
    }
}

#[derive(Debug)]
pub struct GpuPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    /// Index into [`GpuMesh::materials`].
    pub material: usize,
}

#[derive(Debug)]
pub struct GpuMesh {
    pub node: NodeId,
    pub instance_buffer: wgpu::Buffer,
    pub primitives: Vec<GpuPrimitive>,
    pub materials: Vec<GpuMaterial>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        node: NodeId,
        mesh: &Mesh,
        primitives: Vec<GpuPrimitive>,
        materials: Vec<GpuMaterial>,
    ) -> Self {
        let instance = InstanceRaw::from_world(&cgmath::Matrix4::identity(), mesh.receive_shadow);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Node {} Instance Buffer", node)),
            contents: bytemuck::cast_slice(&[instance]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            node,
            instance_buffer,
            primitives,
            materials,
            cast_shadow: mesh.cast_shadow,
            receive_shadow: mesh.receive_shadow,
        }
    }

    /// Opaque primitives of a shadow casting mesh; blended ones never cast.
    pub fn shadow_casters(&self) -> impl Iterator<Item = &GpuPrimitive> {
        self.primitives.iter().filter(move |primitive| {
            self.cast_shadow
                && self
                    .materials
                    .get(primitive.material)
                    .is_some_and(|material| !material.transparent)
        })
    }
}

pub fn upload_geometry(device: &wgpu::Device, label: &str, geometry: &Geometry, material: usize) -> GpuPrimitive {
    let vertices = interleave(geometry);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Vertex Buffer", label)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Index Buffer", label)),
        contents: bytemuck::cast_slice(&geometry.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuPrimitive {
        vertex_buffer,
        index_buffer,
        num_elements: geometry.indices.len() as u32,
        material,
    }
}
