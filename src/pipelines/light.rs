use cgmath::{EuclideanSpace, Point3, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    bounds::Aabb,
    light::{DirectionalLight, LightSet},
    texture::Texture,
};

/// Depth offset applied before the shadow comparison, in light clip space.
const SHADOW_BIAS: f32 = 0.002;

/// The whole light rig packed for the shader.
///
/// Every field is a `vec4` (or a `mat4`) so the layout needs no extra padding.
/// Colours are linear and premultiplied by their intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    /// `w` is 1 when a hemisphere light is present.
    sky: [f32; 4],
    ground: [f32; 4],
    hemisphere_up: [f32; 4],
    /// Direction the light travels in, `w` unused.
    key_direction: [f32; 4],
    key_colour: [f32; 4],
    front_direction: [f32; 4],
    front_colour: [f32; 4],
    /// World to light clip space of the key light.
    shadow_view_proj: [[f32; 4]; 4],
    /// Shadows enabled, depth bias, texel size, unused.
    shadow: [f32; 4],
}

fn vec4(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

fn directional(light: &DirectionalLight) -> ([f32; 4], [f32; 4]) {
    (
        vec4(light.direction().into(), 0.0),
        vec4(light.colour.to_linear().scaled(light.intensity), 1.0),
    )
}

impl Default for LightUniform {
    fn default() -> Self {
        Self {
            ambient: [0.0; 4],
            sky: [0.0; 4],
            ground: [0.0; 4],
            hemisphere_up: [0.0, 1.0, 0.0, 0.0],
            key_direction: [0.0, -1.0, 0.0, 0.0],
            key_colour: [0.0; 4],
            front_direction: [0.0, -1.0, 0.0, 0.0],
            front_colour: [0.0; 4],
            shadow_view_proj: cgmath::Matrix4::identity().into(),
            shadow: [0.0; 4],
        }
    }
}

impl LightUniform {
    /// Pack `lights`. The key light shadows whatever lies in `shadow_bounds`,
    /// without bounds (or with a non-casting key light) shadows are off.
    pub fn new(lights: &LightSet, shadow_bounds: Option<&Aabb>) -> Self {
        let ambient = vec4(
            lights.ambient.colour.to_linear().scaled(lights.ambient.intensity),
            1.0,
        );
        let (sky, ground, hemisphere_up) = match &lights.hemisphere {
            Some(hemisphere) => (
                vec4(hemisphere.sky.to_linear().scaled(hemisphere.intensity), 1.0),
                vec4(hemisphere.ground.to_linear().scaled(hemisphere.intensity), 1.0),
                vec4(hemisphere.up().into(), 0.0),
            ),
            None => ([0.0; 4], [0.0; 4], [0.0, 1.0, 0.0, 0.0]),
        };
        let (key_direction, key_colour) = directional(&lights.key);
        let (front_direction, front_colour) = directional(&lights.front);

        let mut uniform = Self {
            ambient,
            sky,
            ground,
            hemisphere_up,
            key_direction,
            key_colour,
            front_direction,
            front_colour,
            ..Self::default()
        };
        if let Some(bounds) = shadow_bounds.filter(|_| lights.key.cast_shadow) {
            // a little slack for animated nodes leaving the fitted box
            let radius = 0.6 * bounds.diagonal();
            let center = Point3::from_vec(bounds.center());
            uniform.shadow_view_proj = lights.key.shadow_view_proj(center, radius).into();
            uniform.shadow = [1.0, SHADOW_BIAS, 1.0 / shadow_map_size(&lights.key) as f32, 0.0];
        }
        uniform
    }

    pub fn has_hemisphere(&self) -> bool {
        self.sky[3] > 0.0
    }

    pub fn casts_shadow(&self) -> bool {
        self.shadow[0] > 0.0
    }
}

/// Side length of the key light's shadow map; a single texel when it casts none.
pub fn shadow_map_size(light: &DirectionalLight) -> u32 {
    if light.cast_shadow {
        light.shadow_map_size.max(1)
    } else {
        1
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Depth rendered from the key light, sampled by the scene shader.
    pub shadow_map: Texture,
    shadow_map_size: u32,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let shadow_map = mk_shadow_map(device, 1);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &shadow_map);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            shadow_map,
            shadow_map_size: 1,
        }
    }

    /// Upload the rig if it changed since the last frame, and resize the
    /// shadow map when the key light asks for another resolution.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        lights: &LightSet,
        shadow_bounds: Option<&Aabb>,
    ) {
        let size = shadow_map_size(&lights.key).min(device.limits().max_texture_dimension_2d);
        if size != self.shadow_map_size {
            log::debug!("Shadow map resized to {}x{}", size, size);
            self.shadow_map = mk_shadow_map(device, size);
            self.shadow_map_size = size;
            self.bind_group = mk_bind_group(device, &self.bind_group_layout, &self.buffer, &self.shadow_map);
        }

        let uniform = LightUniform::new(lights, shadow_bounds);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

fn mk_shadow_map(device: &wgpu::Device, size: u32) -> Texture {
    Texture::create_depth_texture(device, [size, size], 1, "shadow_map")
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow_map: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}
