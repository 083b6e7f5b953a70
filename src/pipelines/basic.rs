use crate::data_structures::{
    instance::InstanceRaw,
    material::Side,
    model::{ModelVertex, Vertex},
    texture::Texture,
};

/// The four material pipelines: one- or two-sided, opaque or blended.
#[derive(Debug)]
pub struct Pipelines {
    pub opaque: wgpu::RenderPipeline,
    pub opaque_double: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub transparent_double: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn select(&self, transparent: bool, side: Side) -> &wgpu::RenderPipeline {
        match (transparent, side) {
            (false, Side::Front) => &self.opaque,
            (false, Side::Double) => &self.opaque_double,
            (true, Side::Front) => &self.transparent,
            (true, Side::Double) => &self.transparent_double,
        }
    }
}

pub fn mk_scene_pipelines(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> Pipelines {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[
            material_bind_group_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });

    let pipeline = |label: &str, blend: wgpu::BlendState, cull_mode: Option<wgpu::Face>, depth_write: bool| {
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
        };
        mk_render_pipeline(
            device,
            label,
            &render_pipeline_layout,
            config.format,
            Some(blend),
            cull_mode,
            Some((Texture::DEPTH_FORMAT, depth_write)),
            sample_count,
            &[ModelVertex::desc(), InstanceRaw::desc()],
            shader,
        )
    };

    Pipelines {
        opaque: pipeline("Opaque Pipeline", wgpu::BlendState::REPLACE, Some(wgpu::Face::Back), true),
        opaque_double: pipeline("Opaque Double-Sided Pipeline", wgpu::BlendState::REPLACE, None, true),
        transparent: pipeline(
            "Transparent Pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            Some(wgpu::Face::Back),
            false,
        ),
        transparent_double: pipeline(
            "Transparent Double-Sided Pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            None,
            false,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    cull_mode: Option<wgpu::Face>,
    depth: Option<(wgpu::TextureFormat, bool)>,
    sample_count: u32,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // blended geometry is tested against, but does not write, depth
        depth_stencil: depth.map(|(format, depth_write_enabled)| wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
