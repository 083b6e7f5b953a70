//! Drawing a composed scene.
//!
//! [`DrawSurface`] is the seam between the viewer's update logic and the GPU.
//! [`GpuSurface`] implements it with wgpu: the asset is uploaded once, then
//! every frame rewrites the camera, light and per-mesh instance buffers,
//! renders the key light's shadow map and draws opaque primitives before
//! blended ones into a multisampled target.

use std::iter;

use crate::{
    camera::CameraResources,
    composer::Scene,
    context::Context,
    data_structures::{
        bounds::Aabb,
        colour::Colour,
        instance::InstanceRaw,
        material::Material,
        model::{GpuMaterial, GpuMesh, material_layout, upload_geometry},
        scene_graph::SceneAsset,
        texture::Texture,
    },
    error::RenderError,
    pipelines::{
        basic::{Pipelines, mk_scene_pipelines},
        light::{LightResources, LightUniform},
        shadow::ShadowPass,
    },
};

/// Where a viewer draws to.
pub trait DrawSurface {
    /// Resize the drawable area to `width` x `height` physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Highest texture anisotropy this surface can sample with.
    fn max_anisotropy(&self) -> u16;

    /// Prepare GPU resources for a freshly composed asset.
    fn upload(&mut self, asset: &SceneAsset);

    /// Draw one frame.
    fn render(&mut self, scene: &Scene) -> Result<(), RenderError>;
}

/// wgpu-backed [`DrawSurface`].
#[derive(Debug)]
pub struct GpuSurface {
    ctx: Context,
    pipelines: Pipelines,
    camera: CameraResources,
    lights: LightResources,
    shadow_pass: ShadowPass,
    /// World bounds of the uploaded asset, the region the key light shadows.
    shadow_bounds: Option<Aabb>,
    material_layout: wgpu::BindGroupLayout,
    placeholder: Texture,
    meshes: Vec<GpuMesh>,
    is_surface_configured: bool,
}

impl GpuSurface {
    pub fn new(ctx: Context) -> Self {
        let camera = CameraResources::new(&ctx.device);
        let lights = LightResources::new(&ctx.device, LightUniform::default());
        let material_layout = material_layout(&ctx.device);
        let shadow_pass = ShadowPass::new(&ctx.device, &lights.buffer);
        let pipelines = mk_scene_pipelines(
            &ctx.device,
            &ctx.config,
            ctx.sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &lights.bind_group_layout,
        );
        let placeholder = Texture::create_placeholder(&ctx.device, &ctx.queue);
        Self {
            ctx,
            pipelines,
            camera,
            lights,
            shadow_pass,
            shadow_bounds: None,
            material_layout,
            placeholder,
            meshes: Vec::new(),
            is_surface_configured: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn write_instances(&self, asset: &SceneAsset) {
        let world = asset.world_matrices();
        for mesh in &self.meshes {
            if let Some(Some(matrix)) = world.get(mesh.node) {
                self.ctx.queue.write_buffer(
                    &mesh.instance_buffer,
                    0,
                    bytemuck::cast_slice(&[InstanceRaw::from_world(matrix, mesh.receive_shadow)]),
                );
            }
        }
    }
}

impl DrawSurface for GpuSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    fn max_anisotropy(&self) -> u16 {
        self.ctx.max_anisotropy
    }

    fn upload(&mut self, asset: &SceneAsset) {
        let device = &self.ctx.device;
        self.meshes = asset
            .mesh_ids()
            .into_iter()
            .filter_map(|id| {
                let node = asset.node(id)?;
                let mesh = node.as_mesh()?;
                let label = node
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("node{}", id));
                let materials = mesh
                    .materials
                    .iter()
                    .map(|material| match material {
                        Some(material) => GpuMaterial::new(
                            device,
                            &self.ctx.queue,
                            &self.material_layout,
                            material,
                            &self.placeholder,
                        ),
                        None => {
                            log::warn!("Uploading {} with an unresolved material slot", label);
                            GpuMaterial::new(
                                device,
                                &self.ctx.queue,
                                &self.material_layout,
                                &Material::flat(Colour::WHITE, 1.0, 0.0),
                                &self.placeholder,
                            )
                        }
                    })
                    .collect();
                let primitives = mesh
                    .primitives
                    .iter()
                    .filter(|primitive| !primitive.geometry.indices.is_empty())
                    .map(|primitive| upload_geometry(device, &label, &primitive.geometry, primitive.material))
                    .collect();
                Some(GpuMesh::new(device, id, mesh, primitives, materials))
            })
            .collect();
        self.shadow_bounds = asset.bounding_box();
        log::info!("Uploaded {} meshes", self.meshes.len());
    }

    fn render(&mut self, scene: &Scene) -> Result<(), RenderError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.camera.update(&self.ctx.queue, &scene.viewport);
        self.lights.update(
            &self.ctx.device,
            &self.ctx.queue,
            &scene.lights,
            self.shadow_bounds.as_ref(),
        );
        if let Some(asset) = scene.asset() {
            self.write_instances(asset);
        }

        let output = self.ctx.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
            e => RenderError::Surface(e.to_string()),
        })?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        if self.lights.uniform.casts_shadow() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.lights.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&self.shadow_pass.pipeline);
            shadow_pass.set_bind_group(0, &self.shadow_pass.bind_group, &[]);
            for mesh in &self.meshes {
                shadow_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                for primitive in mesh.shadow_casters() {
                    shadow_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                    shadow_pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    shadow_pass.draw_indexed(0..primitive.num_elements, 0, 0..1);
                }
            }
        }

        // with MSAA the multisampled target is resolved into the surface
        let (target, resolve_target) = match &self.ctx.msaa_view {
            Some(msaa_view) => (msaa_view, Some(&view)),
            None => (&view, None),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear_colour.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.lights.bind_group, &[]);

            // opaque first, blended on top of the finished depth buffer
            for blended in [false, true] {
                for mesh in &self.meshes {
                    render_pass.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
                    for primitive in &mesh.primitives {
                        let Some(material) = mesh.materials.get(primitive.material) else {
                            continue;
                        };
                        if material.transparent != blended {
                            continue;
                        }
                        render_pass.set_pipeline(self.pipelines.select(material.transparent, material.side));
                        render_pass.set_bind_group(0, &material.bind_group, &[]);
                        render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
                        render_pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..primitive.num_elements, 0, 0..1);
                    }
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
