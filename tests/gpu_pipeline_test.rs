#![cfg(feature = "integration-tests")]

use flow_viewer::{
    camera::CameraResources,
    composer::build_lights,
    config::ViewerConfig,
    data_structures::{
        bounds::Aabb,
        colour::Colour,
        material::{Material, Side},
        model::{GpuMaterial, material_layout, upload_geometry},
        texture::Texture,
    },
    pipelines::{
        basic::mk_scene_pipelines,
        light::{LightResources, LightUniform},
        shadow::ShadowPass,
    },
};
use cgmath::Vector3;
use futures::executor::block_on;

use crate::common::test_utils::{triangle_geometry, working_material};

mod common;

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;
    block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("test device"),
        required_limits: wgpu::Limits::downlevel_defaults(),
        ..Default::default()
    }))
    .ok()
}

#[test]
fn scene_pipelines_accept_uploaded_materials_and_geometry() {
    let Some((device, queue)) = headless_device() else {
        log::warn!("no graphics adapter, skipping");
        return;
    };
    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        width: 64,
        height: 64,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Opaque,
        view_formats: vec![],
    };

    let material_layout = material_layout(&device);
    let camera = CameraResources::new(&device);
    let rig = build_lights(&ViewerConfig::showcase_animation());
    let bounds = Aabb::new(Vector3::new(-1.0, 0.0, -1.0), Vector3::new(1.0, 2.0, 1.0));
    let mut lights = LightResources::new(&device, LightUniform::new(&rig, Some(&bounds)));
    lights.update(&device, &queue, &rig, Some(&bounds));
    let _shadow_pass = ShadowPass::new(&device, &lights.buffer);
    let pipelines = mk_scene_pipelines(
        &device,
        &config,
        1,
        &material_layout,
        &camera.bind_group_layout,
        &lights.bind_group_layout,
    );
    // every renderable format supports 4x multisampling
    let _multisampled = mk_scene_pipelines(
        &device,
        &config,
        4,
        &material_layout,
        &camera.bind_group_layout,
        &lights.bind_group_layout,
    );
    let _msaa_depth = Texture::create_depth_texture(&device, [64, 64], 4, "msaa_depth");
    let placeholder = Texture::create_placeholder(&device, &queue);

    let textured = GpuMaterial::new(&device, &queue, &material_layout, &working_material("bark"), &placeholder);
    let mut glass = Material::flat(Colour::WHITE, 0.5, 0.0);
    glass.transparent = true;
    glass.side = Side::Double;
    let flat = GpuMaterial::new(&device, &queue, &material_layout, &glass, &placeholder);
    let primitive = upload_geometry(&device, "triangle", &triangle_geometry(), 0);

    assert!(!textured.transparent);
    assert!(flat.transparent);
    assert_eq!(flat.side, Side::Double);
    assert_eq!(primitive.num_elements, 3);
    let _ = pipelines.select(flat.transparent, flat.side);
    assert!(lights.uniform.has_hemisphere());
    assert!(lights.uniform.casts_shadow());
    assert_eq!(lights.shadow_map.texture.width(), rig.key.shadow_map_size.min(device.limits().max_texture_dimension_2d));
}
