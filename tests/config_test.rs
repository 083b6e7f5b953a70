use std::time::Duration;

use flow_viewer::{
    config::{DEFAULT_CONTAINER_ID, DRACO_DECODER_PATH, ViewerConfig},
    data_structures::colour::Colour,
    host::{CANVAS_STYLE, Container, resized_viewport, viewport_size},
};

const EPSILON: f32 = 1e-3;

fn close(a: Colour, b: Colour) -> bool {
    (a.r - b.r).abs() < EPSILON && (a.g - b.g).abs() < EPSILON && (a.b - b.b).abs() < EPSILON
}

#[test]
fn presets_differ_only_where_the_variants_do() {
    let tree = ViewerConfig::tree_animation();
    let showcase = ViewerConfig::showcase_animation();

    assert_eq!(tree.camera.position, [0.0, 0.0, 9.0]);
    assert_eq!(tree.camera.target, [3.0, -1.0, 2.0]);
    assert_eq!(tree.target_size, 20.0);
    assert_eq!(tree.resize_debounce, Some(Duration::from_millis(100)));
    assert!(tree.lighting.hemisphere.is_none());
    assert!(!tree.ktx2_enabled());
    assert_eq!(tree.lighting.key.intensity, 1.0);
    assert_eq!(tree.lighting.key.position, [5.0, 5.0, 5.0]);

    assert_eq!(showcase.camera.position, [0.0, 0.0, 10.0]);
    assert_eq!(showcase.camera.target, [0.0, 0.0, 0.0]);
    assert_eq!(showcase.target_size, 5.0);
    assert_eq!(showcase.resize_debounce, None);
    assert!(showcase.lighting.hemisphere.is_some());
    assert!(showcase.ktx2_enabled());
    assert!(showcase.lighting.key.cast_shadow);

    for config in [&tree, &showcase] {
        assert_eq!(config.container_id, DEFAULT_CONTAINER_ID);
        assert_eq!(config.clear_colour, Colour::from_hex(0xf6b31b));
        assert_eq!(config.lighting.ambient_intensity, 1.0);
        assert_eq!(config.lighting.front_intensity, 1.0);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.facing_degrees, 180.0);
        assert_eq!(config.camera.fovy_degrees, 75.0);
        assert_eq!(config.decoders.draco_decoder_path.as_deref(), Some(DRACO_DECODER_PATH));
        assert!(config.asset_uri.ends_with(".glb"));
    }
    assert_ne!(tree.asset_uri, showcase.asset_uri);
}

#[test]
fn builders_override_single_fields() {
    let config = ViewerConfig::default()
        .with_asset_uri("/a.glb")
        .with_container_id("viewer")
        .with_target_size(3.0)
        .with_camera([1.0, 2.0, 3.0], [0.0, 1.0, 0.0])
        .with_resize_debounce(Some(Duration::from_millis(50)));

    assert_eq!(config.asset_uri, "/a.glb");
    assert_eq!(config.container_id, "viewer");
    assert_eq!(config.target_size, 3.0);
    assert_eq!(config.camera.position, [1.0, 2.0, 3.0]);
    assert_eq!(config.camera.target, [0.0, 1.0, 0.0]);
    assert_eq!(config.camera.fovy_degrees, 75.0);
    assert_eq!(config.resize_debounce, Some(Duration::from_millis(50)));
}

#[test]
fn hex_colours() {
    let colour = Colour::from_hex(0xff8000);

    assert_eq!(colour.r, 1.0);
    assert!((colour.g - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(colour.b, 0.0);
    assert_eq!(Colour::from_hex(0xf6b31b).to_hex(), 0xf6b31b);
}

#[test]
fn hsl_colours() {
    assert!(close(Colour::from_hsl(0.0, 1.0, 0.5), Colour::new(1.0, 0.0, 0.0)));
    assert!(close(Colour::from_hsl(1.0 / 3.0, 1.0, 0.5), Colour::new(0.0, 1.0, 0.0)));
    assert!(close(Colour::from_hsl(0.5, 0.0, 0.25), Colour::new(0.25, 0.25, 0.25)));
    // hue wraps
    assert!(close(Colour::from_hsl(1.0, 1.0, 0.5), Colour::from_hsl(0.0, 1.0, 0.5)));
    // the sky colour of the hemisphere light, a light blue
    let sky = Colour::from_hsl(0.6, 1.0, 0.6);
    assert!(close(sky, Colour::new(0.2, 0.52, 1.0)));
}

#[test]
fn srgb_to_linear() {
    let linear = Colour::new(0.5, 0.0, 1.0).to_linear();

    assert!((linear.r - 0.214).abs() < EPSILON);
    assert_eq!(linear.g, 0.0);
    assert!((linear.b - 1.0).abs() < 1e-6);
}

#[test]
fn pixel_ratio_is_capped() {
    assert_eq!(viewport_size(400, 300, 3.0, 2.0), (800, 600));
    assert_eq!(viewport_size(400, 300, 1.5, 2.0), (600, 450));
    assert_eq!(viewport_size(400, 300, 0.0, 2.0), (400, 300));
    assert_eq!(Container::new(640, 360, 2.0).physical_size(2.0), (1280, 720));
}

#[test]
fn window_resizes_recap_the_pixel_ratio() {
    // 1000x600 physical on a 3x display is a 333x200 logical container
    assert_eq!(resized_viewport(1000, 600, 3.0, 2.0), (666, 400));
    assert_eq!(resized_viewport(800, 600, 1.0, 2.0), (800, 600));
    assert_eq!(resized_viewport(800, 600, f64::NAN, 2.0), (800, 600));
    assert_eq!(resized_viewport(0, 0, 2.0, 2.0), (0, 0));
}

#[test]
fn web_canvas_follows_its_container() {
    assert!(CANVAS_STYLE.contains("width:100%"));
    assert!(CANVAS_STYLE.contains("height:100%"));
}
