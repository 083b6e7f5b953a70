//! Viewer configuration.
//!
//! Everything that differs between deployments of the viewer lives in
//! [`ViewerConfig`]. Two presets reproduce the deployed variants:
//! [`ViewerConfig::tree_animation`] and [`ViewerConfig::showcase_animation`].

use instant::Duration;

use crate::data_structures::colour::Colour;

pub const DEFAULT_CONTAINER_ID: &str = "three-animation-container";
pub const DRACO_DECODER_PATH: &str = "https://www.gstatic.com/draco/versioned/decoders/1.5.6/";
pub const KTX2_TRANSCODER_PATH: &str =
    "https://cdn.jsdelivr.net/npm/three@0.157.0/examples/jsm/libs/basis/";

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 10.0],
            target: [0.0, 0.0, 0.0],
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyLightConfig {
    pub intensity: f32,
    pub position: [f32; 3],
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HemisphereConfig {
    pub sky: Colour,
    pub ground: Colour,
    pub intensity: f32,
    pub position: [f32; 3],
}

impl Default for HemisphereConfig {
    fn default() -> Self {
        Self {
            sky: Colour::from_hsl(0.6, 1.0, 0.6),
            ground: Colour::from_hsl(0.095, 1.0, 0.75),
            intensity: 0.6,
            position: [0.0, 50.0, 0.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightingConfig {
    pub ambient_intensity: f32,
    pub key: KeyLightConfig,
    /// The front light sits on the camera and aims at the look-at point.
    pub front_intensity: f32,
    pub hemisphere: Option<HemisphereConfig>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 1.0,
            key: KeyLightConfig {
                intensity: 1.0,
                position: [5.0, 5.0, 5.0],
                cast_shadow: false,
                shadow_map_size: 1024,
            },
            front_intensity: 1.0,
            hemisphere: None,
        }
    }
}

/// Resource locations of the optional sub-decoders.
///
/// `None` disables support for that encoding.
#[derive(Clone, Debug, PartialEq)]
pub struct DecoderConfig {
    pub draco_decoder_path: Option<String>,
    pub ktx2_transcoder_path: Option<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            draco_decoder_path: Some(DRACO_DECODER_PATH.to_string()),
            ktx2_transcoder_path: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Id of the host element the viewer mounts into.
    pub container_id: String,
    pub asset_uri: String,
    /// Directory native builds resolve asset URIs against.
    pub asset_root: String,
    pub camera: CameraConfig,
    pub lighting: LightingConfig,
    /// Diagonal length of the asset's bounding box after normalization.
    pub target_size: f32,
    /// Rotation about the vertical axis applied to the asset, in degrees.
    pub facing_degrees: f32,
    pub clear_colour: Colour,
    pub max_pixel_ratio: f64,
    /// Resizes are applied once the size was stable for this long. `None` applies them on the next frame.
    pub resize_debounce: Option<Duration>,
    pub decoders: DecoderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            asset_uri: String::new(),
            asset_root: "assets".to_string(),
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            target_size: 5.0,
            facing_degrees: 180.0,
            clear_colour: Colour::from_hex(0xf6b31b),
            max_pixel_ratio: 2.0,
            resize_debounce: None,
            decoders: DecoderConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// The pine tree widget: large model, shifted look-at, debounced resizing.
    pub fn tree_animation() -> Self {
        Self {
            asset_uri: "/utils/tree-animation/stop_motion_pixel_art_pine.glb".to_string(),
            camera: CameraConfig {
                position: [0.0, 0.0, 9.0],
                target: [3.0, -1.0, 2.0],
                ..Default::default()
            },
            target_size: 20.0,
            resize_debounce: Some(Duration::from_millis(100)),
            ..Default::default()
        }
    }

    /// The showcase widget: centered camera, shadowed key light, sky light and KTX2 textures.
    pub fn showcase_animation() -> Self {
        Self {
            asset_uri: "/animation/three-animation/stop_motion_pixel_art_pine.glb".to_string(),
            camera: CameraConfig::default(),
            lighting: LightingConfig {
                key: KeyLightConfig {
                    intensity: 1.5,
                    position: [5.0, 10.0, 7.5],
                    cast_shadow: true,
                    shadow_map_size: 1024,
                },
                hemisphere: Some(HemisphereConfig::default()),
                ..Default::default()
            },
            target_size: 5.0,
            decoders: DecoderConfig {
                ktx2_transcoder_path: Some(KTX2_TRANSCODER_PATH.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_asset_uri(mut self, uri: impl Into<String>) -> Self {
        self.asset_uri = uri.into();
        self
    }

    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_target_size(mut self, size: f32) -> Self {
        self.target_size = size;
        self
    }

    pub fn with_resize_debounce(mut self, debounce: Option<Duration>) -> Self {
        self.resize_debounce = debounce;
        self
    }

    pub fn with_camera(mut self, position: [f32; 3], target: [f32; 3]) -> Self {
        self.camera.position = position;
        self.camera.target = target;
        self
    }

    pub fn with_hemisphere(mut self, hemisphere: Option<HemisphereConfig>) -> Self {
        self.lighting.hemisphere = hemisphere;
        self
    }

    pub fn with_decoders(mut self, decoders: DecoderConfig) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn ktx2_enabled(&self) -> bool {
        self.decoders.ktx2_transcoder_path.is_some()
    }

    pub fn draco_enabled(&self) -> bool {
        self.decoders.draco_decoder_path.is_some()
    }
}
