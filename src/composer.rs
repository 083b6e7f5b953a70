//! Scene composition: camera, lights and the fitted asset.

use cgmath::{Deg, Rotation3, Vector3};

use crate::{
    camera::Viewport,
    config::ViewerConfig,
    data_structures::{
        bounds::Aabb,
        colour::Colour,
        instance::Instance,
        light::{AmbientLight, DirectionalLight, HemisphereLight, LightSet},
        scene_graph::SceneAsset,
    },
};

/// How an asset was fitted into the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit {
    /// Bounds of the asset before fitting, `None` without geometry.
    pub original_bounds: Option<Aabb>,
    pub scale: f32,
}

/// Everything that is drawn: viewport, light rig and at most one asset.
#[derive(Clone, Debug)]
pub struct Scene {
    pub viewport: Viewport,
    pub lights: LightSet,
    pub clear_colour: Colour,
    asset: Option<SceneAsset>,
}

impl Scene {
    /// Build camera and lights for a `width` x `height` surface. The scene starts empty.
    pub fn new(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(&config.camera, width, height),
            lights: build_lights(config),
            clear_colour: config.clear_colour,
            asset: None,
        }
    }

    /// Fit `asset` to `target_size` and take ownership of it.
    ///
    /// A scene holds one asset for its whole life; a second insert is refused
    /// and returns `None`.
    pub fn insert(&mut self, mut asset: SceneAsset, target_size: f32, facing: Deg<f32>) -> Option<Fit> {
        if self.asset.is_some() {
            log::warn!("Scene already holds an asset, ignoring the new one");
            return None;
        }
        let fit = fit_asset(&mut asset, target_size, facing);
        self.asset = Some(asset);
        Some(fit)
    }

    pub fn asset(&self) -> Option<&SceneAsset> {
        self.asset.as_ref()
    }

    pub fn asset_mut(&mut self) -> Option<&mut SceneAsset> {
        self.asset.as_mut()
    }
}

pub fn build_lights(config: &ViewerConfig) -> LightSet {
    let lighting = &config.lighting;
    let key = DirectionalLight {
        colour: Colour::WHITE,
        intensity: lighting.key.intensity,
        position: lighting.key.position.into(),
        target: cgmath::Point3::new(0.0, 0.0, 0.0),
        cast_shadow: lighting.key.cast_shadow,
        shadow_map_size: lighting.key.shadow_map_size,
    };
    let front = DirectionalLight {
        colour: Colour::WHITE,
        intensity: lighting.front_intensity,
        position: config.camera.position.into(),
        target: config.camera.target.into(),
        cast_shadow: false,
        shadow_map_size: 0,
    };
    let hemisphere = lighting.hemisphere.as_ref().map(|hemisphere| HemisphereLight {
        sky: hemisphere.sky,
        ground: hemisphere.ground,
        intensity: hemisphere.intensity,
        position: hemisphere.position.into(),
    });
    LightSet {
        ambient: AmbientLight {
            colour: Colour::WHITE,
            intensity: lighting.ambient_intensity,
        },
        key,
        front,
        hemisphere,
    }
}

/// Set the root transform of `asset` so that its bounding box is centred on
/// the origin, turned by `facing` about +Y and has a diagonal of `target_size`.
pub fn fit_asset(asset: &mut SceneAsset, target_size: f32, facing: Deg<f32>) -> Fit {
    asset.root_transform = Instance::new();
    let rotation = cgmath::Quaternion::from_angle_y(facing);
    let Some(bounds) = asset.bounding_box() else {
        log::warn!("Asset has no geometry, only its orientation is corrected");
        asset.root_transform.rotation = rotation;
        return Fit {
            original_bounds: None,
            scale: 1.0,
        };
    };

    let diagonal = bounds.diagonal();
    let scale = if diagonal > f32::EPSILON && diagonal.is_finite() {
        target_size / diagonal
    } else {
        log::warn!("Asset has a degenerate bounding box (diagonal {}), keeping its scale", diagonal);
        1.0
    };
    let center: Vector3<f32> = bounds.center();
    asset.root_transform = Instance {
        position: -(rotation * (center * scale)),
        rotation,
        scale: Vector3::new(scale, scale, scale),
    };
    log::debug!(
        "Fitted asset: center {:?}, diagonal {} -> scale {}",
        center,
        diagonal,
        scale
    );
    Fit {
        original_bounds: Some(bounds),
        scale,
    }
}
