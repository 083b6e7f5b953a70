//! The light rig of a composed scene.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::{camera::OPENGL_TO_WGPU_MATRIX, data_structures::colour::Colour};

/// Uniform fill light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: Colour,
    pub intensity: f32,
}

/// Light shining from `position` towards `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub cast_shadow: bool,
    /// Shadow map resolution in texels per side, only meaningful with `cast_shadow`.
    pub shadow_map_size: u32,
}

impl DirectionalLight {
    /// Unit vector pointing from the light towards its target.
    pub fn direction(&self) -> Vector3<f32> {
        let direction = self.target - self.position;
        if direction.magnitude2() > 0.0 {
            direction.normalize()
        } else {
            -Vector3::unit_y()
        }
    }

    /// Orthographic light-space transform looking along [`Self::direction`]
    /// that covers the sphere of `radius` around `center`.
    ///
    /// The sphere maps into x, y in `[-1, 1]` and depth in `[0.25, 0.75]`.
    pub fn shadow_view_proj(&self, center: Point3<f32>, radius: f32) -> Matrix4<f32> {
        let radius = radius.max(f32::EPSILON);
        let direction = self.direction();
        let eye = center - direction * (2.0 * radius);
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(eye, center, up);
        let projection = cgmath::ortho(-radius, radius, -radius, radius, 0.0, 4.0 * radius);
        OPENGL_TO_WGPU_MATRIX * projection * view
    }
}

/// Sky/ground gradient light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLight {
    pub sky: Colour,
    pub ground: Colour,
    pub intensity: f32,
    pub position: Point3<f32>,
}

impl HemisphereLight {
    /// Direction towards the sky colour.
    pub fn up(&self) -> Vector3<f32> {
        let up = Vector3::new(self.position.x, self.position.y, self.position.z);
        if up.magnitude2() > 0.0 {
            up.normalize()
        } else {
            Vector3::unit_y()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LightSet {
    pub ambient: AmbientLight,
    pub key: DirectionalLight,
    pub front: DirectionalLight,
    pub hemisphere: Option<HemisphereLight>,
}

impl LightSet {
    pub fn directional(&self) -> [&DirectionalLight; 2] {
        [&self.key, &self.front]
    }

    pub fn count(&self) -> usize {
        3 + usize::from(self.hemisphere.is_some())
    }
}
