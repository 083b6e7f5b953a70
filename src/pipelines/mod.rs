//! Render pipelines and the uniforms bound alongside them.
//!
//! - `basic`: material pipelines (opaque/blended, one/two-sided) and the shared pipeline builder
//! - `light`: packing of the light rig into a uniform buffer, plus the key light's shadow map
//! - `shadow`: the depth-only pass filling that shadow map

pub mod basic;
pub mod light;
pub mod shadow;
