//! Viewer data structures: scene graph, materials, animation and GPU textures.
//!
//! - `animation` holds clips, channel sampling, the mixer and the playback clock
//! - `bounds` is the axis-aligned bounding box used for normalization
//! - `colour` contains RGB colours with hex/HSL constructors
//! - `instance` holds per-node transformation data
//! - `light` describes the light rig of a composed scene
//! - `material` contains textured and flat surface descriptions
//! - `model` holds the vertex layout and the GPU buffers of uploaded meshes
//! - `scene_graph` is the node arena of a loaded asset
//! - `texture` contains the GPU texture wrapper and upload utilities

pub mod animation;
pub mod bounds;
pub mod colour;
pub mod instance;
pub mod light;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
