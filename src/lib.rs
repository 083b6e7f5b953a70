//! flow-viewer
//!
//! A single-viewport glTF viewer for native windows and the web. One viewer
//! is attached to one container: it loads a binary glTF asset, normalizes
//! its materials so every mesh can be drawn, fits the asset into a target
//! size at the origin and then plays its first animation clip in a loop.
//!
//! High-level modules
//! - `config`: viewer configuration and the two built-in presets
//! - `resources`: the asset loader and its geometry/texture decoder seams
//! - `normalizer`: per-mesh material repair and fallback assignment
//! - `composer`: camera, lights and fitting of the asset into the scene
//! - `viewer`: the per-container lifecycle, tick and resize handling
//! - `render`: the draw surface seam and its wgpu implementation
//! - `flow`: the winit event loop driving a viewer
//! - `host`: lookup of the container a viewer is mounted into
//!

pub mod camera;
pub mod composer;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod host;
pub mod normalizer;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use config::ViewerConfig;
pub use error::{LoadError, RenderError};
pub use flow::{run, run_with_decoders};
pub use viewer::{Viewer, ViewerState};

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::prelude::*;

    use crate::config::ViewerConfig;

    fn start(config: ViewerConfig) -> Result<(), JsValue> {
        crate::flow::run(config).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
    }

    /// Mount the tree animation into `#three-animation-container`.
    #[wasm_bindgen]
    pub fn mount_tree_animation() -> Result<(), JsValue> {
        start(ViewerConfig::tree_animation())
    }

    #[wasm_bindgen]
    pub fn mount_showcase_animation() -> Result<(), JsValue> {
        start(ViewerConfig::showcase_animation())
    }
}
