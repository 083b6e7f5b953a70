//! The page (or window) a viewer is embedded into.
//!
//! A viewer needs a container element with a known id. If the host has none,
//! initialization is skipped without an error.

/// Logical size and device pixel ratio of a container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Container {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Container {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Physical size of the draw surface, with the pixel ratio capped at `max_pixel_ratio`.
    pub fn physical_size(&self, max_pixel_ratio: f64) -> (u32, u32) {
        viewport_size(self.width, self.height, self.pixel_ratio, max_pixel_ratio)
    }
}

pub fn viewport_size(width: u32, height: u32, pixel_ratio: f64, max_pixel_ratio: f64) -> (u32, u32) {
    let ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio.min(max_pixel_ratio)
    } else {
        1.0
    };
    (
        (width as f64 * ratio).round() as u32,
        (height as f64 * ratio).round() as u32,
    )
}

/// Draw surface size for a window resize reported in physical pixels.
///
/// The reported size is converted back to logical pixels and the pixel ratio
/// re-capped, so a high-density display never exceeds `max_pixel_ratio`.
pub fn resized_viewport(width: u32, height: u32, scale_factor: f64, max_pixel_ratio: f64) -> (u32, u32) {
    let scale_factor = if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    };
    viewport_size(
        (width as f64 / scale_factor).round() as u32,
        (height as f64 / scale_factor).round() as u32,
        scale_factor,
        max_pixel_ratio,
    )
}

/// Inline style of the web canvas. It tracks the container's size, which
/// makes winit report container resizes as `WindowEvent::Resized`.
pub const CANVAS_STYLE: &str = "width:100%;height:100%;display:block";

pub trait Host {
    /// Look up the container with `id`.
    fn container(&self, id: &str) -> Option<Container>;
}

/// A native window acting as the one container with the configured id.
#[derive(Clone, Debug)]
pub struct WindowHost {
    id: String,
    container: Container,
}

impl WindowHost {
    pub fn new(id: impl Into<String>, window: &winit::window::Window) -> Self {
        let scale_factor = window.scale_factor();
        let logical = window.inner_size().to_logical::<f64>(scale_factor);
        Self {
            id: id.into(),
            container: Container::new(
                logical.width.round() as u32,
                logical.height.round() as u32,
                scale_factor,
            ),
        }
    }
}

impl Host for WindowHost {
    fn container(&self, id: &str) -> Option<Container> {
        (self.id == id).then_some(self.container)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::DocumentHost;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;

    use super::{CANVAS_STYLE, Container, Host};

    /// The browser document; containers are elements looked up by id.
    #[derive(Clone, Debug)]
    pub struct DocumentHost {
        window: web_sys::Window,
        document: web_sys::Document,
    }

    impl DocumentHost {
        pub fn new() -> Option<Self> {
            let window = web_sys::window()?;
            let document = window.document()?;
            Some(Self { window, document })
        }

        pub fn element(&self, id: &str) -> Option<web_sys::Element> {
            self.document.get_element_by_id(id)
        }

        /// Create a canvas filling the container `id`.
        pub fn create_canvas(&self, id: &str) -> Option<web_sys::HtmlCanvasElement> {
            let container = self.element(id)?;
            let canvas = self
                .document
                .create_element("canvas")
                .ok()?
                .dyn_into::<web_sys::HtmlCanvasElement>()
                .ok()?;
            canvas.set_width(container.client_width().max(1) as u32);
            canvas.set_height(container.client_height().max(1) as u32);
            canvas.set_attribute("style", CANVAS_STYLE).ok()?;
            container.append_child(&canvas).ok()?;
            Some(canvas)
        }
    }

    impl Host for DocumentHost {
        fn container(&self, id: &str) -> Option<Container> {
            let element = self.element(id)?;
            Some(Container::new(
                element.client_width().max(0) as u32,
                element.client_height().max(0) as u32,
                self.window.device_pixel_ratio(),
            ))
        }
    }
}
