//! One viewer per container.
//!
//! A [`Viewer`] owns the composed scene, the playback clock and a
//! [`DrawSurface`]. Loading is split so that the only suspension point is the
//! asset future: [`Viewer::begin_load`] enters `Loading`, the caller drives an
//! [`AssetLoader`] however its platform allows, and [`Viewer::finish_load`]
//! normalizes and composes the result synchronously.
//!
//! ```text
//! Idle -> Loading -> Normalizing -> Composed -> Animating
//!            \
//!             -> Failed
//! ```

use std::time::Duration;

use cgmath::Deg;

use crate::{
    composer::Scene,
    config::ViewerConfig,
    data_structures::animation::{AnimationMixer, PlaybackClock},
    error::{LoadError, RenderError},
    host::{Container, Host},
    normalizer::normalize,
    render::DrawSurface,
    resources::{AssetLoader, LoadedAsset, Progress},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerState {
    Idle,
    Loading,
    Normalizing,
    Composed,
    Animating,
    Failed,
}

impl ViewerState {
    /// The asset is in the scene.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Composed | Self::Animating)
    }
}

/// Collapses a burst of resize requests into one.
///
/// Timestamps are durations on a caller-chosen monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResizeDebouncer {
    window: Option<Duration>,
    pending: Option<PendingResize>,
}

#[derive(Clone, Copy, Debug)]
struct PendingResize {
    width: u32,
    height: u32,
    requested_at: Duration,
}

impl ResizeDebouncer {
    pub fn new(window: Option<Duration>) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Record the newest size. Zero-area sizes are dropped.
    pub fn request(&mut self, width: u32, height: u32, now: Duration) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.pending = Some(PendingResize {
            width,
            height,
            requested_at: now,
        });
        true
    }

    /// The size to apply, once it has been stable for the window.
    pub fn settle(&mut self, now: Duration) -> Option<(u32, u32)> {
        let pending = self.pending?;
        let window = self.window.unwrap_or_default();
        if now.saturating_sub(pending.requested_at) < window {
            return None;
        }
        self.pending = None;
        Some((pending.width, pending.height))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug)]
pub struct Viewer<S: DrawSurface> {
    config: ViewerConfig,
    state: ViewerState,
    surface: S,
    scene: Scene,
    clock: PlaybackClock,
    mixer: Option<AnimationMixer>,
    resize: ResizeDebouncer,
    size: (u32, u32),
    render_errors: u64,
}

impl<S: DrawSurface> Viewer<S> {
    /// Create a viewer drawing `width` x `height` physical pixels.
    pub fn new(config: ViewerConfig, mut surface: S, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        surface.resize(width, height);
        let scene = Scene::new(&config, width, height);
        let resize = ResizeDebouncer::new(config.resize_debounce);
        Self {
            config,
            state: ViewerState::Idle,
            surface,
            scene,
            clock: PlaybackClock::default(),
            mixer: None,
            resize,
            size: (width, height),
            render_errors: 0,
        }
    }

    /// Attach to the container named in `config`.
    ///
    /// Returns `None` when the host has no such container; nothing is created
    /// in that case.
    pub fn mount<H, F>(host: &H, config: ViewerConfig, make_surface: F) -> Option<Self>
    where
        H: Host + ?Sized,
        F: FnOnce(&Container) -> S,
    {
        let Some(container) = host.container(&config.container_id) else {
            log::debug!(
                "No container with id '{}', skipping viewer initialization",
                config.container_id
            );
            return None;
        };
        let (width, height) = container.physical_size(config.max_pixel_ratio);
        let surface = make_surface(&container);
        Some(Self::new(config, surface, width, height))
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    /// Current physical size of the draw surface.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames that failed to render so far.
    pub fn render_errors(&self) -> u64 {
        self.render_errors
    }

    /// Enter `Loading`. Returns the uri to fetch, or `None` if a load was
    /// already started.
    pub fn begin_load(&mut self) -> Option<String> {
        if self.state != ViewerState::Idle {
            log::warn!("Ignoring load request in state {:?}", self.state);
            return None;
        }
        self.state = ViewerState::Loading;
        log::info!("Loading {}", self.config.asset_uri);
        Some(self.config.asset_uri.clone())
    }

    /// Hand the outcome of the asset future back to the viewer.
    pub fn finish_load(&mut self, result: Result<LoadedAsset, LoadError>) {
        if self.state != ViewerState::Loading {
            log::warn!("Discarding load result in state {:?}", self.state);
            return;
        }
        let LoadedAsset { mut scene, clips } = match result {
            Ok(asset) => asset,
            Err(e) => {
                log::error!("Failed to load {}: {}", self.config.asset_uri, e);
                self.state = ViewerState::Failed;
                return;
            }
        };

        self.state = ViewerState::Normalizing;
        let report = normalize(&mut scene, self.surface.max_anisotropy());
        log::info!(
            "Normalized {} meshes ({} fallback materials)",
            report.meshes,
            report.fallbacks
        );

        if let Some(fit) = self.scene.insert(
            scene,
            self.config.target_size,
            Deg(self.config.facing_degrees),
        ) {
            log::debug!("Fitted asset with scale {}", fit.scale);
        }
        if let Some(asset) = self.scene.asset() {
            self.surface.upload(asset);
        }

        self.mixer = clips.into_iter().next().map(|clip| {
            log::info!("Playing clip '{}' ({}s)", clip.name, clip.duration());
            AnimationMixer::new(clip)
        });
        self.state = ViewerState::Composed;
    }

    /// Drive a full load with `loader`.
    pub async fn load_with<L>(&mut self, loader: &L, progress: Progress)
    where
        L: AssetLoader + ?Sized,
    {
        let Some(uri) = self.begin_load() else {
            return;
        };
        let result = loader.load(&uri, progress).await;
        self.finish_load(result);
    }

    /// Record a new physical size; applied by a later [`Viewer::tick`].
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if !self.resize.request(width, height, self.clock.elapsed()) {
            log::debug!("Ignoring zero-area resize {}x{}", width, height);
        }
    }

    /// Advance by `dt` and draw one frame.
    pub fn tick(&mut self, dt: Duration) {
        self.clock.advance(dt);
        if self.state == ViewerState::Composed {
            self.state = ViewerState::Animating;
        }

        if let (Some(mixer), Some(asset)) = (self.mixer.as_mut(), self.scene.asset_mut()) {
            mixer.update(dt.as_secs_f32(), asset);
        }

        if let Some((width, height)) = self.resize.settle(self.clock.elapsed()) {
            self.apply_resize(width, height);
        }

        if let Err(e) = self.surface.render(&self.scene) {
            self.render_errors += 1;
            log::error!("Unable to render: {}", e);
            if let RenderError::SurfaceLost = e {
                let (width, height) = self.size;
                self.surface.resize(width, height);
            }
        }
    }

    fn apply_resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.scene.viewport.resize(width, height);
        self.surface.resize(width, height);
        log::debug!("Resized to {}x{}", width, height);
    }
}
