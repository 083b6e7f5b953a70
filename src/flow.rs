//! Application event loop.
//!
//! [`run`] opens a window (a canvas inside the configured container on the
//! web), mounts a [`Viewer`] on it and starts loading the configured asset.
//! Every `RedrawRequested` ticks the viewer with the time since the previous
//! frame.
//!
//! Natively the GPU setup and the asset load are driven to completion on a
//! tokio runtime. On WASM both run through `spawn_local` and their results
//! come back as [`ViewerEvent`]s.

use std::sync::Arc;

use futures::channel::mpsc;
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    error::LoadError,
    host::{Host, resized_viewport},
    render::GpuSurface,
    resources::{GltfLoader, LoadedAsset, Progress, decoders::DecoderSet},
    viewer::Viewer,
};

#[cfg(target_arch = "wasm32")]
use crate::resources::AssetLoader;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum ViewerEvent {
    #[allow(dead_code)]
    Initialized(Context),
    #[allow(dead_code)]
    Loaded(Result<LoadedAsset, LoadError>),
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Loaded(Ok(_)) => f.write_str("Loaded(Ok)"),
            Self::Loaded(Err(e)) => f.debug_tuple("Loaded").field(e).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    decoders: DecoderSet,
    started: bool,
    viewer: Option<Viewer<GpuSurface>>,
    progress: Option<mpsc::UnboundedReceiver<f32>>,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        config: ViewerConfig,
        decoders: DecoderSet,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            decoders,
            started: false,
            viewer: None,
            progress: None,
            last_time: Instant::now(),
        })
    }

    /// Mount the viewer on a ready GPU context and kick off the asset load.
    fn start(&mut self, ctx: Context, host: &dyn Host) {
        let window = ctx.window().clone();
        let Some(mut viewer) = Viewer::mount(host, self.config.clone(), |_| GpuSurface::new(ctx))
        else {
            return;
        };

        let loader = GltfLoader::new(viewer.config()).with_decoders(self.decoders.clone());
        let (progress, receiver) = Progress::channel();
        self.progress = Some(receiver);

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.async_runtime
                .block_on(viewer.load_with(&loader, progress));
        }

        #[cfg(target_arch = "wasm32")]
        {
            if let Some(uri) = viewer.begin_load() {
                let proxy = self.proxy.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let result = loader.load(&uri, progress).await;
                    if proxy.send_event(ViewerEvent::Loaded(result)).is_err() {
                        log::warn!("Event loop closed before {} finished loading", uri);
                    }
                });
            }
        }

        self.viewer = Some(viewer);
        self.last_time = Instant::now();
        window.request_redraw();
    }

    fn log_progress(&mut self) {
        let Some(receiver) = self.progress.as_mut() else {
            return;
        };
        loop {
            match receiver.try_next() {
                Ok(Some(fraction)) => log::info!("Loading {:.0}%", fraction * 100.0),
                // sender dropped, the load is over
                Ok(None) => {
                    self.progress = None;
                    break;
                }
                Err(_) => break,
            }
        }
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("flow-viewer");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let Some(host) = crate::host::DocumentHost::new() else {
                log::debug!("No document, skipping viewer initialization");
                return;
            };
            if host.container(&self.config.container_id).is_none() {
                log::debug!(
                    "No container with id '{}', skipping viewer initialization",
                    self.config.container_id
                );
                return;
            }
            let Some(canvas) = host.create_canvas(&self.config.container_id) else {
                log::error!("Cannot create a canvas in '{}'", self.config.container_id);
                return;
            };
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let host = crate::host::WindowHost::new(self.config.container_id.clone(), &window);
            match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => self.start(ctx, &host),
                Err(e) => {
                    log::error!("Cannot create the main context: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(ctx) => {
                        if proxy.send_event(ViewerEvent::Initialized(ctx)).is_err() {
                            log::warn!("Event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("Cannot create the main context: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(ctx) => {
                // This is the message from our wasm `spawn_local`
                #[cfg(target_arch = "wasm32")]
                if let Some(host) = crate::host::DocumentHost::new() {
                    self.start(ctx, &host);
                }
                #[cfg(not(target_arch = "wasm32"))]
                drop(ctx);
            }
            ViewerEvent::Loaded(result) => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.finish_load(result);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let scale_factor = viewer.surface().context().window().scale_factor();
                let (width, height) = resized_viewport(
                    size.width,
                    size.height,
                    scale_factor,
                    viewer.config().max_pixel_ratio,
                );
                viewer.request_resize(width, height);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                viewer.tick(dt);
                viewer.surface().context().window().request_redraw();
                self.log_progress();
            }
            _ => {}
        }
    }
}

/// Open a viewer for `config` with the bundled decoders and run it.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let decoders = DecoderSet::bundled(config.decoders.clone());
    run_with_decoders(config, decoders)
}

/// Like [`run`], with geometry and texture decoders supplied by the caller.
pub fn run_with_decoders(config: ViewerConfig, decoders: DecoderSet) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config, decoders)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
