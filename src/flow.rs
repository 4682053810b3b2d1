//! Application event loop.
//!
//! [`run`] opens a window (or, in the browser, a canvas inside the
//! configured container), sets up the GPU, builds a [`Viewer`] and then
//! forwards winit events to it:
//!
//! 1. `RedrawRequested` runs one frame of the animation loop
//! 2. `Resized` resizes the camera and the renderer to the container
//! 3. pointer, touch and wheel input goes to the orbit controls
//!
//! Work that has to wait (GPU setup in the browser, loading the color map)
//! runs asynchronously and reports back through [`FlowEvent`]s sent over an
//! `EventLoopProxy`.

use std::sync::Arc;

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    controls::ControlEvent,
    host::{DisplayHost, WindowHost},
    render::gpu::GpuBackend,
    resources::load_texture_image,
    scene::material::TextureImage,
    viewer::{Viewer, ViewerConfig},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) enum FlowEvent {
    /// GPU setup finished in the browser's `spawn_local`.
    #[cfg(target_arch = "wasm32")]
    Initialized {
        host: WindowHost,
        viewer: Box<Viewer<GpuBackend>>,
    },
    TextureLoaded(anyhow::Result<TextureImage>),
}

impl std::fmt::Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(target_arch = "wasm32")]
            Self::Initialized { .. } => f.write_str("Initialized"),
            Self::TextureLoaded(result) => f
                .debug_tuple("TextureLoaded")
                .field(&result.as_ref().map(|t| &t.label))
                .finish(),
        }
    }
}

struct Running {
    host: WindowHost,
    viewer: Viewer<GpuBackend>,
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    config: ViewerConfig,
    state: Option<Running>,
    started: bool,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            config,
            state: None,
            started: false,
            last_time: Instant::now(),
        })
    }

    /// Loads the color map in the background and posts the outcome back to
    /// the event loop.
    fn load_texture(&self, path: String) {
        let proxy = self.proxy.clone();
        let task = async move {
            let loaded = load_texture_image(&path).await;
            if proxy.send_event(FlowEvent::TextureLoaded(loaded)).is_err() {
                log::warn!("event loop closed before {path} finished loading");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(task);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }

    fn start(&mut self, host: WindowHost, viewer: Viewer<GpuBackend>) {
        self.load_texture(viewer.texture_path().to_string());
        self.last_time = Instant::now();
        self.state = Some(Running { host, viewer });
    }
}

async fn build_viewer(
    config: ViewerConfig,
    window: Arc<Window>,
) -> anyhow::Result<(WindowHost, Viewer<GpuBackend>)> {
    let mut host = WindowHost::new(window.clone(), config.container_id.clone());
    let ctx = Context::new(window).await?;
    let backend = GpuBackend::new(ctx, config.renderer_options());
    let viewer = Viewer::init(config, &mut host, backend)?;
    Ok((host, viewer))
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        let window_attributes = Window::default_attributes().with_title("cube-viewer");
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {e}");
                event_loop.exit();
                return;
            }
        };

        let init_future = build_viewer(self.config.clone(), window);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((host, viewer)) => self.start(host, viewer),
                Err(e) => {
                    log::error!("could not start the viewer: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((host, viewer)) => {
                        let event = FlowEvent::Initialized {
                            host,
                            viewer: Box::new(viewer),
                        };
                        if proxy.send_event(event).is_err() {
                            log::error!("event loop closed during startup");
                        }
                    }
                    Err(e) => log::error!("could not start the viewer: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            FlowEvent::Initialized { host, mut viewer } => {
                // The canvas may have been resized by the page while the GPU was set up
                if let Ok(viewport) = host.element_size() {
                    viewer.resize(viewport);
                }
                self.start(host, *viewer);
            }
            FlowEvent::TextureLoaded(loaded) => {
                if let Some(state) = &mut self.state {
                    state.viewer.apply_texture(loaded);
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
        let Some(Running { host, viewer }) = &mut self.state else {
            return;
        };

        if let Some(input) = ControlEvent::from_window_event(&event, host.pixel_ratio()) {
            viewer.handle_input(&input);
        }

        match event {
            WindowEvent::CloseRequested => {
                viewer.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(_) => match host.element_size() {
                Ok(viewport) => {
                    viewer.resize(viewport);
                }
                Err(e) => log::warn!("could not measure the container: {e}"),
            },
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                viewer.renderer_mut().set_pixel_ratio(scale_factor);
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed().as_secs_f32();
                self.last_time = Instant::now();
                if let Err(e) = viewer.frame(&*host, dt) {
                    log::error!("Unable to render {e}");
                }
            }
            _ => {}
        }
    }
}

/// Opens the viewer and blocks until its window is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // The embedding page may already have installed a logger
        let _ = console_log::init_with_level(log::Level::Info);
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
