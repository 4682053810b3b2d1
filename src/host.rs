//! The display environment the viewer lives in.
//!
//! A host reports how big the area reserved for the viewer is, how many
//! physical pixels make up a logical one, attaches the render target, and
//! schedules frames. [`WindowHost`] implements this over a winit window; in
//! the browser it also finds the container element and appends the canvas.

use std::sync::Arc;

use winit::window::Window;

#[cfg(target_arch = "wasm32")]
use crate::error::Error;
use crate::{error::Result, resize::Viewport};

/// Id of the element the viewer is mounted into when none is configured.
pub const DEFAULT_CONTAINER_ID: &str = "scene-container";

/// Schedules frames. Each call results in at most one frame callback.
pub trait FrameSource {
    fn request_frame(&self);
}

pub trait DisplayHost: FrameSource {
    /// Size of the container in logical pixels.
    fn element_size(&self) -> Result<Viewport>;

    /// Physical pixels per logical pixel.
    fn pixel_ratio(&self) -> f64;

    /// Makes the renderer's output visible inside the container.
    fn append_render_target(&mut self) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct WindowHost {
    window: Arc<Window>,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    container_id: String,
}

impl WindowHost {
    pub fn new(window: Arc<Window>, container_id: impl Into<String>) -> Self {
        Self {
            window,
            container_id: container_id.into(),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    #[cfg(target_arch = "wasm32")]
    fn container(&self) -> Result<web_sys::Element> {
        web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(&self.container_id))
            .ok_or_else(|| Error::ContainerNotFound(self.container_id.clone()))
    }
}

impl FrameSource for WindowHost {
    fn request_frame(&self) {
        self.window.request_redraw();
    }
}

impl DisplayHost for WindowHost {
    #[cfg(not(target_arch = "wasm32"))]
    fn element_size(&self) -> Result<Viewport> {
        let size = self.window.inner_size();
        Ok(Viewport::from_physical(
            size.width,
            size.height,
            self.window.scale_factor(),
        ))
    }

    #[cfg(target_arch = "wasm32")]
    fn element_size(&self) -> Result<Viewport> {
        let container = self.container()?;
        Ok(Viewport::new(
            container.client_width().max(0) as u32,
            container.client_height().max(0) as u32,
        ))
    }

    fn pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn append_render_target(&mut self) -> Result<()> {
        // The window is its own render target
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn append_render_target(&mut self) -> Result<()> {
        use winit::platform::web::WindowExtWebSys;

        let container = self.container()?;
        let canvas = self
            .window
            .canvas()
            .ok_or_else(|| Error::AttachFailed("window has no canvas".to_string()))?;
        container.append_child(&canvas).map_err(|e| {
            Error::AttachFailed(format!(
                "could not append canvas to #{}: {e:?}",
                self.container_id
            ))
        })?;
        Ok(())
    }
}
