//! Frame composition and the renderer front-end.
//!
//! [`Renderer`] owns renderer-wide state (output size, pixel ratio, color
//! output settings) and turns a scene plus a camera into a [`Frame`]. Drawing
//! the frame is delegated to a [`RenderBackend`]; the wgpu implementation
//! lives in [`gpu`].
//!
//! # Key types
//!
//! - [`RenderBackend`] is the seam between frame composition and the GPU
//! - [`Frame`] is everything a backend needs to draw one image
//! - [`OutputSettings`] holds gamma correction applied to every frame

pub mod gpu;

use crate::{
    camera::Camera,
    error::Result,
    resize::Viewport,
    scene::{Color, Scene},
};

/// Gamma correction applied to final colors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputSettings {
    pub gamma_factor: f32,
    /// When false, linear colors are written out untouched.
    pub gamma_output: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            gamma_factor: 2.2,
            gamma_output: true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RendererOptions {
    pub antialias: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self { antialias: true }
    }
}

/// Everything a backend needs to draw one image.
pub struct Frame<'a> {
    pub background: Color,
    pub camera: &'a Camera,
    pub scene: &'a Scene,
    pub output: OutputSettings,
    /// Lambertian diffuse is divided by pi when set, as in physically based
    /// light units.
    pub physically_correct_lights: bool,
}

/// Something that can draw frames into an output surface.
pub trait RenderBackend {
    /// Resizes the drawing buffer, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, frame: &Frame<'_>) -> Result<()>;
}

pub struct Renderer<B> {
    backend: B,
    width: u32,
    height: u32,
    // Exact drawing buffer size reported by the host, if any
    physical: Option<(u32, u32)>,
    pixel_ratio: f64,
    antialias: bool,
    pub output: OutputSettings,
    pub physically_correct_lights: bool,
}

impl<B: RenderBackend> Renderer<B> {
    /// The backend must already have been created with `options.antialias`;
    /// the flag is recorded here for inspection.
    pub fn new(backend: B, options: RendererOptions) -> Self {
        Self {
            backend,
            width: 0,
            height: 0,
            physical: None,
            pixel_ratio: 1.0,
            antialias: options.antialias,
            output: OutputSettings::default(),
            physically_correct_lights: false,
        }
    }

    /// Sets the output size in logical pixels.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.physical = None;
        self.resize_backend();
    }

    /// Like [`Renderer::set_size`], but uses the viewport's physical size
    /// for the drawing buffer when the host reported one.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.width = viewport.width;
        self.height = viewport.height;
        self.physical = viewport.physical();
        self.resize_backend();
    }

    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0) {
            log::warn!("ignoring invalid pixel ratio {ratio}");
            return;
        }
        if ratio != self.pixel_ratio {
            // A reported physical size was measured at the old ratio
            self.physical = None;
        }
        self.pixel_ratio = ratio;
        self.resize_backend();
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn antialias(&self) -> bool {
        self.antialias
    }

    /// Size of the drawing buffer in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        if let Some(physical) = self.physical {
            return physical;
        }
        let scale = |v: u32| (v as f64 * self.pixel_ratio).round() as u32;
        (scale(self.width), scale(self.height))
    }

    fn resize_backend(&mut self) {
        let (width, height) = self.drawing_buffer_size();
        // Nothing to draw into until the first non-empty size arrives
        if width == 0 || height == 0 {
            return;
        }
        self.backend.resize(width, height);
    }

    /// Draws one frame of `scene` as seen from `camera`.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let frame = Frame {
            background: scene.background,
            camera,
            scene,
            output: self.output,
            physically_correct_lights: self.physically_correct_lights,
        };
        self.backend.draw(&frame)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
