use crate::{
    camera::Camera,
    render::{RenderBackend, Renderer},
};

/// Size of the display container in logical pixels.
///
/// Hosts that know the exact physical size (native windows) keep it as well,
/// since rounding to whole logical pixels and scaling back up loses pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    physical: Option<(u32, u32)>,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            physical: None,
        }
    }

    /// A viewport measured in physical pixels at `scale_factor` physical
    /// pixels per logical one.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let logical = |v: u32| (v as f64 / scale).round() as u32;
        Self {
            width: logical(width),
            height: logical(height),
            physical: Some((width, height)),
        }
    }

    /// The exact physical size, when the host reported one.
    pub fn physical(&self) -> Option<(u32, u32)> {
        self.physical
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Keeps the camera's aspect ratio and the drawing surface in step with the
/// container. Zero-sized viewports (minimized windows, hidden containers)
/// are ignored. Returns whether anything changed.
pub fn handle_resize<B: RenderBackend>(
    camera: &mut Camera,
    renderer: &mut Renderer<B>,
    viewport: Viewport,
) -> bool {
    if viewport.is_empty() {
        log::debug!("ignoring resize to {}x{}", viewport.width, viewport.height);
        return false;
    }
    if let Err(e) = camera.projection.set_aspect(viewport.aspect()) {
        log::warn!("resize rejected: {e}");
        return false;
    }
    camera.update_projection();
    renderer.set_viewport(viewport);
    true
}

#[cfg(test)]
mod tests {
    use cgmath::Deg;

    use super::*;
    use crate::render::{Frame, RendererOptions};

    #[derive(Default)]
    struct Sizes(Vec<(u32, u32)>);

    impl RenderBackend for Sizes {
        fn resize(&mut self, width: u32, height: u32) {
            self.0.push((width, height));
        }

        fn draw(&mut self, _frame: &Frame) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn updates_aspect_and_size() {
        let mut camera = Camera::new(Deg(35.0), 1024.0 / 768.0, 0.1, 100.0).unwrap();
        let mut renderer = Renderer::new(Sizes::default(), RendererOptions::default());

        assert!(handle_resize(&mut camera, &mut renderer, Viewport::new(800, 600)));
        assert!((camera.projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.backend().0.last(), Some(&(800, 600)));
    }

    #[test]
    fn repeating_a_resize_is_idempotent() {
        let mut camera = Camera::new(Deg(35.0), 1024.0 / 768.0, 0.1, 100.0).unwrap();
        let mut renderer = Renderer::new(Sizes::default(), RendererOptions::default());

        assert!(handle_resize(&mut camera, &mut renderer, Viewport::new(800, 600)));
        let aspect = camera.projection.aspect();
        let matrix = camera.projection.matrix();

        assert!(handle_resize(&mut camera, &mut renderer, Viewport::new(800, 600)));
        assert_eq!(camera.projection.aspect(), aspect);
        assert_eq!(camera.projection.matrix(), matrix);
        assert_eq!(renderer.size(), (800, 600));
        assert_eq!(renderer.backend().0, vec![(800, 600), (800, 600)]);
    }

    #[test]
    fn physical_size_survives_the_logical_round_trip() {
        let viewport = Viewport::from_physical(1003, 701, 2.0);
        assert_eq!((viewport.width, viewport.height), (502, 351));
        assert_eq!(viewport.physical(), Some((1003, 701)));

        let mut camera = Camera::new(Deg(35.0), 1.0, 0.1, 100.0).unwrap();
        let mut renderer = Renderer::new(Sizes::default(), RendererOptions::default());
        renderer.set_pixel_ratio(2.0);
        assert!(handle_resize(&mut camera, &mut renderer, viewport));
        assert_eq!(renderer.drawing_buffer_size(), (1003, 701));
        assert_eq!(renderer.backend().0, vec![(1003, 701)]);
    }

    #[test]
    fn non_positive_scale_factor_counts_as_one() {
        let viewport = Viewport::from_physical(640, 480, 0.0);
        assert_eq!((viewport.width, viewport.height), (640, 480));
        assert_eq!(viewport.physical(), Some((640, 480)));
    }

    #[test]
    fn ignores_zero_sizes() {
        let mut camera = Camera::new(Deg(35.0), 2.0, 0.1, 100.0).unwrap();
        let mut renderer = Renderer::new(Sizes::default(), RendererOptions::default());
        renderer.set_size(640, 320);

        assert!(!handle_resize(&mut camera, &mut renderer, Viewport::new(0, 600)));
        assert!(!handle_resize(&mut camera, &mut renderer, Viewport::new(800, 0)));
        assert_eq!(camera.projection.aspect(), 2.0);
        assert_eq!(renderer.size(), (640, 320));
    }
}
