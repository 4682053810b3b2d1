//! Perspective camera, projection and the uniform block uploaded to shaders.
//!
//! The camera keeps its position and look-at target separate from the
//! [`Projection`] so that resizing the output only touches the projection.
//! The projection matrix is cached: changing the aspect ratio or the field of
//! view has no visible effect until [`Projection::update`] (or
//! [`Camera::update_projection`]) is called.

use cgmath::{Deg, EuclideanSpace, Matrix4, Point3, SquareMatrix, Vector3, perspective};

use crate::error::{Error, Result};

/// Maps OpenGL clip space (z in -1..1) onto wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Smallest and largest vertical field of view accepted, in degrees.
pub const FOVY_RANGE: (f32, f32) = (1.0, 179.0);

#[derive(Clone, Debug)]
pub struct Projection {
    fovy: Deg<f32>,
    aspect: f32,
    znear: f32,
    zfar: f32,
    matrix: Matrix4<f32>,
}

impl Projection {
    pub fn new(fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Result<Self> {
        validate_fovy(fovy)?;
        validate_aspect(aspect)?;
        if !(znear > 0.0) || !znear.is_finite() {
            return Err(Error::InvalidCamera(format!(
                "near plane must be positive, got {znear}"
            )));
        }
        if !(zfar > znear) || !zfar.is_finite() {
            return Err(Error::InvalidCamera(format!(
                "far plane ({zfar}) must lie beyond the near plane ({znear})"
            )));
        }
        let mut projection = Self {
            fovy,
            aspect,
            znear,
            zfar,
            matrix: Matrix4::identity(),
        };
        projection.update();
        Ok(projection)
    }

    pub fn fovy(&self) -> Deg<f32> {
        self.fovy
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn znear(&self) -> f32 {
        self.znear
    }

    pub fn zfar(&self) -> f32 {
        self.zfar
    }

    /// Changes the aspect ratio. Call [`Projection::update`] afterwards.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<()> {
        validate_aspect(aspect)?;
        self.aspect = aspect;
        Ok(())
    }

    /// Changes the vertical field of view. Call [`Projection::update`] afterwards.
    pub fn set_fovy(&mut self, fovy: Deg<f32>) -> Result<()> {
        validate_fovy(fovy)?;
        self.fovy = fovy;
        Ok(())
    }

    /// Recomputes the cached projection matrix from the current parameters.
    pub fn update(&mut self) {
        self.matrix =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    /// The projection matrix as of the last [`Projection::update`].
    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }
}

fn validate_fovy(fovy: Deg<f32>) -> Result<()> {
    let (min, max) = FOVY_RANGE;
    if fovy.0.is_finite() && fovy.0 >= min && fovy.0 <= max {
        Ok(())
    } else {
        Err(Error::InvalidCamera(format!(
            "field of view must be within {min}..={max} degrees, got {}",
            fovy.0
        )))
    }
}

fn validate_aspect(aspect: f32) -> Result<()> {
    if aspect.is_finite() && aspect > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidCamera(format!(
            "aspect ratio must be finite and positive, got {aspect}"
        )))
    }
}

/// A perspective camera looking at `target`.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub projection: Projection,
}

impl Camera {
    /// Creates a camera at the origin looking down -z.
    pub fn new(fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) -> Result<Self> {
        Ok(Self {
            position: Point3::origin(),
            target: Point3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            projection: Projection::new(fovy, aspect, znear, zfar)?,
        })
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn update_projection(&mut self) {
        self.projection.update();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.matrix() * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        // w = 1 keeps the eye a point when the shader transforms it
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Transform};

    #[test]
    fn rejects_fov_outside_valid_range() {
        assert!(Projection::new(Deg(0.5), 1.0, 0.1, 100.0).is_err());
        assert!(Projection::new(Deg(179.5), 1.0, 0.1, 100.0).is_err());
        assert!(Projection::new(Deg(f32::NAN), 1.0, 0.1, 100.0).is_err());
        assert!(Projection::new(Deg(1.0), 1.0, 0.1, 100.0).is_ok());
        assert!(Projection::new(Deg(179.0), 1.0, 0.1, 100.0).is_ok());
    }

    #[test]
    fn rejects_inverted_or_non_positive_clip_planes() {
        assert!(Projection::new(Deg(35.0), 1.0, 0.0, 100.0).is_err());
        assert!(Projection::new(Deg(35.0), 1.0, -1.0, 100.0).is_err());
        assert!(Projection::new(Deg(35.0), 1.0, 10.0, 10.0).is_err());
        assert!(Projection::new(Deg(35.0), 1.0, 10.0, 1.0).is_err());
    }

    #[test]
    fn rejects_degenerate_aspect() {
        assert!(Projection::new(Deg(35.0), 0.0, 0.1, 100.0).is_err());
        assert!(Projection::new(Deg(35.0), f32::INFINITY, 0.1, 100.0).is_err());
        let mut projection = Projection::new(Deg(35.0), 1.0, 0.1, 100.0).unwrap();
        assert!(projection.set_aspect(-2.0).is_err());
        assert_eq!(projection.aspect(), 1.0);
    }

    #[test]
    fn matrix_is_stale_until_update() {
        let mut projection = Projection::new(Deg(35.0), 1.0, 0.1, 100.0).unwrap();
        let before = projection.matrix();
        projection.set_aspect(2.0).unwrap();
        assert_eq!(projection.matrix(), before);
        projection.update();
        assert_ne!(projection.matrix(), before);
        let expected = OPENGL_TO_WGPU_MATRIX * perspective(Deg(35.0), 2.0, 0.1, 100.0);
        assert_eq!(projection.matrix(), expected);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = Camera::new(Deg(35.0), 4.0 / 3.0, 0.1, 100.0).unwrap();
        camera.set_position(-4.0, 4.0, 10.0);
        camera.look_at(Point3::origin());
        let clip = camera.view_proj().transform_point(Point3::origin());
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
        // wgpu depth range
        assert!(clip.z > 0.0 && clip.z < 1.0);
        assert!((camera.position.to_vec().magnitude() - 132f32.sqrt()).abs() < 1e-4);
    }
}
