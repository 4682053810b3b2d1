use cgmath::{InnerSpace, Point3, Vector3, Zero};

use crate::scene::Color;

/// Ambient light fading from `sky` (straight up) to `ground` (straight down).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLight {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

impl HemisphereLight {
    pub fn new(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            sky,
            ground,
            intensity,
        }
    }
}

/// Parallel light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
}

impl DirectionalLight {
    /// Creates a light straight above the origin.
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Point3::new(0.0, 1.0, 0.0),
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Point3::new(x, y, z);
    }

    /// Unit vector pointing from the lit surface towards the light.
    pub fn direction(&self) -> Vector3<f32> {
        let v = Vector3::new(self.position.x, self.position.y, self.position.z);
        if v.is_zero() { Vector3::unit_y() } else { v.normalize() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_points_back_to_the_light() {
        let mut light = DirectionalLight::new(Color::WHITE, 3.0);
        light.set_position(10.0, 10.0, 10.0);
        let d = light.direction();
        let expected = 1.0 / 3f32.sqrt();
        assert!((d.x - expected).abs() < 1e-6);
        assert!((d.y - expected).abs() < 1e-6);
        assert!((d.z - expected).abs() < 1e-6);
    }

    #[test]
    fn light_at_origin_falls_back_to_overhead() {
        let mut light = DirectionalLight::new(Color::WHITE, 1.0);
        light.set_position(0.0, 0.0, 0.0);
        assert_eq!(light.direction(), Vector3::unit_y());
    }
}
