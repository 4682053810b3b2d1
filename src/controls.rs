//! Orbit controls: pointer, touch and wheel input turned into camera motion
//! around a fixed target.
//!
//! [`OrbitControls::handle`] is a plain function of an input event and the
//! camera, so it can be driven without a window. [`ControlEvent::from_window_event`]
//! translates winit events for the live application.
//!
//! Gestures:
//! - primary button drag / one finger rotates around the target
//! - secondary button drag pans the target and camera together
//! - middle button drag, the wheel and a two finger pinch dolly in and out

use std::{collections::BTreeMap, f32::consts::PI};

use cgmath::{InnerSpace, Point3, Vector3};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::camera::Camera;

const POLAR_EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchState {
    Started,
    Moved,
    Ended,
}

/// Input relevant to the controls, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    PointerDown { button: PointerButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { button: PointerButton },
    /// Positive values scroll towards the user (zoom out), like DOM `deltaY`.
    Wheel { delta_y: f32 },
    Touch { id: u64, state: TouchState, x: f32, y: f32 },
}

impl ControlEvent {
    /// Translates a winit window event. `scale_factor` converts winit's
    /// physical positions into logical pixels.
    pub fn from_window_event(event: &WindowEvent, scale_factor: f64) -> Option<Self> {
        let logical = |x: f64, y: f64| ((x / scale_factor) as f32, (y / scale_factor) as f32);
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return None,
                };
                Some(match state {
                    // Position is filled in by the next cursor move
                    ElementState::Pressed => ControlEvent::PointerDown {
                        button,
                        x: f32::NAN,
                        y: f32::NAN,
                    },
                    ElementState::Released => ControlEvent::PointerUp { button },
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = logical(position.x, position.y);
                Some(ControlEvent::PointerMove { x, y })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    // winit reports scrolling away from the user as positive
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
                };
                Some(ControlEvent::Wheel { delta_y })
            }
            WindowEvent::Touch(touch) => {
                let state = match touch.phase {
                    TouchPhase::Started => TouchState::Started,
                    TouchPhase::Moved => TouchState::Moved,
                    TouchPhase::Ended | TouchPhase::Cancelled => TouchState::Ended,
                };
                let (x, y) = logical(touch.location.x, touch.location.y);
                Some(ControlEvent::Touch {
                    id: touch.id,
                    state,
                    x,
                    y,
                })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    None,
    Rotate,
    Pan,
    Dolly,
}

#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enabled: bool,
    gesture: Gesture,
    last_pointer: Option<(f32, f32)>,
    touches: BTreeMap<u64, (f32, f32)>,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            enabled: true,
            gesture: Gesture::None,
            last_pointer: None,
            touches: BTreeMap::new(),
        }
    }

    /// Aims `camera` at the target without moving it.
    pub fn attach(&self, camera: &mut Camera) {
        camera.look_at(self.target);
    }

    /// Applies one input event. Returns whether the camera moved.
    ///
    /// `viewport_height` is the height of the input surface in logical
    /// pixels; a drag across the full height rotates by a full turn.
    pub fn handle(
        &mut self,
        camera: &mut Camera,
        event: &ControlEvent,
        viewport_height: f32,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let height = viewport_height.max(1.0);
        match *event {
            ControlEvent::PointerDown { button, x, y } => {
                self.gesture = match button {
                    PointerButton::Primary => Gesture::Rotate,
                    PointerButton::Secondary => Gesture::Pan,
                    PointerButton::Middle => Gesture::Dolly,
                };
                self.last_pointer = (x.is_finite() && y.is_finite())
                    .then_some((x, y))
                    .or(self.last_pointer);
                false
            }
            ControlEvent::PointerUp { .. } => {
                self.gesture = Gesture::None;
                false
            }
            ControlEvent::PointerMove { x, y } => {
                let previous = self.last_pointer.replace((x, y));
                let Some((px, py)) = previous else {
                    return false;
                };
                let (dx, dy) = (x - px, y - py);
                match self.gesture {
                    Gesture::None => false,
                    Gesture::Rotate => self.rotate(camera, dx, dy, height),
                    Gesture::Pan => self.pan(camera, dx, dy, height),
                    Gesture::Dolly => {
                        if dy > 0.0 {
                            self.dolly(camera, 1.0 / self.zoom_scale())
                        } else if dy < 0.0 {
                            self.dolly(camera, self.zoom_scale())
                        } else {
                            false
                        }
                    }
                }
            }
            ControlEvent::Wheel { delta_y } => {
                if delta_y < 0.0 {
                    self.dolly(camera, self.zoom_scale())
                } else if delta_y > 0.0 {
                    self.dolly(camera, 1.0 / self.zoom_scale())
                } else {
                    false
                }
            }
            ControlEvent::Touch { id, state, x, y } => {
                self.touch(camera, id, state, (x, y), height)
            }
        }
    }

    fn touch(
        &mut self,
        camera: &mut Camera,
        id: u64,
        state: TouchState,
        at: (f32, f32),
        height: f32,
    ) -> bool {
        match state {
            TouchState::Started => {
                self.touches.insert(id, at);
                false
            }
            TouchState::Ended => {
                self.touches.remove(&id);
                false
            }
            TouchState::Moved => {
                let before: Vec<_> = self.touches.values().copied().collect();
                let Some(previous) = self.touches.insert(id, at) else {
                    return false;
                };
                match before.len() {
                    1 => self.rotate(camera, at.0 - previous.0, at.1 - previous.1, height),
                    2 => {
                        let after: Vec<_> = self.touches.values().copied().collect();
                        let spread = |p: &[(f32, f32)]| {
                            let (dx, dy) = (p[0].0 - p[1].0, p[0].1 - p[1].1);
                            (dx * dx + dy * dy).sqrt()
                        };
                        let (old, new) = (spread(&before), spread(&after));
                        if old > 0.0 && new > 0.0 {
                            // Fingers moving apart bring the camera closer
                            self.dolly(camera, old / new)
                        } else {
                            false
                        }
                    }
                    _ => false,
                }
            }
        }
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    fn rotate(&self, camera: &mut Camera, dx: f32, dy: f32, height: f32) -> bool {
        let left = 2.0 * PI * dx / height * self.rotate_speed;
        let up = 2.0 * PI * dy / height * self.rotate_speed;
        self.orbit(camera, -left, -up, 1.0)
    }

    /// Scales the camera's distance to the target by `scale`.
    fn dolly(&self, camera: &mut Camera, scale: f32) -> bool {
        self.orbit(camera, 0.0, 0.0, scale)
    }

    fn pan(&mut self, camera: &mut Camera, dx: f32, dy: f32, height: f32) -> bool {
        let offset = camera.position - self.target;
        let fov = camera.projection.fovy().0.to_radians();
        // Distance covered by half the viewport height at the target's depth
        let target_distance = offset.magnitude() * (fov / 2.0).tan();
        let forward = -offset.normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        if !right.x.is_finite() {
            return false;
        }
        let shift = right * (-2.0 * dx * target_distance / height * self.pan_speed)
            + up * (2.0 * dy * target_distance / height * self.pan_speed);
        self.target += shift;
        camera.position += shift;
        camera.look_at(self.target);
        shift.magnitude2() > 0.0
    }

    /// Moves the camera on a sphere around the target.
    fn orbit(&self, camera: &mut Camera, delta_theta: f32, delta_phi: f32, scale: f32) -> bool {
        let offset = camera.position - self.target;
        let radius = offset.magnitude();
        if radius == 0.0 {
            return false;
        }
        let theta = offset.x.atan2(offset.z) + delta_theta;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + delta_phi)
            .clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius * scale).clamp(self.min_distance, self.max_distance);

        let next = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        let moved = (next - offset).magnitude2() > 0.0;
        camera.position = self.target + next;
        camera.look_at(self.target);
        moved
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 0.0))
    }
}
