//! cube-viewer
//!
//! A small 3D viewer that shows a lit, textured cube which can be orbited
//! with the mouse, touch or the scroll wheel. It runs natively in a winit
//! window and in the browser, where the canvas is appended to a container
//! element. Rendering goes through wgpu.
//!
//! High-level modules
//! - `viewer`: the orchestration context tying scene, camera, renderer and controls together
//! - `scene`: scene contents (box geometry, materials, lights, meshes)
//! - `camera`: perspective camera, projection and uniforms
//! - `controls`: orbit controls driven by pointer, touch and wheel input
//! - `animation_loop`: start/stop state machine for the per-frame callback
//! - `resize`: keeps camera and renderer in step with the container size
//! - `render`: renderer front-end and the wgpu render backend
//! - `host`: the window or page element the viewer is displayed in
//! - `context`: GPU device, queue and surface setup
//! - `pipelines`: the render pipeline and its uniform blocks
//! - `resources`: helpers to load the color map
//! - `flow`: the winit application event loop
//!

pub mod animation_loop;
pub mod camera;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod host;
pub mod pipelines;
pub mod render;
pub mod resize;
pub mod resources;
pub mod scene;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use error::{Error, Result};
pub use viewer::{Viewer, ViewerConfig};
pub use cgmath;
pub use winit::event::WindowEvent;
