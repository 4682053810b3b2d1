use std::cell::Cell;

use cube_viewer::{
    error::{Error, Result},
    host::{DisplayHost, FrameSource},
    render::{Frame, RenderBackend},
    resize::Viewport,
    scene::{Color, Node, NodeId},
};

/// What a [`RecordingBackend`] saw for one drawn frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnFrame {
    pub background: Color,
    pub nodes: Vec<(NodeId, &'static str)>,
    pub aspect: f32,
    /// Whether each mesh, in draw order, had a color map attached.
    pub mesh_maps: Vec<bool>,
}

/// A render backend that draws nothing and remembers every call.
#[derive(Default)]
pub struct RecordingBackend {
    pub resizes: Vec<(u32, u32)>,
    pub frames: Vec<DrawnFrame>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&DrawnFrame> {
        self.frames.last()
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.resizes.push((width, height));
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        let nodes = frame
            .scene
            .nodes()
            .map(|(id, node)| {
                let kind = match node {
                    Node::Hemisphere(_) => "hemisphere",
                    Node::Directional(_) => "directional",
                    Node::Mesh(_) => "mesh",
                };
                (id, kind)
            })
            .collect();
        let mesh_maps = frame
            .scene
            .meshes()
            .map(|(_, mesh)| mesh.material.map().is_some())
            .collect();
        self.frames.push(DrawnFrame {
            background: frame.background,
            nodes,
            aspect: frame.camera.projection.aspect(),
            mesh_maps,
        });
        Ok(())
    }
}

/// Stand-in for the page or window hosting the viewer.
pub struct FakeHost {
    pub size: Viewport,
    pub pixel_ratio: f64,
    pub container_present: bool,
    pub attach_fails: bool,
    pub appended: u32,
    pub frame_requests: Cell<u32>,
}

impl FakeHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Viewport::new(width, height),
            pixel_ratio: 1.0,
            container_present: true,
            attach_fails: false,
            appended: 0,
            frame_requests: Cell::new(0),
        }
    }

    pub fn without_container() -> Self {
        Self {
            container_present: false,
            ..Self::new(0, 0)
        }
    }

    pub fn requests(&self) -> u32 {
        self.frame_requests.get()
    }
}

impl FrameSource for FakeHost {
    fn request_frame(&self) {
        self.frame_requests.set(self.frame_requests.get() + 1);
    }
}

impl DisplayHost for FakeHost {
    fn element_size(&self) -> Result<Viewport> {
        if self.container_present {
            Ok(self.size)
        } else {
            Err(Error::ContainerNotFound("scene-container".to_string()))
        }
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn append_render_target(&mut self) -> Result<()> {
        if self.attach_fails {
            return Err(Error::AttachFailed("canvas rejected".to_string()));
        }
        self.appended += 1;
        Ok(())
    }
}
