//! Scene contents: background, lights and meshes.
//!
//! - `geometry` holds the box shape and the vertex layout shared with the GPU
//! - `material` describes surface appearance and the optional color map
//! - `mesh` pairs a geometry with a material (and builds them in order)
//! - `light` contains the hemisphere and directional lights
//! - `transform` holds per-mesh position, rotation and scale
//!
//! The [`Scene`] itself is an append-only list. Renderers walk it in insertion
//! order, which is observable wherever draw order matters.

pub mod geometry;
pub mod light;
pub mod material;
pub mod mesh;
pub mod transform;

use self::{
    light::{DirectionalLight, HemisphereLight},
    mesh::Mesh,
};

/// An RGB color with components in 0..=1, expressed in sRGB.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// CSS `skyblue`.
    pub const SKY_BLUE: Color = Color::from_hex(0x87ceeb);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Converts each component from the sRGB transfer curve to linear light.
    pub fn to_linear(self) -> Self {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        Self::rgb(channel(self.r), channel(self.g), channel(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: 1.0,
        }
    }
}

/// Handle to a node, valid for the scene that returned it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Hemisphere(HemisphereLight),
    Directional(DirectionalLight),
    Mesh(Mesh),
}

impl From<HemisphereLight> for Node {
    fn from(light: HemisphereLight) -> Self {
        Node::Hemisphere(light)
    }
}

impl From<DirectionalLight> for Node {
    fn from(light: DirectionalLight) -> Self {
        Node::Directional(light)
    }
}

impl From<Mesh> for Node {
    fn from(mesh: Mesh) -> Self {
        Node::Mesh(mesh)
    }
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub background: Color,
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            nodes: Vec::new(),
        }
    }

    /// Appends a light or mesh to the render set.
    pub fn add(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node.into());
        id
    }

    /// Appends several nodes, keeping their order.
    pub fn extend<I>(&mut self, nodes: I) -> Vec<NodeId>
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        nodes.into_iter().map(|node| self.add(node)).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &Mesh)> {
        self.nodes().filter_map(|(id, node)| match node {
            Node::Mesh(mesh) => Some((id, mesh)),
            _ => None,
        })
    }

    pub fn hemisphere_lights(&self) -> impl Iterator<Item = &HemisphereLight> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Hemisphere(light) => Some(light),
            _ => None,
        })
    }

    pub fn directional_lights(&self) -> impl Iterator<Item = &DirectionalLight> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Directional(light) => Some(light),
            _ => None,
        })
    }

    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        match self.nodes.get(id.0) {
            Some(Node::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        match self.nodes.get_mut(id.0) {
            Some(Node::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }
}
