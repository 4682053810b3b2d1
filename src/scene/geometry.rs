//! Box geometry and the vertex layout it is uploaded with.

use cgmath::{ElementWise, Vector3};

/// Describes how a vertex type is laid out in a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// An axis-aligned box centered on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxGeometry {
    width: f32,
    height: f32,
    depth: f32,
}

// (normal, right, up) per face; right x up == normal keeps the winding CCW
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

impl BoxGeometry {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn dimensions(&self) -> [f32; 3] {
        [self.width, self.height, self.depth]
    }

    /// Four vertices per face, each face mapping the full texture.
    pub fn vertices(&self) -> Vec<ModelVertex> {
        let half = Vector3::new(self.width, self.height, self.depth) * 0.5;
        // (right, up, u, v); v grows downwards in wgpu texture space
        let corners = [
            (-1.0, -1.0, [0.0, 1.0]),
            (1.0, -1.0, [1.0, 1.0]),
            (1.0, 1.0, [1.0, 0.0]),
            (-1.0, 1.0, [0.0, 0.0]),
        ];
        FACES
            .iter()
            .flat_map(|&(normal, right, up)| {
                let n = Vector3::from(normal);
                let center = n.mul_element_wise(half);
                let right = Vector3::from(right).mul_element_wise(half);
                let up = Vector3::from(up).mul_element_wise(half);
                corners.iter().map(move |&(sr, su, tex_coords)| ModelVertex {
                    position: (center + right * sr + up * su).into(),
                    tex_coords,
                    normal,
                })
            })
            .collect()
    }

    pub fn indices(&self) -> Vec<u16> {
        (0..FACES.len() as u16)
            .flat_map(|face| {
                let base = face * 4;
                [base, base + 1, base + 2, base + 2, base + 3, base]
            })
            .collect()
    }
}
