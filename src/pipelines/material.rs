use crate::scene::material::{Material, MaterialKind};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    // linear rgb, alpha
    color: [f32; 4],
    // unlit flag, unused x3
    flags: [u32; 4],
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        let c = material.color.to_linear();
        Self {
            color: [c.r, c.g, c.b, 1.0],
            flags: [(material.kind == MaterialKind::Basic) as u32, 0, 0, 0],
        }
    }
}
