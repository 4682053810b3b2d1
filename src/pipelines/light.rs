use crate::{render::Frame, scene::Color};

/// Lights of each kind the shader evaluates; extra ones are ignored.
pub const MAX_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct HemisphereRaw {
    // rgb + intensity in w
    sky: [f32; 4],
    ground: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct DirectionalRaw {
    // rgb + intensity in w
    color: [f32; 4],
    // towards the light, w unused
    direction: [f32; 4],
}

/// Scene lights plus the renderer's light model and output settings.
///
/// Every member is a multiple of 16 bytes, so the Rust layout matches the
/// WGSL uniform layout without explicit padding fields.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    hemispheres: [HemisphereRaw; MAX_LIGHTS],
    directionals: [DirectionalRaw; MAX_LIGHTS],
    // hemisphere count, directional count, physically correct flag, unused
    counts: [u32; 4],
    // gamma factor, shader gamma flag, unused, unused
    output: [f32; 4],
}

fn rgb_w(c: Color, w: f32) -> [f32; 4] {
    let c = c.to_linear();
    [c.r, c.g, c.b, w]
}

impl LightUniform {
    /// Packs the frame's lights.
    ///
    /// `surface_is_srgb` tells whether the output format already encodes
    /// gamma; the shader only applies `gamma_factor` itself when it does not.
    pub fn from_frame(frame: &Frame<'_>, surface_is_srgb: bool) -> Self {
        let mut uniform = Self {
            hemispheres: [HemisphereRaw::default(); MAX_LIGHTS],
            directionals: [DirectionalRaw::default(); MAX_LIGHTS],
            counts: [0; 4],
            output: [frame.output.gamma_factor, 0.0, 0.0, 0.0],
        };

        let hemispheres: Vec<_> = frame.scene.hemisphere_lights().collect();
        if hemispheres.len() > MAX_LIGHTS {
            log::warn!(
                "{} hemisphere lights in scene, only the first {MAX_LIGHTS} are used",
                hemispheres.len()
            );
        }
        for (slot, light) in uniform.hemispheres.iter_mut().zip(&hemispheres) {
            *slot = HemisphereRaw {
                sky: rgb_w(light.sky, light.intensity),
                ground: rgb_w(light.ground, 0.0),
            };
        }

        let directionals: Vec<_> = frame.scene.directional_lights().collect();
        if directionals.len() > MAX_LIGHTS {
            log::warn!(
                "{} directional lights in scene, only the first {MAX_LIGHTS} are used",
                directionals.len()
            );
        }
        for (slot, light) in uniform.directionals.iter_mut().zip(&directionals) {
            let direction = light.direction();
            *slot = DirectionalRaw {
                color: rgb_w(light.color, light.intensity),
                direction: [direction.x, direction.y, direction.z, 0.0],
            };
        }

        uniform.counts = [
            hemispheres.len().min(MAX_LIGHTS) as u32,
            directionals.len().min(MAX_LIGHTS) as u32,
            frame.physically_correct_lights as u32,
            0,
        ];
        if frame.output.gamma_output && !surface_is_srgb {
            uniform.output[1] = 1.0;
        }
        uniform
    }
}
