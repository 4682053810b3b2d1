//! Surface appearance.
//!
//! A [`Material`] starts out without a color map. Texture loading is
//! asynchronous, so the map is attached later through [`Material::set_map`];
//! until then (or forever, when loading fails) the material renders with its
//! base color. Every change to the map bumps [`Material::revision`] so render
//! backends can tell when to upload again.

use std::sync::Arc;

use crate::scene::Color;

/// Largest anisotropic filtering level a sampler accepts.
pub const MAX_ANISOTROPY: u16 = 16;

/// How texel values of a color map are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorSpace {
    /// Texels are sRGB encoded and decoded to linear when sampled.
    #[default]
    Srgb,
    /// Texels are used as-is.
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MaterialKind {
    /// Lit by the scene's lights.
    #[default]
    Standard,
    /// Ignores lighting; always shows its color (and map) at full strength.
    Basic,
}

/// A decoded image ready to become a GPU texture. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TextureImage {
    pub label: String,
    pub pixels: Arc<image::RgbaImage>,
}

impl TextureImage {
    pub fn new(label: impl Into<String>, pixels: image::RgbaImage) -> Self {
        Self {
            label: label.into(),
            pixels: Arc::new(pixels),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    pub kind: MaterialKind,
    pub color: Color,
    map: Option<TextureImage>,
    color_space: ColorSpace,
    anisotropy: u16,
    revision: u64,
}

impl Material {
    fn with_kind(kind: MaterialKind) -> Self {
        Self {
            kind,
            color: Color::WHITE,
            map: None,
            color_space: ColorSpace::default(),
            anisotropy: 1,
            revision: 0,
        }
    }

    pub fn standard() -> Self {
        Self::with_kind(MaterialKind::Standard)
    }

    pub fn basic() -> Self {
        Self::with_kind(MaterialKind::Basic)
    }

    pub fn map(&self) -> Option<&TextureImage> {
        self.map.as_ref()
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn anisotropy(&self) -> u16 {
        self.anisotropy
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Attaches a color map, tagging how it is encoded and filtered.
    /// Anisotropy is clamped to `1..=MAX_ANISOTROPY`.
    pub fn set_map(&mut self, map: TextureImage, color_space: ColorSpace, anisotropy: u16) {
        self.map = Some(map);
        self.color_space = color_space;
        self.anisotropy = anisotropy.clamp(1, MAX_ANISOTROPY);
        self.revision += 1;
    }

    pub fn clear_map(&mut self) {
        if self.map.take().is_some() {
            self.revision += 1;
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> TextureImage {
        TextureImage::new("checker", image::RgbaImage::from_pixel(2, 2, image::Rgba([255; 4])))
    }

    #[test]
    fn new_material_has_no_map() {
        let material = Material::standard();
        assert!(material.map().is_none());
        assert_eq!(material.revision(), 0);
        assert_eq!(material.color, Color::WHITE);
    }

    #[test]
    fn set_map_tags_and_bumps_revision() {
        let mut material = Material::standard();
        material.set_map(checker(), ColorSpace::Srgb, 64);
        assert_eq!(material.anisotropy(), MAX_ANISOTROPY);
        assert_eq!(material.color_space(), ColorSpace::Srgb);
        assert_eq!(material.map().map(TextureImage::dimensions), Some((2, 2)));
        assert_eq!(material.revision(), 1);

        material.set_map(checker(), ColorSpace::Linear, 0);
        assert_eq!(material.anisotropy(), 1);
        assert_eq!(material.revision(), 2);
    }

    #[test]
    fn clearing_an_empty_map_is_not_a_change() {
        let mut material = Material::basic();
        material.clear_map();
        assert_eq!(material.revision(), 0);
        material.set_map(checker(), ColorSpace::Srgb, 16);
        material.clear_map();
        assert!(material.map().is_none());
        assert_eq!(material.revision(), 2);
    }
}
