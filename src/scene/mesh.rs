use crate::{
    error::{Error, Result},
    scene::{geometry::BoxGeometry, material::Material, transform::Transform},
};

/// A renderable object: one geometry drawn with one material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: BoxGeometry,
    pub material: Material,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(geometry: BoxGeometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            transform: Transform::new(),
        }
    }
}

/// Collects the parts of a mesh as they get created during startup.
///
/// Building fails until both the geometry and the material have been
/// supplied, which turns the startup ordering into a checked error instead of
/// a silent half-initialized mesh.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    geometry: Option<BoxGeometry>,
    material: Option<Material>,
}

impl MeshBuilder {
    pub fn geometry(mut self, geometry: BoxGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn build(self) -> Result<Mesh> {
        let geometry = self.geometry.ok_or(Error::MissingMeshPart("geometry"))?;
        let material = self.material.ok_or(Error::MissingMeshPart("material"))?;
        Ok(Mesh::new(geometry, material))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_without_geometry() {
        let err = MeshBuilder::default()
            .material(Material::standard())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingMeshPart("geometry")));
    }

    #[test]
    fn build_fails_without_material() {
        let err = MeshBuilder::default()
            .geometry(BoxGeometry::new(2.0, 2.0, 2.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::MissingMeshPart("material")));
    }

    #[test]
    fn build_fails_when_empty() {
        assert!(MeshBuilder::default().build().is_err());
    }

    #[test]
    fn build_succeeds_with_both_parts() {
        let mesh = MeshBuilder::default()
            .geometry(BoxGeometry::new(2.0, 2.0, 2.0))
            .material(Material::basic())
            .build()
            .unwrap();
        assert_eq!(mesh.geometry.dimensions(), [2.0, 2.0, 2.0]);
        assert_eq!(mesh.transform, Transform::new());
    }
}
