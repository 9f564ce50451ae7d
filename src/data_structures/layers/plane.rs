use crate::{
    data_structures::{
        layer::{Layer, LayerBase},
        mesh::Mesh,
    },
    error::MeshError,
};

/// A single quad made of two triangles.
///
/// `data` holds the four corners as twelve floats. Texture coordinates,
/// colours and indices are fixed.
#[derive(Debug, Clone)]
pub struct Plane {
    base: LayerBase,
}

impl Plane {
    pub const TEX_COORDS: [f32; 8] = [1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    #[rustfmt::skip]
    pub const COLOR: [f32; 16] = [
        1.0, 0.0, 0.0, 0.5,
        0.0, 1.0, 0.0, 0.5,
        0.0, 0.0, 1.0, 0.5,
        1.0, 1.0, 0.0, 0.5,
    ];
    pub const INDICES: [u16; 6] = [0, 2, 1, 3, 1, 2];

    pub const XY: [f32; 12] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0, 0.0];
    pub const YZ: [f32; 12] = [0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, -1.0, 1.0, 0.0, 1.0, 1.0];
    pub const XZ: [f32; 12] = [-1.0, 0.0, -1.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    pub fn new(id: impl Into<String>, data: [f32; 12]) -> Self {
        let mut base = LayerBase::new(id);
        base.geometry.data = vec![data.to_vec()];
        base.geometry.tex_coords = vec![Self::TEX_COORDS.to_vec()];
        base.geometry.color = vec![Self::COLOR.to_vec()];
        base.geometry.vertex_indices = Self::INDICES.to_vec();
        Self { base }
    }

    pub fn xy(id: impl Into<String>) -> Self {
        Self::new(id, Self::XY)
    }

    pub fn yz(id: impl Into<String>) -> Self {
        Self::new(id, Self::YZ)
    }

    pub fn xz(id: impl Into<String>) -> Self {
        Self::new(id, Self::XZ)
    }
}

impl Layer for Plane {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn generate_geometry(&mut self) -> Result<(), MeshError> {
        let geometry = &self.base.geometry;
        let quad = Mesh::triangles(
            &self.base.id,
            &geometry.data.concat(),
            &geometry.tex_coords.concat(),
            &geometry.color.concat(),
            &geometry.vertex_indices,
        )?;
        self.base.geometry.default_group_mut().meshes.push(quad);
        Ok(())
    }
}
