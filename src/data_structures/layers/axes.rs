use crate::{
    data_structures::{
        layer::{Layer, LayerBase},
        mesh::Mesh,
    },
    error::MeshError,
};

/// Three coloured line segments along X, Y and Z, each spanning `[-2, 2]`.
#[derive(Debug, Clone)]
pub struct Axes {
    base: LayerBase,
}

impl Axes {
    pub const ID: &'static str = "axis";

    pub fn new() -> Self {
        let mut base = LayerBase::new(Self::ID);
        let geometry = &mut base.geometry;
        geometry.data = vec![
            vec![-2.0, 0.0, 0.0, 2.0, 0.0, 0.0],
            vec![0.0, -2.0, 0.0, 0.0, 2.0, 0.0],
            vec![0.0, 0.0, -2.0, 0.0, 0.0, 2.0],
        ];
        geometry.tex_coords = vec![
            vec![1.0, 1.0, 1.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        ];
        // one colour per end point
        geometry.color = vec![
            vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.1, 1.0],
        ];
        geometry.vertex_indices = vec![0, 1];
        Self { base }
    }
}

impl Default for Axes {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Axes {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn generate_geometry(&mut self) -> Result<(), MeshError> {
        let geometry = &self.base.geometry;
        let mut lines = Vec::with_capacity(geometry.data.len());
        for (line_id, vertices) in geometry.data.iter().enumerate() {
            let tex_coords = geometry.tex_coords.get(line_id).ok_or_else(|| {
                MeshError::InvalidData(format!("axis {line_id} has no texture coordinates"))
            })?;
            let color = geometry
                .color
                .get(line_id)
                .ok_or_else(|| MeshError::InvalidData(format!("axis {line_id} has no colour")))?;
            lines.push(Mesh::lines(
                &format!("{}{}", self.base.id, line_id),
                vertices,
                tex_coords,
                color,
                &geometry.vertex_indices,
            )?);
        }
        self.base
            .geometry
            .default_group_mut()
            .meshes
            .extend(lines);
        Ok(())
    }
}
