use crate::{
    data_structures::{
        layer::{Layer, LayerBase, flatten},
        mesh::{AttributeId, Mesh},
    },
    error::MeshError,
};

/// One sphere per data point.
///
/// `data` rows are `[x, y, z]`, `color` rows are `[r, g, b, a]` and `size`
/// holds one radius per point.
#[derive(Debug, Clone)]
pub struct Scatterplot3D {
    base: LayerBase,
}

const GROUP_ID: usize = 0;
const MESH_ID: usize = 0;

impl Scatterplot3D {
    pub fn new(
        id: impl Into<String>,
        data: Vec<Vec<f32>>,
        color: Vec<Vec<f32>>,
        size: Vec<f32>,
    ) -> Self {
        let mut base = LayerBase::new(id);
        base.geometry.data = data;
        base.geometry.color = color;
        base.geometry.size = size;
        Self { base }
    }

    pub fn data(&self) -> &[Vec<f32>] {
        &self.base.geometry.data
    }

    /// Rotates every point by `angle` radians about the Z axis and pushes the
    /// new positions to the sphere mesh in place. On error neither the rows
    /// nor the mesh change.
    pub fn rotate_along_z_axis(&mut self, angle: f32) -> Result<(), MeshError> {
        let (sin, cos) = angle.sin_cos();
        let mut rotated = self.base.geometry.data.clone();
        for row in rotated.iter_mut() {
            if let [x, y, ..] = row.as_mut_slice() {
                let (x0, y0) = (*x, *y);
                *x = x0 * cos - y0 * sin;
                *y = x0 * sin + y0 * cos;
            }
        }
        let updated = self.write_positions(&rotated)?;
        self.base.geometry.data = rotated;
        if updated {
            self.notify_positions_changed();
        }
        Ok(())
    }

    /// Rewrites the instanced positions from `data` and notifies containers.
    pub fn update_geometry(&mut self) -> Result<(), MeshError> {
        let rows = std::mem::take(&mut self.base.geometry.data);
        let updated = self.write_positions(&rows);
        self.base.geometry.data = rows;
        if updated? {
            self.notify_positions_changed();
        }
        Ok(())
    }

    /// Returns `Ok(false)` when no geometry has been generated yet.
    fn write_positions(&mut self, rows: &[Vec<f32>]) -> Result<bool, MeshError> {
        let positions = flatten(rows);
        let Some(mesh) = self.base.geometry.mesh_mut(GROUP_ID, MESH_ID) else {
            log::debug!("{}: no geometry generated yet, skipping update", self.base.id);
            return Ok(false);
        };
        mesh.update_attribute(AttributeId::InstancedPosition, &positions)?;
        Ok(true)
    }

    fn notify_positions_changed(&mut self) {
        self.notify_data_change(GROUP_ID, MESH_ID, AttributeId::InstancedPosition);
    }
}

impl Layer for Scatterplot3D {
    fn base(&self) -> &LayerBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut LayerBase {
        &mut self.base
    }

    fn generate_geometry(&mut self) -> Result<(), MeshError> {
        let geometry = &self.base.geometry;
        let spheres = Mesh::instanced_spheres(
            &self.base.id,
            &flatten(geometry.data.as_slice()),
            &flatten(geometry.color.as_slice()),
            &geometry.size,
        )?;
        self.base.geometry.default_group_mut().meshes.push(spheres);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Scatterplot3D {
        Scatterplot3D::new(
            "points",
            vec![vec![1.0, 0.0, 0.5], vec![0.0, 2.0, -0.5]],
            vec![vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0, 1.0]],
            vec![0.1, 0.2],
        )
    }

    #[test]
    fn rotation_uses_original_coordinates() {
        let mut layer = points();
        layer.generate_geometry().unwrap();
        layer.rotate_along_z_axis(std::f32::consts::FRAC_PI_2).unwrap();

        let data = layer.data();
        assert!((data[0][0] - 0.0).abs() < 1e-6);
        assert!((data[0][1] - 1.0).abs() < 1e-6);
        assert!((data[1][0] + 2.0).abs() < 1e-6);
        assert!((data[1][1] - 0.0).abs() < 1e-6);
        assert_eq!(data[1][2], -0.5);

        let mesh = layer.geometry().mesh(0, 0).unwrap();
        let positions = mesh.attribute(AttributeId::InstancedPosition).unwrap();
        assert!((positions[1] - 1.0).abs() < 1e-6);
        assert!((positions[3] + 2.0).abs() < 1e-6);
    }

    #[test]
    fn failed_rotation_leaves_rows_and_mesh_alone() {
        let mut layer = points();
        layer.generate_geometry().unwrap();
        layer.base.geometry.data[1].pop();
        let rows = layer.data().to_vec();
        let before = layer
            .geometry()
            .mesh(0, 0)
            .and_then(|m| m.attribute(AttributeId::InstancedPosition))
            .unwrap()
            .to_vec();

        let err = layer.rotate_along_z_axis(1.0).unwrap_err();

        assert!(matches!(err, MeshError::ShapeMismatch { .. }));
        assert_eq!(layer.data(), rows.as_slice());
        let after = layer
            .geometry()
            .mesh(0, 0)
            .and_then(|m| m.attribute(AttributeId::InstancedPosition))
            .unwrap();
        assert_eq!(after, before.as_slice());
    }

    #[test]
    fn update_before_generation_is_a_no_op() {
        let mut layer = points();
        assert!(layer.rotate_along_z_axis(0.3).is_ok());
        assert_eq!(layer.geometry().mesh_count(), 0);
    }
}
