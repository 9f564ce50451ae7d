//! Presentable form of a layer's data: groups of meshes plus the source arrays
//! they were generated from.

use crate::data_structures::mesh::Mesh;

/// An ordered run of meshes.
///
/// Meshes inside one group may be reordered by the renderer without changing
/// the picture; group order itself is draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub meshes: Vec<Mesh>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Generated geometry of one layer.
///
/// `data`, `tex_coords`, `color` and `size` keep the pre-transform arrays as
/// rows so a layer can regenerate or animate its meshes from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub groups: Vec<Group>,
    pub data: Vec<Vec<f32>>,
    pub tex_coords: Vec<Vec<f32>>,
    pub color: Vec<Vec<f32>>,
    pub size: Vec<f32>,
    pub vertex_indices: Vec<u16>,
    pub generated: bool,
    pub hidden: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            groups: vec![Group::new()],
            data: Vec::new(),
            tex_coords: Vec::new(),
            color: Vec::new(),
            size: Vec::new(),
            vertex_indices: Vec::new(),
            generated: false,
            hidden: false,
        }
    }
}

impl Geometry {
    /// A geometry with a single empty default group.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_group(&self) -> Option<&Group> {
        self.groups.first()
    }

    pub fn default_group_mut(&mut self) -> &mut Group {
        if self.groups.is_empty() {
            self.groups.push(Group::new());
        }
        &mut self.groups[0]
    }

    pub fn mesh(&self, group_id: usize, mesh_id: usize) -> Option<&Mesh> {
        self.groups.get(group_id)?.meshes.get(mesh_id)
    }

    pub fn mesh_mut(&mut self, group_id: usize, mesh_id: usize) -> Option<&mut Mesh> {
        self.groups.get_mut(group_id)?.meshes.get_mut(mesh_id)
    }

    pub fn mesh_count(&self) -> usize {
        self.groups.iter().map(|g| g.meshes.len()).sum()
    }
}
