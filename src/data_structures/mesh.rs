//! Abstract meshes: API-independent vertex and index arrays.
//!
//! A [`Mesh`] is the smallest unit a layer hands to the renderer. It carries
//! plain `f32`/`u16` arrays and never touches the GPU; the renderer later
//! translates every mesh into a [`RenderableMesh`](crate::render::RenderableMesh).
//!
//! Three kinds are understood by the renderer: [`Mesh::Triangles`],
//! [`Mesh::Lines`] and [`Mesh::InstancedSpheres`]. [`Mesh::Custom`] lets a layer
//! author a kind the renderer has no translation for; such meshes are dropped
//! from the renderable tree with a warning.

use cgmath::{Matrix4, SquareMatrix};

use crate::error::MeshError;

/// `X` coordinate of the unit icosahedron used as the sphere stamp.
pub const ICOSAHEDRON_X: f32 = 0.525731112119133606;
/// `Z` coordinate of the unit icosahedron used as the sphere stamp.
pub const ICOSAHEDRON_Z: f32 = 0.850650808352039932;

const X: f32 = ICOSAHEDRON_X;
const Z: f32 = ICOSAHEDRON_Z;

/// The 12 icosahedron vertices, three floats each.
#[rustfmt::skip]
pub const ICOSAHEDRON_VERTICES: [f32; 36] = [
    -X, 0.0, Z,   X, 0.0, Z,   -X, 0.0, -Z,   X, 0.0, -Z,
    0.0, Z, X,   0.0, Z, -X,   0.0, -Z, X,   0.0, -Z, -X,
    Z, X, 0.0,   -Z, X, 0.0,   Z, -X, 0.0,   -Z, -X, 0.0,
];

/// The 20 icosahedron faces.
#[rustfmt::skip]
pub const ICOSAHEDRON_INDICES: [u16; 60] = [
    0, 4, 1,   0, 9, 4,   9, 5, 4,   4, 5, 8,   4, 8, 1,
    8, 10, 1,  8, 3, 10,  5, 3, 8,   5, 2, 3,   2, 7, 3,
    7, 10, 3,  7, 6, 10,  7, 11, 6,  11, 0, 6,  0, 1, 6,
    6, 1, 10,  9, 0, 11,  9, 11, 2,  9, 2, 5,   7, 2, 11,
];

const ICOSAHEDRON_VERTEX_COUNT: usize = ICOSAHEDRON_VERTICES.len() / 3;

/// Names a per-vertex or per-instance attribute of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    Vertices,
    TexCoords,
    Color,
    InstancedPosition,
    InstancedColor,
    InstancedRadius,
}

impl AttributeId {
    pub const PER_VERTEX: [AttributeId; 3] = [
        AttributeId::Vertices,
        AttributeId::TexCoords,
        AttributeId::Color,
    ];
    pub const PER_INSTANCE: [AttributeId; 3] = [
        AttributeId::InstancedPosition,
        AttributeId::InstancedColor,
        AttributeId::InstancedRadius,
    ];

    /// Number of floats per element.
    pub const fn width(self) -> usize {
        match self {
            AttributeId::Vertices | AttributeId::InstancedPosition => 3,
            AttributeId::TexCoords => 2,
            AttributeId::Color | AttributeId::InstancedColor => 4,
            AttributeId::InstancedRadius => 1,
        }
    }

    /// Suffix appended to a mesh id to name the buffer backing this attribute.
    pub const fn buffer_suffix(self) -> &'static str {
        match self {
            AttributeId::Vertices => "_vertex_position",
            AttributeId::TexCoords => "_vertex_tex_coord",
            AttributeId::Color => "_vertex_color",
            AttributeId::InstancedPosition => "_instanced_position",
            AttributeId::InstancedColor => "_instanced_color",
            AttributeId::InstancedRadius => "_instanced_radius",
        }
    }

    pub const fn is_instanced(self) -> bool {
        matches!(
            self,
            AttributeId::InstancedPosition
                | AttributeId::InstancedColor
                | AttributeId::InstancedRadius
        )
    }
}

/// Suffix of the index buffer belonging to a mesh.
pub const INDEX_BUFFER_SUFFIX: &str = "_vertex_index";

/// Per-vertex arrays shared by every mesh kind.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub id: String,
    pub vertices: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub color: Vec<f32>,
    pub vertex_indices: Vec<u16>,
    pub model_matrix: Matrix4<f32>,
}

impl MeshData {
    /// Validates and copies raw arrays into a mesh body.
    ///
    /// `tex_coords` and `color` must describe exactly as many vertices as
    /// `vertices` and every index must point at an existing vertex.
    pub fn new(
        id: impl Into<String>,
        vertices: &[f32],
        tex_coords: &[f32],
        color: &[f32],
        vertex_indices: &[u16],
    ) -> Result<Self, MeshError> {
        let vertex_count = count_elements(AttributeId::Vertices, vertices)?;
        for (attribute, values) in [
            (AttributeId::TexCoords, tex_coords),
            (AttributeId::Color, color),
        ] {
            let count = count_elements(attribute, values)?;
            if count != vertex_count {
                return Err(MeshError::ShapeMismatch {
                    attribute,
                    expected: vertex_count * attribute.width(),
                    actual: values.len(),
                });
            }
        }
        if let Some(&index) = vertex_indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(Self {
            id: id.into(),
            vertices: vertices.to_vec(),
            tex_coords: tex_coords.to_vec(),
            color: color.to_vec(),
            vertex_indices: vertex_indices.to_vec(),
            model_matrix: Matrix4::identity(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / AttributeId::Vertices.width()
    }

    fn attribute(&self, attribute: AttributeId) -> Option<&[f32]> {
        match attribute {
            AttributeId::Vertices => Some(&self.vertices),
            AttributeId::TexCoords => Some(&self.tex_coords),
            AttributeId::Color => Some(&self.color),
            _ => None,
        }
    }

    fn attribute_mut(&mut self, attribute: AttributeId) -> Option<&mut Vec<f32>> {
        match attribute {
            AttributeId::Vertices => Some(&mut self.vertices),
            AttributeId::TexCoords => Some(&mut self.tex_coords),
            AttributeId::Color => Some(&mut self.color),
            _ => None,
        }
    }
}

/// Per-instance arrays of an instanced mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub radii: Vec<f32>,
}

impl InstanceData {
    /// All three arrays must describe the same number of instances.
    pub fn new(positions: &[f32], colors: &[f32], radii: &[f32]) -> Result<Self, MeshError> {
        let count = count_elements(AttributeId::InstancedPosition, positions)?;
        for (attribute, values) in [
            (AttributeId::InstancedColor, colors),
            (AttributeId::InstancedRadius, radii),
        ] {
            if count_elements(attribute, values)? != count {
                return Err(MeshError::ShapeMismatch {
                    attribute,
                    expected: count * attribute.width(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            positions: positions.to_vec(),
            colors: colors.to_vec(),
            radii: radii.to_vec(),
        })
    }

    pub fn instance_count(&self) -> usize {
        self.positions.len() / AttributeId::InstancedPosition.width()
    }

    fn attribute(&self, attribute: AttributeId) -> Option<&[f32]> {
        match attribute {
            AttributeId::InstancedPosition => Some(&self.positions),
            AttributeId::InstancedColor => Some(&self.colors),
            AttributeId::InstancedRadius => Some(&self.radii),
            _ => None,
        }
    }

    fn attribute_mut(&mut self, attribute: AttributeId) -> Option<&mut Vec<f32>> {
        match attribute {
            AttributeId::InstancedPosition => Some(&mut self.positions),
            AttributeId::InstancedColor => Some(&mut self.colors),
            AttributeId::InstancedRadius => Some(&mut self.radii),
            _ => None,
        }
    }
}

/// An abstract drawable primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Mesh {
    /// Indexed triangles, three indices per face.
    Triangles(MeshData),
    /// Indexed line segments, two indices per segment.
    Lines(MeshData),
    /// An icosahedron stamped once per instance, scaled by the instance radius.
    InstancedSpheres {
        base: MeshData,
        instances: InstanceData,
    },
    /// A mesh kind without a renderer translation.
    Custom { kind: String, data: MeshData },
}

impl Mesh {
    pub const TRIANGLES_PREFIX: &'static str = "triangles_";
    pub const LINES_PREFIX: &'static str = "line_";
    pub const INSTANCED_SPHERES_PREFIX: &'static str = "instanced_sphere_";

    /// Builds a triangle mesh whose id becomes `triangles_<id>`.
    pub fn triangles(
        id: &str,
        vertices: &[f32],
        tex_coords: &[f32],
        color: &[f32],
        vertex_indices: &[u16],
    ) -> Result<Self, MeshError> {
        check_primitive(vertex_indices.len(), 3, "triangles")?;
        let data = MeshData::new(
            format!("{}{}", Self::TRIANGLES_PREFIX, id),
            vertices,
            tex_coords,
            color,
            vertex_indices,
        )?;
        Ok(Mesh::Triangles(data))
    }

    /// Builds a line mesh whose id becomes `line_<id>`.
    pub fn lines(
        id: &str,
        vertices: &[f32],
        tex_coords: &[f32],
        color: &[f32],
        vertex_indices: &[u16],
    ) -> Result<Self, MeshError> {
        check_primitive(vertex_indices.len(), 2, "line segments")?;
        let data = MeshData::new(
            format!("{}{}", Self::LINES_PREFIX, id),
            vertices,
            tex_coords,
            color,
            vertex_indices,
        )?;
        Ok(Mesh::Lines(data))
    }

    /// Builds an instanced sphere mesh whose id becomes `instanced_sphere_<id>`.
    ///
    /// The base shape is always the 12-vertex icosahedron, whatever the
    /// instance count.
    pub fn instanced_spheres(
        id: &str,
        positions: &[f32],
        colors: &[f32],
        radii: &[f32],
    ) -> Result<Self, MeshError> {
        let instances = InstanceData::new(positions, colors, radii)?;
        let tex_coords = [0.0; ICOSAHEDRON_VERTEX_COUNT * 2];
        let color: Vec<f32> = [1.0, 0.0, 0.0, 1.0]
            .iter()
            .copied()
            .cycle()
            .take(ICOSAHEDRON_VERTEX_COUNT * 4)
            .collect();
        let base = MeshData::new(
            format!("{}{}", Self::INSTANCED_SPHERES_PREFIX, id),
            &ICOSAHEDRON_VERTICES,
            &tex_coords,
            &color,
            &ICOSAHEDRON_INDICES,
        )?;
        Ok(Mesh::InstancedSpheres { base, instances })
    }

    /// Wraps mesh data under a kind name the renderer does not know.
    pub fn custom(kind: impl Into<String>, data: MeshData) -> Self {
        Mesh::Custom {
            kind: kind.into(),
            data,
        }
    }

    pub fn id(&self) -> &str {
        &self.data().id
    }

    pub fn kind_name(&self) -> &str {
        match self {
            Mesh::Triangles(_) => "triangles",
            Mesh::Lines(_) => "lines",
            Mesh::InstancedSpheres { .. } => "instanced_spheres",
            Mesh::Custom { kind, .. } => kind,
        }
    }

    /// Shared per-vertex data (the base shape for instanced meshes).
    pub fn data(&self) -> &MeshData {
        match self {
            Mesh::Triangles(data) | Mesh::Lines(data) => data,
            Mesh::InstancedSpheres { base, .. } => base,
            Mesh::Custom { data, .. } => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut MeshData {
        match self {
            Mesh::Triangles(data) | Mesh::Lines(data) => data,
            Mesh::InstancedSpheres { base, .. } => base,
            Mesh::Custom { data, .. } => data,
        }
    }

    pub fn instances(&self) -> Option<&InstanceData> {
        match self {
            Mesh::InstancedSpheres { instances, .. } => Some(instances),
            _ => None,
        }
    }

    pub fn instance_count(&self) -> usize {
        self.instances().map_or(1, InstanceData::instance_count)
    }

    /// Returns the current values of `attribute`, if this mesh kind has it.
    pub fn attribute(&self, attribute: AttributeId) -> Option<&[f32]> {
        if attribute.is_instanced() {
            self.instances()?.attribute(attribute)
        } else {
            self.data().attribute(attribute)
        }
    }

    /// Overwrites `attribute` in place.
    ///
    /// The new data must have exactly the current length; the buffer count of
    /// the mesh never changes.
    pub fn update_attribute(&mut self, attribute: AttributeId, values: &[f32]) -> Result<(), MeshError> {
        let target = if attribute.is_instanced() {
            match self {
                Mesh::InstancedSpheres { instances, .. } => instances.attribute_mut(attribute),
                _ => None,
            }
        } else {
            self.data_mut().attribute_mut(attribute)
        };
        let target = target.ok_or(MeshError::UnknownAttribute(attribute))?;
        if target.len() != values.len() {
            return Err(MeshError::ShapeMismatch {
                attribute,
                expected: target.len(),
                actual: values.len(),
            });
        }
        target.copy_from_slice(values);
        Ok(())
    }
}

fn count_elements(attribute: AttributeId, values: &[f32]) -> Result<usize, MeshError> {
    let width = attribute.width();
    if values.len() % width != 0 {
        return Err(MeshError::RaggedAttribute {
            attribute,
            len: values.len(),
            width,
        });
    }
    Ok(values.len() / width)
}

fn check_primitive(count: usize, per: usize, primitive: &'static str) -> Result<(), MeshError> {
    if count % per != 0 {
        return Err(MeshError::IncompletePrimitive { count, primitive });
    }
    Ok(())
}
