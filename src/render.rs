//! The GPU-resident mirror of the abstract scene.
//!
//! [`RenderableGeometry`], [`RenderableGroup`] and [`RenderableMesh`] follow
//! [`Geometry`](crate::data_structures::geometry::Geometry), `Group` and
//! [`Mesh`] one to one, except that a renderable mesh only stores ids of
//! manager-owned buffers and programs.

use cgmath::Matrix4;

use crate::{
    camera::TransformMatrices,
    context::{DrawCall, DrawUniforms, RenderContext},
    data_structures::mesh::{AttributeId, INDEX_BUFFER_SUFFIX, Mesh, MeshData},
    error::RenderResult,
    resources::{BufferManager, IndexBufferId, ProgramId, ProgramManager, VertexBufferId},
};

/// Draw strategy of a renderable mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableKind {
    Triangles,
    Lines,
    InstancedTriangles,
}

impl RenderableKind {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            RenderableKind::Triangles | RenderableKind::InstancedTriangles => {
                wgpu::PrimitiveTopology::TriangleList
            }
            RenderableKind::Lines => wgpu::PrimitiveTopology::LineList,
        }
    }

    /// Indices per primitive.
    pub fn vertices_per_primitive(self) -> u32 {
        match self {
            RenderableKind::Lines => 2,
            RenderableKind::Triangles | RenderableKind::InstancedTriangles => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableMesh {
    pub id: String,
    pub kind: RenderableKind,
    pub model_matrix: Matrix4<f32>,
    pub program: ProgramId,
    /// Vertex buffers in slot order.
    vertex_buffers: Vec<(AttributeId, VertexBufferId)>,
    index_buffer: IndexBufferId,
    primitive_count: u32,
    instance_count: u32,
}

impl RenderableMesh {
    fn new<C: RenderContext>(
        kind: RenderableKind,
        mesh: &Mesh,
        program: ProgramId,
        ctx: &mut C,
        buffers: &mut BufferManager<C>,
    ) -> RenderResult<Self> {
        let data: &MeshData = mesh.data();
        let attributes: &[AttributeId] = match kind {
            RenderableKind::InstancedTriangles => &[
                AttributeId::Vertices,
                AttributeId::TexCoords,
                AttributeId::Color,
                AttributeId::InstancedPosition,
                AttributeId::InstancedColor,
                AttributeId::InstancedRadius,
            ],
            RenderableKind::Triangles | RenderableKind::Lines => &AttributeId::PER_VERTEX,
        };

        let mut vertex_buffers = Vec::with_capacity(attributes.len());
        for &attribute in attributes {
            let values = mesh.attribute(attribute).unwrap_or_default();
            let id = buffers.new_vertex_buffer(
                ctx,
                &format!("{}{}", data.id, attribute.buffer_suffix()),
                values,
                attribute.width() as u32,
                attribute.is_instanced(),
            )?;
            vertex_buffers.push((attribute, id));
        }
        let index_buffer = buffers.new_index_buffer(
            ctx,
            &format!("{}{}", data.id, INDEX_BUFFER_SUFFIX),
            &data.vertex_indices,
        )?;

        Ok(Self {
            id: data.id.clone(),
            kind,
            model_matrix: data.model_matrix,
            program,
            vertex_buffers,
            index_buffer,
            primitive_count: data.vertex_indices.len() as u32 / kind.vertices_per_primitive(),
            instance_count: mesh.instance_count() as u32,
        })
    }

    pub fn primitive_count(&self) -> u32 {
        self.primitive_count
    }

    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn vertex_buffer(&self, attribute: AttributeId) -> Option<VertexBufferId> {
        self.vertex_buffers
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, id)| *id)
    }

    pub fn index_buffer(&self) -> IndexBufferId {
        self.index_buffer
    }

    /// Issues this mesh's draw into the current pass. Returns `false` when
    /// nothing was drawn.
    pub fn render<C: RenderContext>(
        &self,
        ctx: &mut C,
        buffers: &BufferManager<C>,
        programs: &ProgramManager<C>,
        matrices: &TransformMatrices,
    ) -> bool {
        if self.instance_count == 0 {
            log::warn!("{}: no instances, skipping draw", self.id);
            return false;
        }
        let Some(program) = programs.program(self.program) else {
            log::warn!("{}: program {:?} not found", self.id, self.program);
            return false;
        };
        let Some(index_buffer) = buffers.index_buffer(self.index_buffer) else {
            log::warn!("{}: index buffer {:?} not found", self.id, self.index_buffer);
            return false;
        };
        let mut vertex_buffers = Vec::with_capacity(self.vertex_buffers.len());
        for (attribute, id) in &self.vertex_buffers {
            match buffers.vertex_buffer(*id) {
                Some(buffer) => vertex_buffers.push(buffer),
                None => {
                    log::warn!("{}: {:?} buffer {:?} not found", self.id, attribute, id);
                    return false;
                }
            }
        }

        ctx.draw(DrawCall {
            label: &self.id,
            program,
            topology: self.kind.topology(),
            vertex_buffers,
            index_buffer,
            index_count: self.primitive_count * self.kind.vertices_per_primitive(),
            instance_count: self.instance_count,
            uniforms: DrawUniforms::new(self.model_matrix, matrices.view_projection),
            texture: None,
        });
        true
    }

    /// Re-uploads one attribute from the abstract mesh. Returns `Ok(false)`
    /// when this mesh has no buffer for `attribute`.
    pub fn update_attribute<C: RenderContext>(
        &self,
        attribute: AttributeId,
        mesh: &Mesh,
        ctx: &mut C,
        buffers: &mut BufferManager<C>,
    ) -> RenderResult<bool> {
        let (Some(id), Some(values)) = (self.vertex_buffer(attribute), mesh.attribute(attribute))
        else {
            log::debug!("{}: no {:?} attribute to update", self.id, attribute);
            return Ok(false);
        };
        buffers.update_vertex_buffer(ctx, id, values)?;
        Ok(true)
    }
}

/// Translates one abstract mesh. Kinds without a translation yield `None`
/// and are logged.
pub fn generate_renderable_mesh<C: RenderContext>(
    mesh: &Mesh,
    ctx: &mut C,
    buffers: &mut BufferManager<C>,
    programs: &mut ProgramManager<C>,
) -> RenderResult<Option<RenderableMesh>> {
    let renderable = match mesh {
        Mesh::Triangles(_) => {
            let program = programs.default_program(ctx)?;
            RenderableMesh::new(RenderableKind::Triangles, mesh, program, ctx, buffers)?
        }
        Mesh::Lines(_) => {
            let program = programs.default_program(ctx)?;
            RenderableMesh::new(RenderableKind::Lines, mesh, program, ctx, buffers)?
        }
        Mesh::InstancedSpheres { .. } => {
            let program = programs.instanced_program(ctx)?;
            RenderableMesh::new(RenderableKind::InstancedTriangles, mesh, program, ctx, buffers)?
        }
        Mesh::Custom { kind, data } => {
            log::warn!("Unknown type of mesh {:?} ({}), dropping it", kind, data.id);
            return Ok(None);
        }
    };
    Ok(Some(renderable))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableGroup {
    pub meshes: Vec<RenderableMesh>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableGeometry {
    /// Id of the layer this geometry mirrors.
    pub id: String,
    pub hidden: bool,
    pub groups: Vec<RenderableGroup>,
}

impl RenderableGeometry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hidden: false,
            groups: Vec::new(),
        }
    }

    pub fn meshes(&self) -> impl Iterator<Item = &RenderableMesh> {
        self.groups.iter().flat_map(|g| g.meshes.iter())
    }

    pub fn mesh(&self, group_id: usize, mesh_id: usize) -> Option<&RenderableMesh> {
        self.groups.get(group_id)?.meshes.get(mesh_id)
    }
}
