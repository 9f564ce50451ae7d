use crate::{
    context::{BufferDescriptor, BufferKind, RenderContext},
    error::{RenderError, RenderResult},
    resources::{IndexBufferId, VertexBufferId},
};

struct Slot<B> {
    id: String,
    buffer: B,
    /// Element count: floats for vertex buffers, indices for index buffers.
    len: usize,
}

/// Owns vertex and index buffers, addressable by index or by name.
///
/// Registering a buffer under a name that is already taken reuses that slot,
/// so a rebuilt scene gets the same ids and nothing is leaked.
pub struct BufferManager<C: RenderContext> {
    vertex_buffers: Vec<Slot<C::Buffer>>,
    index_buffers: Vec<Slot<C::Buffer>>,
}

impl<C: RenderContext> Default for BufferManager<C> {
    fn default() -> Self {
        Self {
            vertex_buffers: Vec::new(),
            index_buffers: Vec::new(),
        }
    }
}

impl<C: RenderContext> BufferManager<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_vertex_buffer(
        &mut self,
        ctx: &mut C,
        id: &str,
        data: &[f32],
        width: u32,
        instanced: bool,
    ) -> RenderResult<VertexBufferId> {
        let kind = BufferKind::Vertex { width, instanced };
        let slot = register(
            &mut self.vertex_buffers,
            ctx,
            id,
            bytemuck::cast_slice(data),
            data.len(),
            kind,
        )?;
        Ok(VertexBufferId(slot))
    }

    pub fn new_index_buffer(
        &mut self,
        ctx: &mut C,
        id: &str,
        data: &[u16],
    ) -> RenderResult<IndexBufferId> {
        let slot = register(
            &mut self.index_buffers,
            ctx,
            id,
            bytemuck::cast_slice(data),
            data.len(),
            BufferKind::Index,
        )?;
        Ok(IndexBufferId(slot))
    }

    /// Overwrites a vertex buffer in place; `data` must keep its length.
    pub fn update_vertex_buffer(
        &mut self,
        ctx: &mut C,
        id: VertexBufferId,
        data: &[f32],
    ) -> RenderResult<()> {
        let slot = self
            .vertex_buffers
            .get(id.0)
            .ok_or_else(|| RenderError::BufferNotFound(format!("#{}", id.0)))?;
        if slot.len != data.len() {
            return Err(RenderError::BufferShapeMismatch {
                id: slot.id.clone(),
                expected: slot.len,
                actual: data.len(),
            });
        }
        ctx.write_buffer(&slot.buffer, bytemuck::cast_slice(data))
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Option<&C::Buffer> {
        self.vertex_buffers.get(id.0).map(|s| &s.buffer)
    }

    pub fn index_buffer(&self, id: IndexBufferId) -> Option<&C::Buffer> {
        self.index_buffers.get(id.0).map(|s| &s.buffer)
    }

    pub fn index_count(&self, id: IndexBufferId) -> Option<usize> {
        self.index_buffers.get(id.0).map(|s| s.len)
    }

    pub fn vertex_buffer_by_name(&self, name: &str) -> Option<VertexBufferId> {
        find(&self.vertex_buffers, name).map(VertexBufferId)
    }

    pub fn index_buffer_by_name(&self, name: &str) -> Option<IndexBufferId> {
        find(&self.index_buffers, name).map(IndexBufferId)
    }

    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn index_buffer_count(&self) -> usize {
        self.index_buffers.len()
    }
}

fn find<B>(slots: &[Slot<B>], name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    slots.iter().position(|s| s.id == name)
}

fn register<C: RenderContext>(
    slots: &mut Vec<Slot<C::Buffer>>,
    ctx: &mut C,
    id: &str,
    bytes: &[u8],
    len: usize,
    kind: BufferKind,
) -> RenderResult<usize> {
    if let Some(i) = find(slots, id) {
        let slot = &mut slots[i];
        if slot.len == len {
            ctx.write_buffer(&slot.buffer, bytes)?;
        } else {
            slot.buffer = ctx.create_buffer(&BufferDescriptor {
                label: id,
                contents: bytes,
                kind,
            })?;
            slot.len = len;
        }
        log::debug!("Reused buffer slot {} for {:?}", i, id);
        return Ok(i);
    }
    let buffer = ctx.create_buffer(&BufferDescriptor {
        label: id,
        contents: bytes,
        kind,
    })?;
    slots.push(Slot {
        id: id.to_owned(),
        buffer,
        len,
    });
    Ok(slots.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::recording::{Command, RecordingContext};

    #[test]
    fn same_name_reuses_slot() {
        let mut ctx = RecordingContext::new(8, 8);
        let mut buffers = BufferManager::new();
        let a = buffers
            .new_vertex_buffer(&mut ctx, "quad_vertex_position", &[0.0; 12], 3, false)
            .unwrap();
        let b = buffers
            .new_vertex_buffer(&mut ctx, "quad_vertex_position", &[1.0; 12], 3, false)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(buffers.vertex_buffer_count(), 1);
        assert_eq!(ctx.buffer_count(), 1);
        assert_eq!(ctx.count(|c| matches!(c, Command::WriteBuffer { .. })), 1);
        assert_eq!(buffers.vertex_buffer_by_name("quad_vertex_position"), Some(a));
    }

    #[test]
    fn unnamed_buffers_never_alias() {
        let mut ctx = RecordingContext::new(8, 8);
        let mut buffers = BufferManager::new();
        let a = buffers.new_index_buffer(&mut ctx, "", &[0, 1]).unwrap();
        let b = buffers.new_index_buffer(&mut ctx, "", &[0, 1]).unwrap();
        assert_ne!(a, b);
        assert_eq!(buffers.index_buffer_by_name(""), None);
    }

    #[test]
    fn update_rejects_length_change() {
        let mut ctx = RecordingContext::new(8, 8);
        let mut buffers = BufferManager::new();
        let id = buffers
            .new_vertex_buffer(&mut ctx, "r", &[1.0, 2.0], 1, true)
            .unwrap();
        buffers.update_vertex_buffer(&mut ctx, id, &[3.0, 4.0]).unwrap();
        let stored = ctx.buffer_data(*buffers.vertex_buffer(id).unwrap()).unwrap();
        let floats: Vec<f32> = stored
            .chunks_exact(4)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect();
        assert_eq!(floats, vec![3.0, 4.0]);

        let err = buffers
            .update_vertex_buffer(&mut ctx, id, &[1.0])
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::BufferShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(buffers.vertex_buffer(VertexBufferId(9)).is_none());
    }
}
