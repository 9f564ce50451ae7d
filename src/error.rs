//! Error types shared by the data model and the renderer.
//!
//! Data-layer problems ([`MeshError`]) stay local to the offending scene
//! element. Resource-layer problems ([`RenderError`]) may be fatal for the
//! [`Renderer`](crate::renderer::Renderer) that hit them; see
//! [`RenderError::is_fatal`].

use thiserror::Error;

use crate::data_structures::mesh::AttributeId;

/// Errors raised while building or mutating abstract meshes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("attribute {attribute:?} expects {expected} values, got {actual}")]
    ShapeMismatch {
        attribute: AttributeId,
        expected: usize,
        actual: usize,
    },

    #[error("attribute {attribute:?} length {len} is not a multiple of {width}")]
    RaggedAttribute {
        attribute: AttributeId,
        len: usize,
        width: usize,
    },

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },

    #[error("{count} indices cannot form whole {primitive}")]
    IncompletePrimitive { count: usize, primitive: &'static str },

    #[error("mesh has no attribute {0:?}")]
    UnknownAttribute(AttributeId),

    #[error("invalid layer data: {0}")]
    InvalidData(String),

    #[error("container already holds a different layer with id {0:?}")]
    DuplicateLayer(String),
}

/// Errors raised by the renderer and its resource managers.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create render context: {0}")]
    ContextCreation(String),

    #[error("failed to create {resource}: {reason}")]
    ResourceCreation {
        resource: &'static str,
        reason: String,
    },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("buffer {0:?} not found")]
    BufferNotFound(String),

    #[error("buffer {id:?} holds {expected} elements, got {actual}")]
    BufferShapeMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("camera {0} not found")]
    CameraNotFound(usize),

    #[error("renderer is inactive after a previous fatal error")]
    Inactive,
}

impl RenderError {
    /// Whether the renderer that produced this error must stop drawing.
    pub fn is_fatal(&self) -> bool {
        match self {
            RenderError::ContextCreation(_)
            | RenderError::ResourceCreation { .. }
            | RenderError::Inactive => true,
            RenderError::Surface(e) => matches!(e, wgpu::SurfaceError::OutOfMemory),
            RenderError::Mesh(_)
            | RenderError::BufferNotFound(_)
            | RenderError::BufferShapeMismatch { .. }
            | RenderError::CameraNotFound(_) => false,
        }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
