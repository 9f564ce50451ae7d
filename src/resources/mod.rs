//! Per-renderer registries that own every GPU-side resource.
//!
//! Scene nodes never hold backend handles. They keep the typed indices below
//! and resolve them through the owning manager, which lets the renderable
//! tree be discarded and rebuilt while buffers stay addressable by id.

pub mod buffer;
pub mod camera;
pub mod framebuffer;
pub mod program;

pub use buffer::BufferManager;
pub use camera::CameraManager;
pub use framebuffer::FramebufferManager;
pub use program::ProgramManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraId(pub usize);

/// Where a camera draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderTarget {
    #[default]
    Screen,
    Offscreen(FramebufferId),
}
