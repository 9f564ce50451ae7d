//! The GPU surface collaborator.
//!
//! Everything the renderer needs from a graphics API is behind
//! [`RenderContext`]: create and fill buffers, compile programs, allocate
//! off-screen targets, begin cleared passes and issue indexed draws. The
//! resource managers in [`crate::resources`] are the only callers of the
//! allocation methods.
//!
//! - [`gpu::GpuContext`] drives wgpu, on a window surface or headless
//! - [`recording::RecordingContext`] records every command for inspection

pub mod gpu;
pub mod recording;

use crate::{error::RenderResult, pipelines::VertexLayout};

/// What a buffer is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Vertex data, `width` floats per element, stepping per instance if
    /// `instanced`.
    Vertex { width: u32, instanced: bool },
    /// `u16` indices.
    Index,
}

#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub contents: &'a [u8],
    pub kind: BufferKind,
}

#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    /// WGSL with `vs_main` and `fs_main` entry points.
    pub source: &'a str,
    pub layout: VertexLayout,
}

/// State applied when a pass begins: colour and depth are always cleared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassState {
    pub clear: wgpu::Color,
    pub depth_test: bool,
}

/// Per-draw uniform block, laid out for WGSL `mat4x4<f32>` pairs.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl DrawUniforms {
    pub fn new(model: cgmath::Matrix4<f32>, view_proj: cgmath::Matrix4<f32>) -> Self {
        Self {
            model: model.into(),
            view_proj: view_proj.into(),
        }
    }
}

/// One indexed draw into the current pass.
pub struct DrawCall<'a, C: RenderContext + ?Sized> {
    pub label: &'a str,
    pub program: &'a C::Program,
    pub topology: wgpu::PrimitiveTopology,
    /// Bound to slots `0..n` in order.
    pub vertex_buffers: Vec<&'a C::Buffer>,
    pub index_buffer: &'a C::Buffer,
    pub index_count: u32,
    pub instance_count: u32,
    pub uniforms: DrawUniforms,
    /// Off-screen colour attachment sampled by the program.
    pub texture: Option<&'a C::Framebuffer>,
}

/// Capabilities the renderer consumes from a graphics backend.
pub trait RenderContext {
    type Buffer;
    type Program;
    type Framebuffer;

    /// Drawable size in physical pixels.
    fn surface_size(&self) -> (u32, u32);

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<Self::Buffer>;

    /// Overwrites the buffer contents from offset zero.
    fn write_buffer(&mut self, buffer: &Self::Buffer, data: &[u8]) -> RenderResult<()>;

    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> RenderResult<Self::Program>;

    fn create_framebuffer(&mut self, width: u32, height: u32) -> RenderResult<Self::Framebuffer>;

    /// Binds `target` (the screen when `None`) and clears colour and depth.
    fn begin_pass(&mut self, target: Option<&Self::Framebuffer>, state: &PassState);

    fn draw(&mut self, call: DrawCall<'_, Self>);

    /// Submits everything recorded since the previous call.
    fn finish_frame(&mut self) -> RenderResult<()>;
}
