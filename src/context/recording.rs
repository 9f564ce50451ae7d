//! A [`RenderContext`] that talks to no GPU and records every command.
//!
//! Handles are plain indices into the recorder's own tables, so the full
//! draw protocol (buffer uploads, passes, clears, draws and compositing) can
//! be inspected without a device.

use crate::{
    context::{
        BufferDescriptor, BufferKind, DrawCall, DrawUniforms, PassState, ProgramDescriptor,
        RenderContext,
    },
    error::{RenderError, RenderResult},
    pipelines::VertexLayout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedBuffer(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedProgram(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedFramebuffer(pub usize);

/// A draw as the recorder saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub label: String,
    pub program: RecordedProgram,
    pub topology: wgpu::PrimitiveTopology,
    pub vertex_buffers: Vec<RecordedBuffer>,
    pub index_buffer: RecordedBuffer,
    pub index_count: u32,
    pub instance_count: u32,
    pub uniforms: DrawUniforms,
    pub texture: Option<RecordedFramebuffer>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateBuffer {
        buffer: RecordedBuffer,
        label: String,
        kind: BufferKind,
        len: usize,
    },
    WriteBuffer {
        buffer: RecordedBuffer,
        len: usize,
    },
    CreateProgram {
        program: RecordedProgram,
        label: String,
        layout: VertexLayout,
    },
    CreateFramebuffer {
        framebuffer: RecordedFramebuffer,
        width: u32,
        height: u32,
    },
    BeginPass {
        target: Option<RecordedFramebuffer>,
        state: PassState,
    },
    Draw(DrawRecord),
    FinishFrame,
}

#[derive(Debug, Default)]
pub struct RecordingContext {
    pub size: (u32, u32),
    pub commands: Vec<Command>,
    buffers: Vec<Vec<u8>>,
    programs: usize,
    framebuffers: usize,
    /// Makes every following framebuffer allocation fail.
    pub fail_framebuffers: bool,
    /// Makes every following frame submission fail with this surface error.
    pub fail_frames: Option<wgpu::SurfaceError>,
}

impl RecordingContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Default::default()
        }
    }

    /// Current contents of a buffer.
    pub fn buffer_data(&self, buffer: RecordedBuffer) -> Option<&[u8]> {
        self.buffers.get(buffer.0).map(Vec::as_slice)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn passes(&self) -> impl Iterator<Item = (&Option<RecordedFramebuffer>, &PassState)> {
        self.commands.iter().filter_map(|c| match c {
            Command::BeginPass { target, state } => Some((target, state)),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl RenderContext for RecordingContext {
    type Buffer = RecordedBuffer;
    type Program = RecordedProgram;
    type Framebuffer = RecordedFramebuffer;

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<RecordedBuffer> {
        let buffer = RecordedBuffer(self.buffers.len());
        self.buffers.push(desc.contents.to_vec());
        self.commands.push(Command::CreateBuffer {
            buffer,
            label: desc.label.to_owned(),
            kind: desc.kind,
            len: desc.contents.len(),
        });
        Ok(buffer)
    }

    fn write_buffer(&mut self, buffer: &RecordedBuffer, data: &[u8]) -> RenderResult<()> {
        let stored = self
            .buffers
            .get_mut(buffer.0)
            .ok_or_else(|| RenderError::BufferNotFound(format!("#{}", buffer.0)))?;
        if data.len() > stored.len() {
            return Err(RenderError::ResourceCreation {
                resource: "buffer write",
                reason: format!("{} bytes into a {} byte buffer", data.len(), stored.len()),
            });
        }
        stored[..data.len()].copy_from_slice(data);
        self.commands.push(Command::WriteBuffer {
            buffer: *buffer,
            len: data.len(),
        });
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> RenderResult<RecordedProgram> {
        let program = RecordedProgram(self.programs);
        self.programs += 1;
        self.commands.push(Command::CreateProgram {
            program,
            label: desc.label.to_owned(),
            layout: desc.layout,
        });
        Ok(program)
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> RenderResult<RecordedFramebuffer> {
        if self.fail_framebuffers {
            return Err(RenderError::ResourceCreation {
                resource: "framebuffer",
                reason: "allocation disabled".to_owned(),
            });
        }
        let framebuffer = RecordedFramebuffer(self.framebuffers);
        self.framebuffers += 1;
        self.commands.push(Command::CreateFramebuffer {
            framebuffer,
            width,
            height,
        });
        Ok(framebuffer)
    }

    fn begin_pass(&mut self, target: Option<&RecordedFramebuffer>, state: &PassState) {
        self.commands.push(Command::BeginPass {
            target: target.copied(),
            state: *state,
        });
    }

    fn draw(&mut self, call: DrawCall<'_, Self>) {
        self.commands.push(Command::Draw(DrawRecord {
            label: call.label.to_owned(),
            program: *call.program,
            topology: call.topology,
            vertex_buffers: call.vertex_buffers.into_iter().copied().collect(),
            index_buffer: *call.index_buffer,
            index_count: call.index_count,
            instance_count: call.instance_count,
            uniforms: call.uniforms,
            texture: call.texture.copied(),
        }));
    }

    fn finish_frame(&mut self) -> RenderResult<()> {
        if let Some(err) = self.fail_frames.clone() {
            return Err(RenderError::Surface(err));
        }
        self.commands.push(Command::FinishFrame);
        Ok(())
    }
}
