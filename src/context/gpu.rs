//! wgpu implementation of [`RenderContext`].
//!
//! Passes and draws are recorded as they are issued and encoded in
//! [`finish_frame`](RenderContext::finish_frame), so callers never hold a live
//! `wgpu::RenderPass`. Uniforms for every draw of a frame share one buffer and
//! are addressed with dynamic offsets.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context as _, Result};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    context::{
        BufferDescriptor, BufferKind, DrawCall, DrawUniforms, PassState, ProgramDescriptor,
        RenderContext,
    },
    data_structures::texture::Texture,
    error::{RenderError, RenderResult},
    pipelines::{self, VertexLayout, basic, screen},
};

/// Maps OpenGL clip-space depth (`-1..1`) onto wgpu's `0..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuProgram(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuFramebuffer(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: usize,
    topology: wgpu::PrimitiveTopology,
    depth_test: bool,
}

#[derive(Debug)]
struct ProgramEntry {
    module: wgpu::ShaderModule,
    layout: VertexLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

#[derive(Debug)]
struct FramebufferEntry {
    color: Texture,
    depth: Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
struct RecordedDraw {
    program: usize,
    topology: wgpu::PrimitiveTopology,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_count: u32,
    uniform_offset: u32,
    texture: Option<usize>,
}

#[derive(Debug)]
struct RecordedPass {
    target: Option<usize>,
    clear: wgpu::Color,
    depth_test: bool,
    draws: Vec<RecordedDraw>,
}

#[derive(Debug)]
enum Screen {
    Window {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    /// Off-screen stand-in for the swapchain.
    Headless(Texture),
}

#[derive(Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    screen: Screen,
    format: wgpu::TextureFormat,
    size: (u32, u32),
    depth_texture: Texture,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_staging: Vec<u8>,
    programs: Vec<ProgramEntry>,
    framebuffers: Vec<FramebufferEntry>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    passes: Vec<RecordedPass>,
}

fn mk_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        #[cfg(not(target_arch = "wasm32"))]
        backends: wgpu::Backends::PRIMARY,
        #[cfg(target_arch = "wasm32")]
        backends: wgpu::Backends::GL,
        ..Default::default()
    })
}

async fn request_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;
    log::info!("Using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("layer-ngin device"),
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults()
            } else {
                wgpu::Limits::default()
            },
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;
    Ok((adapter, device, queue))
}

impl GpuContext {
    /// Creates a context that presents to `window`.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        let instance = mk_instance();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Shaders output linear colour, so prefer an sRGB surface.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let screen = Screen::Window {
            window,
            surface,
            config,
        };
        Ok(Self::with_screen(
            device,
            queue,
            screen,
            format,
            (size.width.max(1), size.height.max(1)),
        ))
    }

    /// Creates a context that renders into an internal texture instead of a
    /// window.
    pub async fn headless(width: u32, height: u32) -> Result<Self> {
        let instance = mk_instance();
        let (_, device, queue) = request_device(&instance, None).await?;
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let size = (width.max(1), height.max(1));
        let target = Texture::create_render_target(&device, [size.0, size.1], format, "screen");
        Ok(Self::with_screen(
            device,
            queue,
            Screen::Headless(target),
            format,
            size,
        ))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_blocking(window: Arc<Window>) -> Result<Self> {
        futures::executor::block_on(Self::new(window))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn headless_blocking(width: u32, height: u32) -> Result<Self> {
        futures::executor::block_on(Self::headless(width, height))
    }

    fn with_screen(
        device: wgpu::Device,
        queue: wgpu::Queue,
        screen: Screen,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        let depth_texture = Texture::create_depth_texture(&device, [size.0, size.1], "depth_texture");
        let uniform_layout = basic::uniform_bind_group_layout(&device);
        let texture_layout = screen::texture_bind_group_layout(&device);

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = UNIFORM_SIZE.div_ceil(alignment) * alignment;
        let (uniform_buffer, uniform_bind_group) =
            mk_uniform_buffer(&device, &uniform_layout, uniform_stride * 64);

        log::info!("Render context ready: {}x{} {:?}", size.0, size.1, format);
        Self {
            device,
            queue,
            screen,
            format,
            size,
            depth_texture,
            uniform_layout,
            texture_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_staging: Vec::new(),
            programs: Vec::new(),
            framebuffers: Vec::new(),
            pipelines: HashMap::new(),
            passes: Vec::new(),
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        match &self.screen {
            Screen::Window { window, .. } => Some(window),
            Screen::Headless(_) => None,
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Reconfigures the screen target. A zero-sized request is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        match &mut self.screen {
            Screen::Window {
                surface, config, ..
            } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            Screen::Headless(target) => {
                *target = Texture::create_render_target(
                    &self.device,
                    [width, height],
                    self.format,
                    "screen",
                );
            }
        }
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    fn reconfigure_after(&self, err: &wgpu::SurfaceError) {
        if let Screen::Window {
            surface, config, ..
        } = &self.screen
        {
            if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                log::warn!("Surface {:?}, reconfiguring", err);
                surface.configure(&self.device, config);
            }
        }
    }

    fn ensure_uniform_capacity(&mut self, needed: u64) {
        if needed <= self.uniform_buffer.size() {
            return;
        }
        let size = needed.next_power_of_two();
        log::debug!("Growing uniform buffer to {} bytes", size);
        let (buffer, bind_group) = mk_uniform_buffer(&self.device, &self.uniform_layout, size);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(program) = self.programs.get(key.program) else {
            return;
        };
        let blend = match program.layout {
            VertexLayout::ScreenQuad => wgpu::BlendState::REPLACE,
            VertexLayout::Basic | VertexLayout::Instanced => basic::BLEND,
        };
        let pipeline = pipelines::mk_render_pipeline(
            &self.device,
            &program.pipeline_layout,
            &program.module,
            self.format,
            Some(blend),
            &program.layout.buffers(),
            key.topology,
            key.depth_test,
        );
        self.pipelines.insert(key, pipeline);
    }
}

fn mk_uniform_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    size: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw Uniform Buffer"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(UNIFORM_SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

impl RenderContext for GpuContext {
    type Buffer = wgpu::Buffer;
    type Program = GpuProgram;
    type Framebuffer = GpuFramebuffer;

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>) -> RenderResult<wgpu::Buffer> {
        let usage = match desc.kind {
            BufferKind::Vertex { .. } => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(desc.label),
                contents: desc.contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            }))
    }

    fn write_buffer(&mut self, buffer: &wgpu::Buffer, data: &[u8]) -> RenderResult<()> {
        if data.len() as u64 > buffer.size() {
            return Err(RenderError::ResourceCreation {
                resource: "buffer write",
                reason: format!("{} bytes into a {} byte buffer", data.len(), buffer.size()),
            });
        }
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if data.len() % align == 0 {
            self.queue.write_buffer(buffer, 0, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(data.len().next_multiple_of(align), 0);
            self.queue.write_buffer(buffer, 0, &padded);
        }
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> RenderResult<GpuProgram> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = if desc.layout.samples_texture() {
            vec![&self.uniform_layout, &self.texture_layout]
        } else {
            vec![&self.uniform_layout]
        };
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });
        self.programs.push(ProgramEntry {
            module,
            layout: desc.layout,
            pipeline_layout,
        });
        Ok(GpuProgram(self.programs.len() - 1))
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> RenderResult<GpuFramebuffer> {
        if width == 0 || height == 0 {
            return Err(RenderError::ResourceCreation {
                resource: "framebuffer",
                reason: format!("invalid size {width}x{height}"),
            });
        }
        let label = format!("framebuffer_{}", self.framebuffers.len());
        let color = Texture::create_render_target(&self.device, [width, height], self.format, &label);
        let depth = Texture::create_depth_texture(&self.device, [width, height], &label);
        let sampler = color.sampler.clone().ok_or_else(|| RenderError::ResourceCreation {
            resource: "framebuffer",
            reason: "render target has no sampler".to_owned(),
        })?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&label),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        self.framebuffers.push(FramebufferEntry {
            color,
            depth,
            bind_group,
        });
        Ok(GpuFramebuffer(self.framebuffers.len() - 1))
    }

    fn begin_pass(&mut self, target: Option<&GpuFramebuffer>, state: &PassState) {
        self.passes.push(RecordedPass {
            target: target.map(|fb| fb.0),
            clear: state.clear,
            depth_test: state.depth_test,
            draws: Vec::new(),
        });
    }

    fn draw(&mut self, call: DrawCall<'_, Self>) {
        let samples_texture = self
            .programs
            .get(call.program.0)
            .is_some_and(|p| p.layout.samples_texture());
        if samples_texture && call.texture.is_none() {
            log::warn!("{}: program samples a texture but none was given", call.label);
            return;
        }
        let uniform_offset = self.uniform_staging.len() as u64;
        let Some(pass) = self.passes.last_mut() else {
            log::warn!("{}: draw issued outside of a pass", call.label);
            return;
        };

        let mut uniforms = call.uniforms;
        uniforms.view_proj =
            (OPENGL_TO_WGPU_MATRIX * cgmath::Matrix4::from(uniforms.view_proj)).into();
        self.uniform_staging
            .extend_from_slice(bytemuck::bytes_of(&uniforms));
        self.uniform_staging
            .resize((uniform_offset + self.uniform_stride) as usize, 0);

        pass.draws.push(RecordedDraw {
            program: call.program.0,
            topology: call.topology,
            vertex_buffers: call.vertex_buffers.into_iter().cloned().collect(),
            index_buffer: call.index_buffer.clone(),
            index_count: call.index_count,
            instance_count: call.instance_count,
            uniform_offset: uniform_offset as u32,
            texture: call.texture.map(|fb| fb.0),
        });
    }

    fn finish_frame(&mut self) -> RenderResult<()> {
        let passes = std::mem::take(&mut self.passes);
        let staging = std::mem::take(&mut self.uniform_staging);
        if passes.is_empty() {
            return Ok(());
        }

        self.ensure_uniform_capacity(staging.len() as u64);
        if !staging.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &staging);
        }
        for pass in &passes {
            for draw in &pass.draws {
                self.ensure_pipeline(PipelineKey {
                    program: draw.program,
                    topology: draw.topology,
                    depth_test: pass.depth_test,
                });
            }
        }

        let acquired = match &self.screen {
            Screen::Window { surface, .. } => Some(surface.get_current_texture()),
            Screen::Headless(_) => None,
        };
        let surface_texture = match acquired {
            Some(Ok(texture)) => Some(texture),
            Some(Err(e)) => {
                self.reconfigure_after(&e);
                return Err(RenderError::Surface(e));
            }
            None => None,
        };
        let screen_view = match (&surface_texture, &self.screen) {
            (Some(texture), _) => texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            (None, Screen::Headless(target)) => target.view.clone(),
            (None, Screen::Window { .. }) => return Ok(()),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        for pass in &passes {
            let (color_view, depth_view) = match pass.target {
                None => (&screen_view, &self.depth_texture.view),
                Some(i) => match self.framebuffers.get(i) {
                    Some(fb) => (&fb.color.view, &fb.depth.view),
                    None => {
                        log::warn!("Skipping pass into unknown framebuffer {}", i);
                        continue;
                    }
                },
            };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &pass.draws {
                let key = PipelineKey {
                    program: draw.program,
                    topology: draw.topology,
                    depth_test: pass.depth_test,
                };
                let Some(pipeline) = self.pipelines.get(&key) else {
                    continue;
                };
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                if let Some(fb) = draw.texture.and_then(|i| self.framebuffers.get(i)) {
                    rpass.set_bind_group(1, &fb.bind_group, &[]);
                }
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                rpass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..draw.index_count, 0, 0..draw.instance_count);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(texture) = surface_texture {
            if let Some(window) = self.window() {
                window.pre_present_notify();
            }
            texture.present();
        }
        Ok(())
    }
}
