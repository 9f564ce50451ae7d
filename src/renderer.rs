//! The view side of the engine.
//!
//! A [`Renderer`] owns a [`RenderContext`], the four resource managers and
//! the renderable tree built from a
//! [`Container`](crate::data_structures::container::Container). It tracks two
//! dirty flags: the container's `data_structure_changed`, cleared here after a
//! full rebuild, and `needs_redraw`, set whenever the picture may have changed
//! and cleared after a successful [`Renderer::render`].
//!
//! Every frame runs one pass per camera, in registration order. Cameras that
//! draw off-screen are followed by a compositing pass that copies their
//! colour target to the screen through a full-screen quad.

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    camera::{CameraDescriptor, CameraEvent, ProjectionType},
    config::RendererConfig,
    context::{DrawCall, DrawUniforms, RenderContext},
    data_structures::{
        container::Container,
        layer::DataChange,
        mesh::{AttributeId, INDEX_BUFFER_SUFFIX},
    },
    error::{RenderError, RenderResult},
    pipelines::screen::{SCREEN_QUAD_INDICES, SCREEN_QUAD_TEX_COORDS, SCREEN_QUAD_VERTICES},
    render::{RenderableGeometry, RenderableGroup, generate_renderable_mesh},
    resources::{
        BufferManager, CameraId, CameraManager, FramebufferId, FramebufferManager,
        ProgramManager, RenderTarget,
    },
};

/// Camera registration options. `width`/`height` default to the surface size
/// and only matter for the aspect ratio and the off-screen target.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraOptions {
    pub id: String,
    pub pos: [f32; 3],
    pub anchor: [f32; 3],
    pub up: [f32; 3],
    /// Radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Draw into an off-screen target and composite it to the screen.
    pub texture: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub projection: ProjectionType,
}

impl Default for CameraOptions {
    fn default() -> Self {
        let desc = CameraDescriptor::default();
        Self {
            id: desc.id,
            pos: desc.pos,
            anchor: desc.anchor,
            up: desc.up,
            fov_y: desc.fov_y,
            near: desc.near,
            far: desc.far,
            texture: false,
            width: None,
            height: None,
            projection: desc.projection,
        }
    }
}

pub struct Renderer<C: RenderContext> {
    ctx: C,
    config: RendererConfig,
    pub buffers: BufferManager<C>,
    pub programs: ProgramManager<C>,
    pub framebuffers: FramebufferManager<C>,
    pub cameras: CameraManager,
    renderable_geometries: Vec<RenderableGeometry>,
    pub needs_redraw: bool,
    frame_no: u64,
    active: bool,
}

impl<C: RenderContext> Renderer<C> {
    pub fn new(ctx: C, config: RendererConfig) -> Self {
        Self {
            buffers: BufferManager::new(),
            programs: ProgramManager::new(),
            framebuffers: FramebufferManager::new(&config),
            cameras: CameraManager::new(config.dolly_scale),
            renderable_geometries: Vec::new(),
            needs_redraw: false,
            frame_no: 0,
            active: true,
            ctx,
            config,
        }
    }

    /// Builds a renderer from the outcome of context creation, mapping a
    /// failure to [`RenderError::ContextCreation`].
    pub fn try_new(ctx: anyhow::Result<C>, config: RendererConfig) -> RenderResult<Self> {
        match ctx {
            Ok(ctx) => Ok(Self::new(ctx, config)),
            Err(e) => {
                log::error!("Context creation failed: {:#}", e);
                Err(RenderError::ContextCreation(format!("{e:#}")))
            }
        }
    }

    pub fn ctx(&self) -> &C {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn frame_no(&self) -> u64 {
        self.frame_no
    }

    /// `false` once a fatal resource error was hit; no more frames render.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    pub fn renderable_geometries(&self) -> &[RenderableGeometry] {
        &self.renderable_geometries
    }

    /// Linear scan by layer id.
    pub fn renderable_geometry_by_id(&self, id: &str) -> Option<&RenderableGeometry> {
        self.renderable_geometries.iter().find(|g| g.id == id)
    }

    fn check<T>(&mut self, result: RenderResult<T>) -> RenderResult<T> {
        if let Err(e) = &result {
            if e.is_fatal() && self.active {
                log::error!("Renderer deactivated: {}", e);
                self.active = false;
            }
        }
        result
    }

    /// Registers a perspective camera.
    pub fn new_perspective_camera(&mut self, options: CameraOptions) -> RenderResult<CameraId> {
        self.new_camera(CameraOptions {
            projection: ProjectionType::Perspective,
            ..options
        })
    }

    /// Registers a camera, allocating its off-screen target if requested.
    pub fn new_camera(&mut self, options: CameraOptions) -> RenderResult<CameraId> {
        if !self.active {
            return Err(RenderError::Inactive);
        }
        let (surface_w, surface_h) = self.ctx.surface_size();
        let width = options.width.unwrap_or(surface_w).max(1);
        let height = options.height.unwrap_or(surface_h).max(1);

        let target = if options.texture {
            let framebuffer = self.framebuffers.new_framebuffer(&mut self.ctx, width, height);
            RenderTarget::Offscreen(self.check(framebuffer)?)
        } else {
            RenderTarget::Screen
        };

        let id = self.cameras.new_camera(
            CameraDescriptor {
                id: options.id,
                pos: options.pos,
                anchor: options.anchor,
                up: options.up,
                fov_y: options.fov_y,
                aspect: width as f32 / height as f32,
                near: options.near,
                far: options.far,
                projection: options.projection,
            },
            target,
        );
        self.needs_redraw = true;
        Ok(id)
    }

    /// Rebuilds the whole renderable tree when the container's structure
    /// changed. Returns whether a rebuild happened.
    ///
    /// Layers are visited in layer order, then groups, then meshes; that is
    /// also the draw order.
    pub fn regenerate_renderable_geometries(
        &mut self,
        container: &mut Container,
    ) -> RenderResult<bool> {
        if !container.data_structure_changed {
            return Ok(false);
        }
        if !self.active {
            return Err(RenderError::Inactive);
        }
        let rebuilt = self.build_renderable_geometries(container);
        let geometries = self.check(rebuilt)?;
        log::debug!(
            "Regenerated {} renderable geometries with {} meshes",
            geometries.len(),
            geometries.iter().map(|g| g.meshes().count()).sum::<usize>()
        );
        self.renderable_geometries = geometries;
        container.data_structure_changed = false;
        self.needs_redraw = true;
        Ok(true)
    }

    fn build_renderable_geometries(
        &mut self,
        container: &Container,
    ) -> RenderResult<Vec<RenderableGeometry>> {
        let mut geometries = Vec::with_capacity(container.layers().len());
        for layer in container.ordered_layers() {
            let layer = layer.borrow();
            let geometry = layer.geometry();
            let mut renderable = RenderableGeometry::new(layer.id());
            renderable.hidden = geometry.hidden;
            for group in &geometry.groups {
                let mut renderable_group = RenderableGroup::default();
                for mesh in &group.meshes {
                    if let Some(mesh) = generate_renderable_mesh(
                        mesh,
                        &mut self.ctx,
                        &mut self.buffers,
                        &mut self.programs,
                    )? {
                        renderable_group.meshes.push(mesh);
                    }
                }
                renderable.groups.push(renderable_group);
            }
            geometries.push(renderable);
        }
        Ok(geometries)
    }

    /// Pushes one changed attribute from the container's layer to its GPU
    /// buffer without rebuilding anything. Missing layers, geometries or meshes
    /// make this a no-op returning `Ok(false)`.
    pub fn update_renderable_geometries(
        &mut self,
        container: &Container,
        change: &DataChange,
    ) -> RenderResult<bool> {
        let Some(layer) = container.get_layer_by_id(&change.layer_id) else {
            log::debug!("Layer {:?} not found", change.layer_id);
            return Ok(false);
        };
        let Some(renderable) = self
            .renderable_geometries
            .iter()
            .find(|g| g.id == change.layer_id)
            .and_then(|g| g.mesh(change.group_id, change.mesh_id))
        else {
            log::debug!("No renderable mesh for {:?}", change);
            return Ok(false);
        };
        let layer = layer.borrow();
        let Some(mesh) = layer.geometry().mesh(change.group_id, change.mesh_id) else {
            log::debug!("No abstract mesh for {:?}", change);
            return Ok(false);
        };
        let updated =
            renderable.update_attribute(change.attribute, mesh, &mut self.ctx, &mut self.buffers);
        let updated = self.check(updated)?;
        if updated {
            self.needs_redraw = true;
        }
        Ok(updated)
    }

    /// Copies each layer's `hidden` flag onto its renderable geometry.
    /// Returns whether anything changed.
    pub fn sync_visibility(&mut self, container: &Container) -> bool {
        let mut changed = false;
        for renderable in &mut self.renderable_geometries {
            if let Some(layer) = container.get_layer_by_id(&renderable.id) {
                let hidden = layer.borrow().geometry().hidden;
                if renderable.hidden != hidden {
                    renderable.hidden = hidden;
                    changed = true;
                }
            }
        }
        if changed {
            self.needs_redraw = true;
        }
        changed
    }

    /// Routes a scroll event to the active camera.
    pub fn process_camera_event(&mut self, event: &CameraEvent) -> bool {
        let moved = self.cameras.process_event(event);
        if moved {
            self.needs_redraw = true;
        }
        moved
    }

    /// Draws one frame if a redraw is pending. Returns whether a frame was
    /// submitted.
    ///
    /// A transient surface error leaves `needs_redraw` set so the next call
    /// retries.
    pub fn render(&mut self) -> RenderResult<bool> {
        if !self.active || !self.needs_redraw {
            return Ok(false);
        }

        for camera_id in self.cameras.ids() {
            let Some(camera) = self
                .cameras
                .get_camera(camera_id, &mut self.ctx, &self.framebuffers)
            else {
                continue;
            };
            let matrices = *camera.transform_matrices();

            for geometry in self.renderable_geometries.iter().filter(|g| !g.hidden) {
                for mesh in geometry.meshes() {
                    mesh.render(&mut self.ctx, &self.buffers, &self.programs, &matrices);
                }
            }

            if let Some(RenderTarget::Offscreen(framebuffer)) = self.cameras.camera_target(camera_id)
            {
                let composited = self.render_to_screen(framebuffer);
                self.check(composited)?;
            }
        }

        let finished = self.ctx.finish_frame();
        if let Err(e) = self.check(finished) {
            log::warn!("Frame {} not presented: {}", self.frame_no, e);
            return Err(e);
        }

        self.needs_redraw = false;
        self.frame_no += 1;
        Ok(true)
    }

    /// Draws `framebuffer`'s colour target over the whole screen.
    fn render_to_screen(&mut self, framebuffer: FramebufferId) -> RenderResult<()> {
        let quad = &self.config.screen_quad_id;
        let position_name = format!("{}{}", quad, AttributeId::Vertices.buffer_suffix());
        let tex_coord_name = format!("{}{}", quad, AttributeId::TexCoords.buffer_suffix());
        let index_name = format!("{}{}", quad, INDEX_BUFFER_SUFFIX);

        let position = match self.buffers.vertex_buffer_by_name(&position_name) {
            Some(id) => id,
            None => self.buffers.new_vertex_buffer(
                &mut self.ctx,
                &position_name,
                &SCREEN_QUAD_VERTICES,
                3,
                false,
            )?,
        };
        let tex_coords = match self.buffers.vertex_buffer_by_name(&tex_coord_name) {
            Some(id) => id,
            None => self.buffers.new_vertex_buffer(
                &mut self.ctx,
                &tex_coord_name,
                &SCREEN_QUAD_TEX_COORDS,
                2,
                false,
            )?,
        };
        let index = match self.buffers.index_buffer_by_name(&index_name) {
            Some(id) => id,
            None => self
                .buffers
                .new_index_buffer(&mut self.ctx, &index_name, &SCREEN_QUAD_INDICES)?,
        };
        let program = self.programs.screen_quad_program(&mut self.ctx)?;

        let (Some(position), Some(tex_coords), Some(index), Some(program), Some(texture)) = (
            self.buffers.vertex_buffer(position),
            self.buffers.vertex_buffer(tex_coords),
            self.buffers.index_buffer(index),
            self.programs.program(program),
            self.framebuffers.framebuffer_texture(framebuffer),
        ) else {
            log::warn!("Compositing resources for framebuffer {} missing", framebuffer.0);
            return Ok(());
        };
        self.framebuffers
            .bind_framebuffer(&mut self.ctx, RenderTarget::Screen);
        let identity = Matrix4::identity();
        self.ctx.draw(DrawCall {
            label: "screen_quad",
            program,
            topology: wgpu::PrimitiveTopology::TriangleList,
            vertex_buffers: vec![position, tex_coords],
            index_buffer: index,
            index_count: SCREEN_QUAD_INDICES.len() as u32,
            instance_count: 1,
            uniforms: DrawUniforms::new(identity, identity),
            texture: Some(texture),
        });
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Renderer<crate::context::gpu::GpuContext> {
    /// Creates a wgpu-backed renderer for `window`, blocking on device setup.
    pub fn with_window(
        window: std::sync::Arc<winit::window::Window>,
        config: RendererConfig,
    ) -> RenderResult<Self> {
        Self::try_new(crate::context::gpu::GpuContext::new_blocking(window), config)
    }
}
