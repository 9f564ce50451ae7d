use crate::{
    config::RendererConfig,
    context::{PassState, RenderContext},
    error::RenderResult,
    resources::{FramebufferId, RenderTarget},
};

/// Owns off-screen render targets.
///
/// Binding a target is the same as beginning a pass on it: colour and depth
/// are cleared and the depth test is set.
pub struct FramebufferManager<C: RenderContext> {
    framebuffers: Vec<(C::Framebuffer, (u32, u32))>,
    screen: PassState,
    offscreen: PassState,
}

impl<C: RenderContext> FramebufferManager<C> {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            framebuffers: Vec::new(),
            screen: PassState {
                clear: config.screen_clear_colour,
                depth_test: config.depth_test,
            },
            offscreen: PassState {
                clear: config.offscreen_clear_colour,
                depth_test: config.depth_test,
            },
        }
    }

    pub fn new_framebuffer(
        &mut self,
        ctx: &mut C,
        width: u32,
        height: u32,
    ) -> RenderResult<FramebufferId> {
        let framebuffer = ctx.create_framebuffer(width, height)?;
        self.framebuffers.push((framebuffer, (width, height)));
        Ok(FramebufferId(self.framebuffers.len() - 1))
    }

    /// Begins a cleared pass on `target`. An unknown off-screen id falls back
    /// to the screen.
    pub fn bind_framebuffer(&self, ctx: &mut C, target: RenderTarget) {
        match target {
            RenderTarget::Screen => ctx.begin_pass(None, &self.screen),
            RenderTarget::Offscreen(id) => match self.framebuffers.get(id.0) {
                Some((framebuffer, _)) => ctx.begin_pass(Some(framebuffer), &self.offscreen),
                None => {
                    log::warn!("Framebuffer {} not found, drawing to screen", id.0);
                    ctx.begin_pass(None, &self.screen)
                }
            },
        }
    }

    /// The colour attachment of an off-screen target, for sampling.
    pub fn framebuffer_texture(&self, id: FramebufferId) -> Option<&C::Framebuffer> {
        self.framebuffers.get(id.0).map(|(fb, _)| fb)
    }

    pub fn framebuffer_size(&self, id: FramebufferId) -> Option<(u32, u32)> {
        self.framebuffers.get(id.0).map(|(_, size)| *size)
    }

    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}
