use crate::{
    camera::{Camera, CameraDescriptor, CameraEvent},
    context::RenderContext,
    resources::{CameraId, FramebufferManager, RenderTarget},
};

/// Cameras in registration order, each paired with the target it draws into.
///
/// The first camera becomes the active one, which receives interaction
/// events.
#[derive(Debug)]
pub struct CameraManager {
    cameras: Vec<Camera>,
    targets: Vec<RenderTarget>,
    active: Option<CameraId>,
    dolly_scale: f32,
}

impl CameraManager {
    pub fn new(dolly_scale: f32) -> Self {
        Self {
            cameras: Vec::new(),
            targets: Vec::new(),
            active: None,
            dolly_scale,
        }
    }

    pub fn new_camera(&mut self, desc: CameraDescriptor, target: RenderTarget) -> CameraId {
        self.cameras.push(Camera::new(desc));
        self.targets.push(target);
        let id = CameraId(self.cameras.len() - 1);
        if self.cameras.len() == 1 {
            self.active = Some(id);
        }
        id
    }

    /// Binds the camera's target, then returns the camera.
    pub fn get_camera<C: RenderContext>(
        &self,
        id: CameraId,
        ctx: &mut C,
        framebuffers: &FramebufferManager<C>,
    ) -> Option<&Camera> {
        let camera = self.cameras.get(id.0)?;
        framebuffers.bind_framebuffer(ctx, self.targets[id.0]);
        Some(camera)
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id.0)
    }

    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id.0)
    }

    pub fn camera_target(&self, id: CameraId) -> Option<RenderTarget> {
        self.targets.get(id.0).copied()
    }

    pub fn active_camera(&self) -> Option<CameraId> {
        self.active
    }

    /// Returns `false` and keeps the current camera if `id` is out of range.
    pub fn set_active_camera(&mut self, id: CameraId) -> bool {
        if id.0 >= self.cameras.len() {
            log::warn!("Camera id {} out of range", id.0);
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = CameraId> + use<> {
        (0..self.cameras.len()).map(CameraId)
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Dollies the active camera by `delta * dolly_scale`. Returns whether a
    /// camera moved.
    pub fn process_event(&mut self, event: &CameraEvent) -> bool {
        let Some(camera) = self.active.and_then(|id| self.cameras.get_mut(id.0)) else {
            return false;
        };
        camera.move_to_anchor(event.delta * self.dolly_scale);
        true
    }
}
