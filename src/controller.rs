//! Glue between the model ([`Container`]) and the view ([`Renderer`]).
//!
//! The controller is driven from outside: the host calls [`Controller::tick`]
//! once per frame and forwards window events through
//! [`Controller::route_window_event`].

use winit::event::{MouseScrollDelta, WindowEvent};

use crate::{
    camera::CameraEvent,
    context::RenderContext,
    data_structures::{container::Container, layer::LayerRef},
    error::{MeshError, RenderResult},
    renderer::Renderer,
};

/// Pixels one wheel line counts for.
const LINE_DELTA_PIXELS: f32 = 100.0;

pub struct Controller<C: RenderContext> {
    container: Container,
    renderer: Renderer<C>,
}

impl<C: RenderContext> Controller<C> {
    pub fn new(renderer: Renderer<C>) -> Self {
        Self::with_container(Container::new(), renderer)
    }

    pub fn with_container(container: Container, renderer: Renderer<C>) -> Self {
        Self {
            container,
            renderer,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    pub fn renderer(&self) -> &Renderer<C> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<C> {
        &mut self.renderer
    }

    pub fn add_layer(&mut self, layer: LayerRef) -> Result<(), MeshError> {
        self.container.add_layers(layer)
    }

    /// Adds every layer whose id is not in the container yet. Layers already
    /// present are left alone; nothing is ever removed. Returns how many
    /// layers were added.
    pub fn sync_layers(&mut self, layers: &[LayerRef]) -> Result<usize, MeshError> {
        let mut added = 0;
        for layer in layers {
            let id = layer.borrow().id().to_owned();
            if self.container.contains_layer(&id) {
                continue;
            }
            self.container.add_layers(layer.clone())?;
            added += 1;
        }
        if added > 0 {
            log::info!("Added {} layers", added);
        }
        Ok(added)
    }

    /// Brings the renderable tree up to date with the container without
    /// drawing. Per-change failures that are not fatal are logged and
    /// skipped.
    pub fn update(&mut self) -> RenderResult<()> {
        for change in self.container.take_data_changes() {
            match self
                .renderer
                .update_renderable_geometries(&self.container, &change)
            {
                Ok(_) => {}
                Err(e) if !e.is_fatal() => {
                    log::warn!("Dropping data change {:?}: {}", change, e);
                }
                Err(e) => return Err(e),
            }
        }
        self.renderer
            .regenerate_renderable_geometries(&mut self.container)?;
        self.renderer.sync_visibility(&self.container);
        Ok(())
    }

    /// Draws a frame if one is pending.
    pub fn draw(&mut self) -> RenderResult<bool> {
        if !self.renderer.is_active() {
            return Ok(false);
        }
        self.renderer.render()
    }

    /// One frame: apply pending changes, then draw. Returns whether a frame
    /// was submitted.
    pub fn tick(&mut self) -> RenderResult<bool> {
        self.update()?;
        self.draw()
    }

    pub fn route_camera_event(&mut self, event: &CameraEvent) -> bool {
        self.renderer.process_camera_event(event)
    }

    /// Maps window input onto the scene. Only the mouse wheel is consumed.
    /// winit reports scrolling up as positive, camera events the other way
    /// round. Returns whether the event changed anything.
    pub fn route_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_DELTA_PIXELS,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                self.route_camera_event(&CameraEvent { delta })
            }
            _ => false,
        }
    }
}
