//! Renderer configuration.

/// Tunables of a [`Renderer`](crate::renderer::Renderer).
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Clear colour of passes into the screen.
    pub screen_clear_colour: wgpu::Color,
    /// Clear colour of passes into off-screen targets.
    pub offscreen_clear_colour: wgpu::Color,
    pub depth_test: bool,
    /// Scroll delta to dolly distance factor.
    pub dolly_scale: f32,
    /// Buffer-name prefix of the compositing quad.
    pub screen_quad_id: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            screen_clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
            offscreen_clear_colour: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.2,
                a: 1.0,
            },
            depth_test: true,
            dolly_scale: 0.1,
            screen_quad_id: "screen_quad".to_owned(),
        }
    }
}

impl RendererConfig {
    pub fn with_screen_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.screen_clear_colour = colour;
        self
    }

    pub fn with_offscreen_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.offscreen_clear_colour = colour;
        self
    }

    pub fn with_depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }

    pub fn with_dolly_scale(mut self, dolly_scale: f32) -> Self {
        self.dolly_scale = dolly_scale;
        self
    }

    pub fn with_screen_quad_id(mut self, id: impl Into<String>) -> Self {
        self.screen_quad_id = id.into();
        self
    }
}
