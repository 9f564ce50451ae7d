//! layer-ngin
//!
//! A layered 3D data-visualization renderer on top of wgpu. Datasets are
//! wrapped in layers, each layer builds abstract geometry, and a renderer
//! mirrors that geometry into GPU buffers and draws it through one or more
//! cameras, native or in the browser.
//!
//! High-level modules
//! - `data_structures`: container, layers, geometry and meshes (the model)
//! - `renderer`: the view; turns a container into draws
//! - `controller`: drives the renderer and routes input
//! - `render`: the renderable mirror of the abstract geometry
//! - `resources`: buffer, program, framebuffer and camera managers
//! - `context`: the graphics backend seam and its wgpu implementation
//! - `pipelines`: shaders and pipeline construction
//! - `camera`: view and projection math
//! - `config`, `logging`, `error`: ambient setup
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod controller;
pub mod data_structures;
pub mod error;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod renderer;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use camera::{CameraEvent, ProjectionType};
pub use config::RendererConfig;
pub use context::{RenderContext, gpu::GpuContext, recording::RecordingContext};
pub use controller::Controller;
pub use data_structures::{
    container::Container,
    layer::{Layer, LayerRef, layer_ref},
    layers::{Axes, L2NormScatterplot, Plane, Scatterplot3D},
    mesh::{AttributeId, Mesh},
};
pub use error::{MeshError, RenderError, RenderResult};
pub use logging::{LoggingConfig, init_logging};
pub use renderer::{CameraOptions, Renderer};
pub use winit::event::WindowEvent;
