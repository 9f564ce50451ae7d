use std::{cell::RefCell, rc::Rc};

use layer_ngin::{
    CameraOptions, RecordingContext, Renderer, RendererConfig, Scatterplot3D,
    context::recording::{Command, DrawRecord},
};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 600;

pub fn recording_renderer() -> Renderer<RecordingContext> {
    Renderer::new(RecordingContext::new(WIDTH, HEIGHT), RendererConfig::default())
}

/// A renderer with one on-screen camera already registered.
pub fn renderer_with_camera() -> Renderer<RecordingContext> {
    let mut renderer = recording_renderer();
    renderer
        .new_perspective_camera(CameraOptions::default())
        .expect("camera");
    renderer
}

pub fn sample_points() -> Vec<Vec<f32>> {
    vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
    ]
}

pub fn sample_colors() -> Vec<Vec<f32>> {
    vec![
        vec![1.0, 0.0, 0.0, 1.0],
        vec![0.0, 1.0, 0.0, 1.0],
        vec![0.0, 0.0, 1.0, 1.0],
    ]
}

/// A scatterplot kept concrete so tests can call its own methods.
pub fn scatterplot(id: &str) -> Rc<RefCell<Scatterplot3D>> {
    Rc::new(RefCell::new(Scatterplot3D::new(
        id,
        sample_points(),
        sample_colors(),
        vec![1.0, 2.0, 3.0],
    )))
}

pub fn draw_labels(ctx: &RecordingContext) -> Vec<String> {
    ctx.draws().map(|d| d.label.clone()).collect()
}

pub fn draws_labelled<'a>(ctx: &'a RecordingContext, label: &str) -> Vec<&'a DrawRecord> {
    ctx.draws().filter(|d| d.label == label).collect()
}

pub fn created_buffers(ctx: &RecordingContext) -> usize {
    ctx.count(|c| matches!(c, Command::CreateBuffer { .. }))
}

pub fn as_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect()
}
