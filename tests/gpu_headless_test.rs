#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn headless_frame_is_submitted() {
    use layer_ngin::{
        Axes, CameraOptions, Container, GpuContext, Renderer, RendererConfig, layer_ref,
    };

    use crate::common::test_utils::scatterplot;

    let ctx = GpuContext::headless_blocking(320, 240);
    let mut renderer = Renderer::try_new(ctx, RendererConfig::default()).unwrap();
    renderer
        .new_perspective_camera(CameraOptions::default())
        .unwrap();
    renderer
        .new_camera(CameraOptions {
            id: "minimap".to_owned(),
            texture: true,
            width: Some(128),
            height: Some(128),
            ..Default::default()
        })
        .unwrap();

    let mut container = Container::new();
    container.add_layers(layer_ref(Axes::new())).unwrap();
    container.add_layers(scatterplot("points")).unwrap();
    renderer
        .regenerate_renderable_geometries(&mut container)
        .unwrap();

    assert!(renderer.render().unwrap());
    assert_eq!(renderer.frame_no(), 1);
    assert!(renderer.is_active());
}
