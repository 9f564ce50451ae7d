mod common;

use layer_ngin::{
    Axes, CameraOptions, Container, Layer, Mesh, Plane, RenderError, RendererConfig, layer_ref,
    camera::CameraDescriptor,
    context::recording::{Command, RecordedFramebuffer},
    data_structures::mesh::{AttributeId, MeshData},
    resources::{FramebufferId, RenderTarget},
};

use crate::common::test_utils::{
    created_buffers, draw_labels, draws_labelled, recording_renderer, renderer_with_camera,
    scatterplot,
};

fn axes_container() -> Container {
    let mut container = Container::new();
    container.add_layers(layer_ref(Axes::new())).unwrap();
    container
}

#[test]
fn regeneration_clears_the_dirty_flag() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();

    assert!(renderer.regenerate_renderable_geometries(&mut container).unwrap());
    assert!(!container.data_structure_changed);
    assert!(!renderer.regenerate_renderable_geometries(&mut container).unwrap());
    assert!(!container.data_structure_changed);
    assert_eq!(renderer.renderable_geometries().len(), 1);
}

#[test]
fn axes_draw_three_lines() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();

    assert!(renderer.render().unwrap());

    let ctx = renderer.ctx();
    assert_eq!(
        draw_labels(ctx),
        vec!["line_axis0", "line_axis1", "line_axis2"]
    );
    for draw in ctx.draws() {
        assert_eq!(draw.topology, wgpu::PrimitiveTopology::LineList);
        assert_eq!(draw.index_count, 2);
        assert_eq!(draw.instance_count, 1);
        assert_eq!(draw.texture, None);
    }
    assert_eq!(ctx.passes().count(), 1);
    assert_eq!(ctx.commands.last(), Some(&Command::FinishFrame));
    assert_eq!(renderer.frame_no(), 1);
}

#[test]
fn scatterplot_draws_one_instanced_sphere_call() {
    let mut renderer = renderer_with_camera();
    let mut container = Container::new();
    container.add_layers(scatterplot("points")).unwrap();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();

    let draws = draws_labelled(renderer.ctx(), "instanced_sphere_points");
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].index_count, 60);
    assert_eq!(draws[0].instance_count, 3);
    assert_eq!(draws[0].vertex_buffers.len(), 6);
}

#[test]
fn render_without_pending_redraw_is_a_no_op() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    assert!(renderer.render().unwrap());
    renderer.ctx_mut().clear_commands();

    assert!(!renderer.needs_redraw);
    assert!(!renderer.render().unwrap());
    assert_eq!(renderer.ctx().draws().count(), 0);
    assert!(renderer.ctx().commands.is_empty());
    assert_eq!(renderer.frame_no(), 1);
}

#[test]
fn unknown_mesh_kinds_are_dropped() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    let axes = container.get_layer_by_id(Axes::ID).unwrap();
    let data = MeshData::new("volume", &[0.0; 3], &[0.0; 2], &[1.0; 4], &[0]).unwrap();
    axes.borrow_mut()
        .geometry_mut()
        .default_group_mut()
        .meshes
        .push(Mesh::custom("volume", data));

    assert!(renderer.regenerate_renderable_geometries(&mut container).unwrap());

    let abstract_count = axes.borrow().geometry().default_group().unwrap().meshes.len();
    let renderable = renderer.renderable_geometry_by_id(Axes::ID).unwrap();
    assert_eq!(renderable.groups[0].meshes.len(), abstract_count - 1);
    assert!(!container.data_structure_changed);
}

#[test]
fn rebuild_reuses_named_buffers() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    let created = created_buffers(renderer.ctx());
    let slots = renderer.buffers.vertex_buffer_count();

    container.data_structure_changed = true;
    renderer.regenerate_renderable_geometries(&mut container).unwrap();

    assert_eq!(created_buffers(renderer.ctx()), created);
    assert_eq!(renderer.buffers.vertex_buffer_count(), slots);
    assert!(
        renderer
            .ctx()
            .count(|c| matches!(c, Command::WriteBuffer { .. }))
            > 0
    );
}

#[test]
fn programs_are_shared_between_meshes() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    container.add_layers(layer_ref(Plane::xy("wall"))).unwrap();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();

    assert_eq!(renderer.programs.len(), 1);
    assert_eq!(
        renderer
            .ctx()
            .count(|c| matches!(c, Command::CreateProgram { .. })),
        1
    );
}

#[test]
fn hidden_layers_are_not_drawn() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    container.add_layers(layer_ref(Plane::xy("wall"))).unwrap();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();
    renderer.ctx_mut().clear_commands();

    container.get_layer_by_id(Axes::ID).unwrap().borrow_mut().hide();
    assert!(renderer.sync_visibility(&container));
    assert!(!renderer.sync_visibility(&container));
    assert!(renderer.render().unwrap());
    assert_eq!(draw_labels(renderer.ctx()), vec!["triangles_wall"]);

    container.get_layer_by_id(Axes::ID).unwrap().borrow_mut().show();
    assert!(renderer.sync_visibility(&container));
    renderer.ctx_mut().clear_commands();
    renderer.render().unwrap();
    assert_eq!(renderer.ctx().draws().count(), 4);
}

#[test]
fn layer_order_is_draw_order() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    container.add_layers(layer_ref(Plane::xy("wall"))).unwrap();
    assert!(container.set_layer_order(vec![1, 0]));
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();

    let labels = draw_labels(renderer.ctx());
    assert_eq!(labels.first().map(String::as_str), Some("triangles_wall"));
    assert_eq!(labels.len(), 4);
}

#[test]
fn offscreen_camera_is_composited_to_screen() {
    let mut renderer = recording_renderer();
    let camera = renderer
        .new_camera(CameraOptions {
            texture: true,
            width: Some(256),
            height: Some(128),
            ..Default::default()
        })
        .unwrap();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();

    let ctx = renderer.ctx();
    assert_eq!(
        ctx.count(|c| matches!(
            c,
            Command::CreateFramebuffer {
                width: 256,
                height: 128,
                ..
            }
        )),
        1
    );

    let config = RendererConfig::default();
    let passes: Vec<_> = ctx.passes().collect();
    assert_eq!(passes.len(), 2);
    assert_eq!(*passes[0].0, Some(RecordedFramebuffer(0)));
    assert_eq!(passes[0].1.clear, config.offscreen_clear_colour);
    assert_eq!(*passes[1].0, None);
    assert_eq!(passes[1].1.clear, config.screen_clear_colour);

    let quad = draws_labelled(ctx, "screen_quad");
    assert_eq!(quad.len(), 1);
    assert_eq!(quad[0].index_count, 6);
    assert_eq!(quad[0].vertex_buffers.len(), 2);
    assert_eq!(quad[0].texture, Some(RecordedFramebuffer(0)));
    assert_eq!(ctx.commands.last(), Some(&Command::FinishFrame));

    assert!(renderer.buffers.vertex_buffer_by_name("screen_quad_vertex_position").is_some());
    assert!(renderer.buffers.index_buffer_by_name("screen_quad_vertex_index").is_some());
    let projection = renderer.cameras.camera(camera).unwrap().transform_matrices().projection;
    assert!((projection.y.y / projection.x.x - 2.0).abs() < 1e-5);
}

#[test]
fn screen_quad_is_uploaded_once() {
    let mut renderer = recording_renderer();
    renderer
        .new_camera(CameraOptions {
            texture: true,
            ..Default::default()
        })
        .unwrap();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();
    let created = created_buffers(renderer.ctx());

    renderer.request_redraw();
    renderer.render().unwrap();

    assert_eq!(created_buffers(renderer.ctx()), created);
    assert_eq!(draws_labelled(renderer.ctx(), "screen_quad").len(), 2);
}

#[test]
fn screen_cameras_are_not_composited() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();

    assert!(draws_labelled(renderer.ctx(), "screen_quad").is_empty());
    assert!(renderer.buffers.vertex_buffer_by_name("screen_quad_vertex_position").is_none());
}

#[test]
fn failed_offscreen_target_deactivates_the_renderer() {
    let mut renderer = recording_renderer();
    renderer.ctx_mut().fail_framebuffers = true;

    let result = renderer.new_camera(CameraOptions {
        texture: true,
        ..Default::default()
    });

    assert!(matches!(result, Err(RenderError::ResourceCreation { .. })));
    assert!(!renderer.is_active());
    assert!(renderer.cameras.is_empty());
    renderer.request_redraw();
    assert!(!renderer.render().unwrap());
    assert!(matches!(
        renderer.new_camera(CameraOptions::default()),
        Err(RenderError::Inactive)
    ));
}

#[test]
fn transient_surface_errors_are_retried() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.ctx_mut().fail_frames = Some(wgpu::SurfaceError::Timeout);

    assert!(matches!(
        renderer.render(),
        Err(RenderError::Surface(wgpu::SurfaceError::Timeout))
    ));
    assert!(renderer.is_active());
    assert!(renderer.needs_redraw);
    assert_eq!(renderer.frame_no(), 0);

    renderer.ctx_mut().fail_frames = None;
    assert!(renderer.render().unwrap());
    assert_eq!(renderer.frame_no(), 1);
}

#[test]
fn out_of_memory_is_fatal() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.ctx_mut().fail_frames = Some(wgpu::SurfaceError::OutOfMemory);

    assert!(renderer.render().is_err());
    assert!(!renderer.is_active());

    renderer.ctx_mut().fail_frames = None;
    assert!(!renderer.render().unwrap());
}

#[test]
fn data_change_rewrites_buffer_in_place() {
    let mut renderer = renderer_with_camera();
    let layer = scatterplot("points");
    let mut container = Container::new();
    container.add_layers(layer.clone()).unwrap();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();
    renderer.render().unwrap();
    let created = created_buffers(renderer.ctx());

    layer.borrow_mut().rotate_along_z_axis(1.0).unwrap();
    let changes = container.take_data_changes();
    assert_eq!(changes.len(), 1);
    assert!(
        renderer
            .update_renderable_geometries(&container, &changes[0])
            .unwrap()
    );

    assert!(renderer.needs_redraw);
    assert_eq!(created_buffers(renderer.ctx()), created);
    assert!(!container.data_structure_changed);

    let id = renderer
        .renderable_geometry_by_id("points")
        .and_then(|g| g.mesh(0, 0))
        .and_then(|m| m.vertex_buffer(AttributeId::InstancedPosition))
        .unwrap();
    let buffer = *renderer.buffers.vertex_buffer(id).unwrap();
    let uploaded = common::test_utils::as_floats(renderer.ctx().buffer_data(buffer).unwrap());
    let expected = layer
        .borrow()
        .geometry()
        .mesh(0, 0)
        .and_then(|m| m.attribute(AttributeId::InstancedPosition))
        .unwrap()
        .to_vec();
    assert_eq!(uploaded, expected);
}

#[test]
fn changes_for_unknown_layers_are_ignored() {
    let mut renderer = renderer_with_camera();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();

    let change = layer_ngin::data_structures::layer::DataChange {
        layer_id: "missing".to_owned(),
        group_id: 0,
        mesh_id: 0,
        attribute: AttributeId::Vertices,
    };
    assert!(!renderer.update_renderable_geometries(&container, &change).unwrap());
}

#[test]
fn missing_offscreen_texture_keeps_the_screen_pass() {
    let mut renderer = recording_renderer();
    renderer.cameras.new_camera(
        CameraDescriptor::default(),
        RenderTarget::Offscreen(FramebufferId(7)),
    );
    renderer.request_redraw();
    let mut container = axes_container();
    renderer.regenerate_renderable_geometries(&mut container).unwrap();

    assert!(renderer.render().unwrap());

    let ctx = renderer.ctx();
    let passes: Vec<_> = ctx.passes().collect();
    assert_eq!(passes.len(), 1);
    assert!(passes[0].0.is_none());
    assert!(draws_labelled(ctx, "screen_quad").is_empty());
    assert_eq!(
        draw_labels(ctx),
        vec!["line_axis0", "line_axis1", "line_axis2"]
    );
    assert_eq!(ctx.commands.last(), Some(&Command::FinishFrame));
}
