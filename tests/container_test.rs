mod common;

use layer_ngin::{
    Axes, Container, L2NormScatterplot, Layer, Mesh, MeshError, Plane, layer_ref,
    data_structures::{
        layer::flatten,
        mesh::{AttributeId, ICOSAHEDRON_INDICES, ICOSAHEDRON_VERTICES},
    },
};

use crate::common::test_utils::{sample_colors, sample_points, scatterplot};

#[test]
fn adding_a_layer_generates_geometry_once() {
    let plane = layer_ref(Plane::xy("floor"));
    let mut first = Container::new();
    let mut second = Container::new();

    first.add_layers(plane.clone()).unwrap();
    second.add_layers(plane.clone()).unwrap();

    let layer = plane.borrow();
    assert!(layer.geometry().generated);
    assert_eq!(layer.geometry().default_group().unwrap().meshes.len(), 1);
}

#[test]
fn dirty_flag_is_set_by_adding_layers() {
    let mut container = Container::new();
    assert!(!container.data_structure_changed);

    container.add_layers(layer_ref(Axes::new())).unwrap();
    assert!(container.data_structure_changed);
    assert_eq!(container.layer_order(), &[0]);
}

#[test]
fn unknown_layer_id_is_not_an_error() {
    let mut container = Container::new();
    container.add_layers(layer_ref(Axes::new())).unwrap();

    assert!(container.get_layer_by_id(Axes::ID).is_some());
    assert!(container.get_layer_by_id("missing").is_none());
    assert!(!container.contains_layer("missing"));
}

#[test]
fn layer_order_must_be_a_permutation() {
    let mut container = Container::new();
    container.add_layers(layer_ref(Axes::new())).unwrap();
    container.add_layers(layer_ref(Plane::xz("ground"))).unwrap();
    container.data_structure_changed = false;

    assert!(!container.set_layer_order(vec![0, 0]));
    assert!(!container.set_layer_order(vec![0]));
    assert!(!container.data_structure_changed);

    assert!(container.set_layer_order(vec![1, 0]));
    assert!(container.data_structure_changed);
    let ids: Vec<String> = container
        .ordered_layers()
        .map(|l| l.borrow().id().to_owned())
        .collect();
    assert_eq!(ids, vec!["ground".to_owned(), Axes::ID.to_owned()]);
}

#[test]
fn flatten_concatenates_rows() {
    let rows: Vec<Vec<f32>> = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
    assert_eq!(flatten(rows.as_slice()), vec![1.0, 2.0, 3.0, 4.0]);

    let flat: Vec<f32> = vec![1.0, 2.0, 3.0];
    assert_eq!(flatten(flat.as_slice()), flat);
}

#[test]
fn instanced_spheres_scale_with_points_only() {
    let layer = scatterplot("points");
    let mut container = Container::new();
    container.add_layers(layer.clone()).unwrap();

    let layer = layer.borrow();
    let mesh = layer.geometry().mesh(0, 0).unwrap();
    assert!(matches!(mesh, Mesh::InstancedSpheres { .. }));
    assert_eq!(mesh.id(), "instanced_sphere_points");

    let n = sample_points().len();
    assert_eq!(mesh.attribute(AttributeId::InstancedPosition).unwrap().len(), 3 * n);
    assert_eq!(mesh.attribute(AttributeId::InstancedColor).unwrap().len(), 4 * n);
    assert_eq!(mesh.attribute(AttributeId::InstancedRadius).unwrap().len(), n);
    assert_eq!(mesh.data().vertices.len(), ICOSAHEDRON_VERTICES.len());
    assert_eq!(mesh.data().vertex_count(), 12);
    assert_eq!(mesh.data().vertex_indices.len(), ICOSAHEDRON_INDICES.len());
    assert_eq!(mesh.data().vertex_indices.len(), 60);
}

#[test]
fn l2_norm_layer_places_each_point_on_its_distance() {
    let layer = layer_ref(L2NormScatterplot::new(
        "norms",
        vec![vec![1.0, 0.0, 0.0]],
        vec![sample_colors()[0].clone()],
        vec![1.0],
    ));
    let mut container = Container::new();
    container.add_layers(layer.clone()).unwrap();

    let layer = layer.borrow();
    let mesh = layer.geometry().mesh(0, 0).unwrap();
    assert_eq!(
        mesh.attribute(AttributeId::InstancedPosition).unwrap(),
        &[1.0, 1.0, -1.0]
    );
}

#[test]
fn rotation_reports_the_change_to_the_container() {
    let layer = scatterplot("points");
    let mut container = Container::new();
    container.add_layers(layer.clone()).unwrap();
    assert!(container.take_data_changes().is_empty());

    layer
        .borrow_mut()
        .rotate_along_z_axis(std::f32::consts::FRAC_PI_2)
        .unwrap();

    let changes = container.take_data_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].layer_id, "points");
    assert_eq!((changes[0].group_id, changes[0].mesh_id), (0, 0));
    assert_eq!(changes[0].attribute, AttributeId::InstancedPosition);
    assert!(container.take_data_changes().is_empty());
}

#[test]
fn dropped_container_is_forgotten_by_its_layers() {
    let layer = scatterplot("points");
    {
        let mut container = Container::new();
        container.add_layers(layer.clone()).unwrap();
    }
    layer.borrow_mut().rotate_along_z_axis(0.5).unwrap();
    assert!(layer.borrow().base().containers.is_empty());
}

#[test]
fn second_layer_with_a_taken_id_is_rejected() {
    let first = scatterplot("points");
    let second = scatterplot("points");
    let mut container = Container::new();
    container.add_layers(first.clone()).unwrap();
    container.data_structure_changed = false;

    let err = container.add_layers(second.clone()).unwrap_err();

    assert_eq!(err, MeshError::DuplicateLayer("points".to_owned()));
    assert_eq!(container.layers().len(), 1);
    assert!(!container.data_structure_changed);
    assert!(!second.borrow().geometry().generated);

    second.borrow_mut().rotate_along_z_axis(1.0).unwrap();
    assert!(container.take_data_changes().is_empty());
}

#[test]
fn same_layer_handle_may_be_added_again() {
    let layer = layer_ref(Axes::new());
    let mut container = Container::new();
    container.add_layers(layer.clone()).unwrap();
    container.add_layers(layer.clone()).unwrap();

    assert_eq!(container.layers().len(), 2);
    assert_eq!(layer.borrow().geometry().mesh_count(), 3);
}
