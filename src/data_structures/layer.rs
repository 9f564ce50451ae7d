//! Layers: named units of abstract data that know how to turn themselves into
//! [`Geometry`].
//!
//! A layer can be shared by several containers. It only keeps non-owning
//! [`ContainerLink`]s back to them, through which it reports in-place data
//! changes.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    data_structures::{geometry::Geometry, mesh::AttributeId},
    error::MeshError,
};

/// Shared handle to a layer.
pub type LayerRef = Rc<RefCell<dyn Layer>>;

/// Wraps a concrete layer into a [`LayerRef`].
pub fn layer_ref<L: Layer + 'static>(layer: L) -> LayerRef {
    Rc::new(RefCell::new(layer))
}

/// Identifies which mesh attribute of which layer changed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChange {
    pub layer_id: String,
    pub group_id: usize,
    pub mesh_id: usize,
    pub attribute: AttributeId,
}

/// Queue a container drains once per tick.
pub type ChangeQueue = Rc<RefCell<Vec<DataChange>>>;

/// Non-owning back-reference from a layer to a container it belongs to.
#[derive(Debug, Clone)]
pub struct ContainerLink {
    pub container_id: u32,
    pub changes: Weak<RefCell<Vec<DataChange>>>,
}

impl ContainerLink {
    /// Pushes `change` if the container is still alive.
    pub fn notify(&self, change: DataChange) -> bool {
        match self.changes.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push(change);
                true
            }
            None => false,
        }
    }
}

/// State every layer carries.
#[derive(Debug, Clone)]
pub struct LayerBase {
    pub id: String,
    pub geometry: Geometry,
    pub containers: Vec<ContainerLink>,
}

impl LayerBase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            geometry: Geometry::new(),
            containers: Vec::new(),
        }
    }
}

/// A source of renderable geometry.
///
/// Implementors provide access to their [`LayerBase`] and a
/// `generate_geometry` step that fills the base geometry from the layer data.
pub trait Layer {
    fn base(&self) -> &LayerBase;
    fn base_mut(&mut self) -> &mut LayerBase;

    /// Populates the geometry from the layer data.
    ///
    /// Called at most once per layer; [`Container`](crate::data_structures::container::Container)
    /// guards it with [`Geometry::generated`].
    fn generate_geometry(&mut self) -> Result<(), MeshError>;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn geometry(&self) -> &Geometry {
        &self.base().geometry
    }

    fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.base_mut().geometry
    }

    fn hide(&mut self) {
        self.geometry_mut().hidden = true;
    }

    fn show(&mut self) {
        self.geometry_mut().hidden = false;
    }

    fn attach_container(&mut self, link: ContainerLink) {
        let containers = &mut self.base_mut().containers;
        if containers.iter().all(|c| c.container_id != link.container_id) {
            containers.push(link);
        }
    }

    /// Tells every attached container that one mesh attribute changed value.
    fn notify_data_change(&mut self, group_id: usize, mesh_id: usize, attribute: AttributeId) {
        let layer_id = self.id().to_owned();
        let containers = &mut self.base_mut().containers;
        containers.retain(|link| {
            link.notify(DataChange {
                layer_id: layer_id.clone(),
                group_id,
                mesh_id,
                attribute,
            })
        });
    }
}

/// Row-major flattening of layer source arrays.
pub trait Flatten {
    fn flatten(&self) -> Vec<f32>;
}

impl Flatten for [f32] {
    fn flatten(&self) -> Vec<f32> {
        self.to_vec()
    }
}

impl Flatten for [Vec<f32>] {
    fn flatten(&self) -> Vec<f32> {
        if let Some(first) = self.first() {
            let width = first.len();
            if self.iter().any(|row| row.len() != width) {
                log::warn!("Flattening ragged rows; row boundaries are lost");
            }
        }
        self.concat()
    }
}

impl<const N: usize> Flatten for [[f32; N]] {
    fn flatten(&self) -> Vec<f32> {
        self.as_flattened().to_vec()
    }
}

/// `flatten([[1, 2], [3, 4]]) == [1, 2, 3, 4]`; a 1-D slice is returned as is.
pub fn flatten<T: Flatten + ?Sized>(data: &T) -> Vec<f32> {
    data.flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_row_major() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(flatten(rows.as_slice()), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(flatten(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]][..]).len(), 6);
    }

    #[test]
    fn flatten_of_flat_is_identity() {
        let flat: [f32; 3] = [0.5, 1.5, 2.5];
        assert_eq!(flatten(&flat[..]), flat.to_vec());
        let empty: Vec<Vec<f32>> = Vec::new();
        assert!(flatten(empty.as_slice()).is_empty());
    }

    #[test]
    fn dead_container_links_are_pruned() {
        struct Dummy(LayerBase);
        impl Layer for Dummy {
            fn base(&self) -> &LayerBase {
                &self.0
            }
            fn base_mut(&mut self) -> &mut LayerBase {
                &mut self.0
            }
            fn generate_geometry(&mut self) -> Result<(), MeshError> {
                Ok(())
            }
        }

        let alive: ChangeQueue = Rc::new(RefCell::new(Vec::new()));
        let mut layer = Dummy(LayerBase::new("d"));
        layer.attach_container(ContainerLink {
            container_id: 1,
            changes: Rc::downgrade(&alive),
        });
        {
            let dropped: ChangeQueue = Rc::new(RefCell::new(Vec::new()));
            layer.attach_container(ContainerLink {
                container_id: 2,
                changes: Rc::downgrade(&dropped),
            });
        }
        layer.notify_data_change(0, 0, AttributeId::Vertices);

        assert_eq!(layer.base().containers.len(), 1);
        assert_eq!(alive.borrow().len(), 1);
        assert_eq!(alive.borrow()[0].layer_id, "d");
    }
}
