//! The model side of the engine: an ordered set of layers with structural
//! dirty tracking.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::{
    data_structures::layer::{ChangeQueue, ContainerLink, DataChange, LayerRef},
    error::MeshError,
};

static NEXT_CONTAINER_ID: AtomicU32 = AtomicU32::new(0);

/// Ordered collection of shared layers.
///
/// `layer_order` maps draw position to an index into `layers`, so layers can
/// be reordered without touching insertion order. The container owns layer
/// membership, not layer lifetime.
pub struct Container {
    id: u32,
    layers: Vec<LayerRef>,
    layer_order: Vec<usize>,
    pub data_structure_changed: bool,
    changes: ChangeQueue,
}

impl Container {
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            layers: Vec::new(),
            layer_order: Vec::new(),
            data_structure_changed: false,
            changes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Generates the layer's geometry if that has not happened yet, then
    /// appends the layer and marks the structure dirty.
    ///
    /// A layer whose generation fails is not added. Ids are unique per
    /// container: a different layer reusing a taken id is rejected, while the
    /// same handle may be added again.
    pub fn add_layers(&mut self, layer: LayerRef) -> Result<(), MeshError> {
        {
            let l = layer.borrow();
            let taken = self
                .layers
                .iter()
                .any(|other| !Rc::ptr_eq(other, &layer) && other.borrow().id() == l.id());
            if taken {
                log::warn!("Container {}: layer id {:?} already taken", self.id, l.id());
                return Err(MeshError::DuplicateLayer(l.id().to_owned()));
            }
        }
        {
            let mut l = layer.borrow_mut();
            if !l.geometry().generated {
                l.generate_geometry()?;
                l.geometry_mut().generated = true;
            }
            l.attach_container(ContainerLink {
                container_id: self.id,
                changes: Rc::downgrade(&self.changes),
            });
            log::debug!(
                "Container {}: added layer {:?} with {} meshes",
                self.id,
                l.id(),
                l.geometry().mesh_count()
            );
        }
        self.layers.push(layer);
        self.layer_order.push(self.layers.len() - 1);
        self.data_structure_changed = true;
        Ok(())
    }

    /// Linear scan by id.
    pub fn get_layer_by_id(&self, id: &str) -> Option<LayerRef> {
        self.layers
            .iter()
            .find(|layer| layer.borrow().id() == id)
            .cloned()
    }

    pub fn contains_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.borrow().id() == id)
    }

    pub fn layers(&self) -> &[LayerRef] {
        &self.layers
    }

    pub fn layer_order(&self) -> &[usize] {
        &self.layer_order
    }

    /// Layers in draw order.
    pub fn ordered_layers(&self) -> impl Iterator<Item = &LayerRef> {
        self.layer_order.iter().filter_map(|&i| self.layers.get(i))
    }

    /// Replaces the draw order. `order` must be a permutation of
    /// `0..layers.len()`; anything else is rejected and leaves the order as is.
    pub fn set_layer_order(&mut self, order: Vec<usize>) -> bool {
        let mut seen = vec![false; self.layers.len()];
        let valid = order.len() == self.layers.len()
            && order.iter().all(|&i| match seen.get_mut(i) {
                Some(s) if !*s => {
                    *s = true;
                    true
                }
                _ => false,
            });
        if !valid {
            log::warn!("Container {}: rejected layer order {:?}", self.id, order);
            return false;
        }
        self.layer_order = order;
        self.data_structure_changed = true;
        true
    }

    /// Queues an in-place data change for the renderer.
    pub fn notify_data_change(&self, change: DataChange) {
        self.changes.borrow_mut().push(change);
    }

    /// Drains every change queued since the last call.
    pub fn take_data_changes(&self) -> Vec<DataChange> {
        std::mem::take(&mut *self.changes.borrow_mut())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
