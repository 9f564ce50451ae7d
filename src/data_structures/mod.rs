//! Engine data structures: the abstract model the renderer consumes.
//!
//! - `mesh` holds API-independent vertex/index arrays and the mesh kinds
//! - `geometry` groups meshes and keeps the source arrays they came from
//! - `layer` is the layer trait, container back-links and `flatten`
//! - `layers` contains the built-in layer kinds
//! - `container` is the ordered, dirty-tracked set of layers
//! - `texture` contains GPU texture wrappers for depth and off-screen targets

pub mod container;
pub mod geometry;
pub mod layer;
pub mod layers;
pub mod mesh;
pub mod texture;
