//! Built-in layer kinds.

pub mod axes;
pub mod l2_norm;
pub mod plane;
pub mod scatterplot;

pub use axes::Axes;
pub use l2_norm::L2NormScatterplot;
pub use plane::Plane;
pub use scatterplot::Scatterplot3D;
