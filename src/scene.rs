//! Scene tree: nodes, attributes, geometry, layers, and the stage.

pub mod attrs;
pub mod graph;
pub(crate) mod layer;
pub(crate) mod node;
pub mod shape;
pub mod stage;
