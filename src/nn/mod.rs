//! Network layers and the layer tree
//!
//! A network is a tree of [`Layer`] nodes: plain compute layers at the
//! leaves, [`Container`] nodes holding named children in declared order.
//! Quantized variants (see [`crate::quant`]) are members of the same enum so
//! the rewrite engine can substitute them in place.

mod activation;
mod container;
mod conv;
mod layer;
mod linear;
mod network;

pub use activation::ReLU;
pub use container::Container;
pub use conv::Conv2d;
pub use layer::{Layer, LayerKind};
pub use linear::Linear;
pub use network::Network;
