//! Network: root of the layer tree

use super::Layer;
use crate::Tensor;

/// A network is the root layer node plus convenience accessors
///
/// Rewriting replaces node kinds and parameters but never the data-flow
/// wiring observed from outside: the forward signature and the child-name
/// topology are invariant.
#[derive(Clone)]
pub struct Network {
    root: Layer,
}

impl Network {
    /// Wrap a root layer as a network
    pub fn new(root: Layer) -> Self {
        Self { root }
    }

    /// Forward pass through the whole tree
    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.root.forward(x)
    }

    /// Root layer
    pub fn root(&self) -> &Layer {
        &self.root
    }

    /// Mutable root layer
    pub fn root_mut(&mut self) -> &mut Layer {
        &mut self.root
    }

    /// Consume the network, yielding the root layer
    pub fn into_root(self) -> Layer {
        self.root
    }

    /// All trainable parameters in traversal order
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        self.root.parameters_mut()
    }

    /// Total number of layer nodes
    pub fn num_nodes(&self) -> usize {
        self.root.num_nodes()
    }

    /// Child-name skeleton, for topology comparisons
    pub fn topology(&self) -> Vec<String> {
        self.root.topology()
    }
}
