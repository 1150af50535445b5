//! Plain activation layer

use crate::autograd::relu;
use crate::Tensor;

/// ReLU nonlinearity as a layer node
#[derive(Clone, Debug, Default)]
pub struct ReLU;

impl ReLU {
    /// Create a ReLU layer
    pub fn new() -> Self {
        Self
    }

    /// Forward pass: max(x, 0)
    pub fn forward(&self, x: &Tensor) -> Tensor {
        relu(x)
    }
}
