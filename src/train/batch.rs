//! Batch data structure

use crate::Tensor;

/// A training batch: one input sample and its one-hot target
#[derive(Clone)]
pub struct Batch {
    /// Input features
    pub inputs: Tensor,
    /// One-hot target distribution over classes
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Index of the target class (argmax of the one-hot vector)
    pub fn target_class(&self) -> usize {
        self.targets
            .data()
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
