//! Optimization: SGD with momentum and cosine learning-rate annealing
//!
//! The optimizer operates on flat parameter lists, so it updates network
//! weights, biases, and learnable clip thresholds uniformly.

mod optimizer;
mod scheduler;
mod sgd;

pub use optimizer::Optimizer;
pub use scheduler::{CosineAnnealingLR, LRScheduler};
pub use sgd::SGD;
