//! Autograd operations: add, matmul, relu, conv2d, channel bias

mod activations;
mod basic;
mod conv;
mod matmul;

pub use activations::relu;
pub use basic::{add, add_channel_bias};
pub use conv::{conv2d, Conv2dShape};
pub use matmul::{matmul, matmul_compute, transpose};
