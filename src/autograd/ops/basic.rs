//! Basic autograd operations: add, channel bias

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Add two tensors element-wise
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    let data = a.data() + b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for AddBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad.clone());
            }
            if self.b.requires_grad() {
                self.b.accumulate_grad(grad.clone());
            }

            if let Some(op) = self.a.backward_op() {
                op.backward();
            }
            if let Some(op) = self.b.backward_op() {
                op.backward();
            }
        }
    }
}

/// Add a per-channel bias to a feature map
///
/// `x` is `[channels * spatial]` row-major (channel-major), `bias` is
/// `[channels]`; each bias value is broadcast over its channel's spatial
/// positions. The bias gradient is the sum of the output gradient over
/// each channel.
pub fn add_channel_bias(x: &Tensor, bias: &Tensor, channels: usize, spatial: usize) -> Tensor {
    assert_eq!(x.len(), channels * spatial, "feature map size mismatch");
    assert_eq!(bias.len(), channels, "bias size mismatch");

    let mut data = x.data().clone();
    for c in 0..channels {
        let b = bias.data()[c];
        for s in 0..spatial {
            data[c * spatial + s] += b;
        }
    }

    let requires_grad = x.requires_grad() || bias.requires_grad();
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let backward_op = Rc::new(ChannelBiasBackward {
            x: x.clone(),
            bias: bias.clone(),
            channels,
            spatial,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ChannelBiasBackward {
    x: Tensor,
    bias: Tensor,
    channels: usize,
    spatial: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ChannelBiasBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                self.x.accumulate_grad(grad.clone());
            }
            if self.bias.requires_grad() {
                // ∂L/∂bias[c] = sum over the channel's spatial positions
                let mut grad_bias = vec![0.0f32; self.channels];
                for c in 0..self.channels {
                    for s in 0..self.spatial {
                        grad_bias[c] += grad[c * self.spatial + s];
                    }
                }
                self.bias.accumulate_grad(Array1::from(grad_bias));
            }

            if let Some(op) = self.x.backward_op() {
                op.backward();
            }
            if let Some(op) = self.bias.backward_op() {
                op.backward();
            }
        }
    }
}
