//! DoReFa-style weight fake quantization
//!
//! Forward: normalize the weight tensor into `[-1, 1]` by its maximum
//! magnitude (per output channel when `per_channel`), round to `n` uniform
//! signed levels per side with `n = 2^(bits-1) - 1`, and rescale to the
//! original range. The quantized tensor takes at most `2^bits - 1` distinct
//! values and the error is bounded by half the step `1/n`.
//!
//! Binary weights (`bits == 1`) have no room for a zero level: the uniform
//! formula degenerates, so they quantize to `sign(w) · scale` instead,
//! giving exactly `2^bits = 2` values.
//!
//! Backward: straight-through estimator. Max-magnitude normalization keeps
//! every value inside the representable range, so the incoming gradient
//! passes to the latent weight unchanged.

use super::QuantConfig;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

fn quantize_block(block: &mut [f32], config: &QuantConfig) {
    let scale = block.iter().fold(0.0f32, |m, &v| m.max(v.abs()));
    if scale == 0.0 {
        // All-zero block: already exactly representable, and dividing by
        // the scale would be undefined
        return;
    }

    if config.bits == 1 {
        // Binary weights: sign quantization, no zero level
        for v in block.iter_mut() {
            *v = if *v >= 0.0 { scale } else { -scale };
        }
        return;
    }

    let levels = config.signed_levels();
    for v in block.iter_mut() {
        *v = (*v / scale * levels).round() / levels * scale;
    }
}

/// Fake-quantize a weight tensor
///
/// `channels` is the number of output channels; it partitions the tensor
/// into equal channel blocks for per-channel scaling. Pass 1 (or set
/// `per_channel = false`) for a single global scale.
///
/// Identity configs (disabled, or the full-precision sentinel) return the
/// input tensor itself, so gradients flow exactly as without quantization.
pub fn quantize_weights(w: &Tensor, config: &QuantConfig, channels: usize) -> Tensor {
    if config.is_identity() {
        return w.clone();
    }

    assert!(channels > 0 && w.len() % channels == 0, "channel count must divide weight length");

    let mut data: Vec<f32> = w.data().to_vec();

    if config.per_channel {
        let block = w.len() / channels;
        for chunk in data.chunks_mut(block) {
            quantize_block(chunk, config);
        }
    } else {
        quantize_block(&mut data, config);
    }

    let requires_grad = w.requires_grad();
    let mut result = Tensor::new(Array1::from(data), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(DorefaBackward {
            w: w.clone(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct DorefaBackward {
    w: Tensor,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for DorefaBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            // STE: rounding has no usable derivative; pass the gradient
            // through to the latent full-precision weight
            self.w.accumulate_grad(grad.clone());

            if let Some(op) = self.w.backward_op() {
                op.backward();
            }
        }
    }
}
