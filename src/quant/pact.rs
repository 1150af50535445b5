//! PACT-style clipped activation fake quantization
//!
//! Forward: clip the activation to `[0, α]` where `α` is a learnable clip
//! threshold, then round onto `2^bits` uniform levels
//! `{0, step, 2·step, …, α}` with `step = α / (2^bits - 1)`.
//!
//! Backward (straight-through estimator):
//! - w.r.t. the input: incoming gradient inside `[0, α]`, zero outside
//! - w.r.t. `α`: sum of the incoming gradient over elements clipped at the
//!   upper bound (`x ≥ α`); elements below the threshold contribute nothing
//!
//! Disabled (or full-precision) configs fall back to a plain unclipped
//! ReLU so the layer is numerically equivalent to the activation it
//! replaced.

use super::QuantConfig;
use crate::autograd::{relu, BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Fake-quantize an activation tensor against a learnable clip threshold
///
/// `clip` must be a scalar tensor (length 1); its gradient receives the
/// clipped-element sum so any generic optimizer trains the threshold.
pub fn pact_quantize(x: &Tensor, clip: &Tensor, config: &QuantConfig) -> Tensor {
    assert_eq!(clip.len(), 1, "clip threshold must be a scalar tensor");

    if config.is_identity() {
        return relu(x);
    }

    let alpha = clip.data()[0];
    let steps = config.unsigned_steps();
    let step = alpha / steps;

    let data: Vec<f32> = x
        .data()
        .iter()
        .map(|&v| {
            let clipped = v.clamp(0.0, alpha.max(0.0));
            if step > 0.0 {
                (clipped / step).round() * step
            } else {
                // Threshold driven to zero (or below): everything clips to 0
                0.0
            }
        })
        .collect();

    let requires_grad = x.requires_grad() || clip.requires_grad();
    let mut result = Tensor::new(Array1::from(data), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(PactBackward {
            x: x.clone(),
            clip: clip.clone(),
            alpha,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct PactBackward {
    x: Tensor,
    clip: Tensor,
    alpha: f32,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for PactBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.x.requires_grad() {
                let grad_x: Vec<f32> = self
                    .x
                    .data()
                    .iter()
                    .zip(grad.iter())
                    .map(|(&v, &g)| if (0.0..=self.alpha).contains(&v) { g } else { 0.0 })
                    .collect();
                self.x.accumulate_grad(Array1::from(grad_x));
            }

            if self.clip.requires_grad() {
                // ∂L/∂α = Σ g_i over elements clipped at the upper bound
                let grad_alpha: f32 = self
                    .x
                    .data()
                    .iter()
                    .zip(grad.iter())
                    .filter(|(&v, _)| v >= self.alpha)
                    .map(|(_, &g)| g)
                    .sum();
                self.clip.accumulate_grad(Array1::from(vec![grad_alpha]));
            }

            if let Some(op) = self.x.backward_op() {
                op.backward();
            }
            if let Some(op) = self.clip.backward_op() {
                op.backward();
            }
        }
    }
}
