//! Loss functions

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Compute the scalar loss for one prediction/target pair
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Loss function name
    fn name(&self) -> &'static str;
}

/// Cross entropy loss for classification
///
/// `L = -sum(targets * log(softmax(predictions)))`
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Numerically stable softmax: exp(x_i - max) / sum(exp(x_j - max))
    pub(crate) fn softmax(x: &Array1<f32>) -> Array1<f32> {
        let max = x.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let exp_x: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp_x.sum();
        exp_x / sum
    }
}

impl LossFn for CrossEntropyLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have same length"
        );

        let probs = Self::softmax(predictions.data());

        let ce: f32 = targets
            .data()
            .iter()
            .zip(probs.iter())
            .map(|(&t, &p)| -t * (p + 1e-10).max(f32::MIN_POSITIVE).ln())
            .sum();

        let mut loss = Tensor::from_vec(vec![ce], true);

        if predictions.requires_grad() {
            // d(CE)/d(logits) = probs - targets
            let grad = &probs - targets.data();
            loss.set_backward_op(Rc::new(CrossEntropyBackward {
                predictions: predictions.clone(),
                grad,
                result_grad: loss.grad_cell(),
            }));
        }

        loss
    }

    fn name(&self) -> &'static str {
        "CrossEntropy"
    }
}

struct CrossEntropyBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for CrossEntropyBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            // Scalar loss: the seed gradient scales the logit gradient
            self.predictions.accumulate_grad(&self.grad * grad[0]);

            if let Some(op) = self.predictions.backward_op() {
                op.backward();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_cross_entropy_positive_and_finite() {
        let loss_fn = CrossEntropyLoss;
        let logits = Tensor::from_vec(vec![2.0, 1.0, 0.5], true);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0], false);

        let loss = loss_fn.forward(&logits, &targets);
        assert!(loss.data()[0] > 0.0);
        assert!(loss.data()[0].is_finite());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = CrossEntropyLoss::softmax(&Array1::from(vec![1.0, 2.0, 3.0]));
        assert_relative_eq!(probs.sum(), 1.0, epsilon = 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_confident_correct_prediction_has_low_loss() {
        let loss_fn = CrossEntropyLoss;
        let confident = Tensor::from_vec(vec![10.0, 0.0, 0.0], false);
        let uncertain = Tensor::from_vec(vec![0.0, 0.0, 0.0], false);
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0], false);

        let low = loss_fn.forward(&confident, &targets);
        let high = loss_fn.forward(&uncertain, &targets);
        assert!(low.data()[0] < high.data()[0]);
    }

    #[test]
    fn test_gradient_is_probs_minus_targets() {
        let loss_fn = CrossEntropyLoss;
        let logits = Tensor::from_vec(vec![1.0, 1.0, 1.0], true);
        let targets = Tensor::from_vec(vec![0.0, 1.0, 0.0], false);

        let mut loss = loss_fn.forward(&logits, &targets);
        crate::autograd::backward(&mut loss, None);

        let grad = logits.grad().unwrap();
        let third = 1.0 / 3.0;
        assert_abs_diff_eq!(grad[0], third, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[1], third - 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(grad[2], third, epsilon = 1e-6);
    }
}
