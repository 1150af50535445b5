//! Stochastic gradient descent with momentum and weight decay

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// SGD optimizer with optional momentum and L2 weight decay
///
/// Update rule per parameter:
/// ```text
/// g = grad + weight_decay * param
/// v = momentum * v - lr * g
/// param = param + v
/// ```
pub struct SGD {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocities: Vec<Option<Array1<f32>>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self { lr, momentum, weight_decay, velocities: Vec::new() }
    }

    fn ensure_velocities(&mut self, n: usize) {
        if self.velocities.len() != n {
            self.velocities = (0..n).map(|_| None).collect();
        }
    }
}

impl Optimizer for SGD {
    fn step_refs(&mut self, params: &mut [&mut Tensor]) {
        self.ensure_velocities(params.len());

        for (i, param) in params.iter_mut().enumerate() {
            if let Some(grad) = param.grad() {
                let grad = if self.weight_decay > 0.0 {
                    &grad + &(param.data() * self.weight_decay)
                } else {
                    grad
                };

                if self.momentum > 0.0 {
                    let velocity = match &self.velocities[i] {
                        Some(v) => v * self.momentum - &grad * self.lr,
                        None => &grad * (-self.lr),
                    };
                    *param.data_mut() = param.data() + &velocity;
                    self.velocities[i] = Some(velocity);
                } else {
                    *param.data_mut() = param.data() - &(&grad * self.lr);
                }
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}
