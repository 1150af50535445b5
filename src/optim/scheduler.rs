//! Learning rate scheduling

use super::Optimizer;
use std::f32::consts::PI;

/// Learning rate scheduler trait
pub trait LRScheduler {
    /// Get the current learning rate
    fn get_lr(&self) -> f32;

    /// Step the scheduler (called once per epoch)
    fn step(&mut self);
}

/// Cosine annealing learning rate scheduler
///
/// Decays the learning rate along a cosine curve from `lr_max` to `lr_min`:
///
/// ```text
/// lr_t = lr_min + 0.5 * (lr_max - lr_min) * (1 + cos(pi * t / T))
/// ```
pub struct CosineAnnealingLR {
    lr_max: f32,
    lr_min: f32,
    t_max: usize,
    current_step: usize,
}

impl CosineAnnealingLR {
    /// Create a new cosine annealing scheduler over `t_max` steps
    pub fn new(lr_max: f32, t_max: usize, lr_min: f32) -> Self {
        Self { lr_max, lr_min, t_max, current_step: 0 }
    }

    /// Create a scheduler decaying to zero
    pub fn default_min(lr_max: f32, t_max: usize) -> Self {
        Self::new(lr_max, t_max, 0.0)
    }

    /// Apply the current learning rate to an optimizer
    pub fn apply<O: Optimizer>(&self, optimizer: &mut O) {
        optimizer.set_lr(self.get_lr());
    }
}

impl LRScheduler for CosineAnnealingLR {
    fn get_lr(&self) -> f32 {
        if self.current_step >= self.t_max {
            return self.lr_min;
        }

        let progress = self.current_step as f32 / self.t_max as f32;
        let cosine_decay = 0.5 * (1.0 + (PI * progress).cos());
        self.lr_min + (self.lr_max - self.lr_min) * cosine_decay
    }

    fn step(&mut self) {
        self.current_step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::SGD;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cosine_starts_at_max() {
        let sched = CosineAnnealingLR::default_min(0.05, 100);
        assert_abs_diff_eq!(sched.get_lr(), 0.05, epsilon = 1e-7);
    }

    #[test]
    fn test_cosine_midpoint_is_half() {
        let mut sched = CosineAnnealingLR::default_min(0.1, 100);
        for _ in 0..50 {
            sched.step();
        }
        assert_abs_diff_eq!(sched.get_lr(), 0.05, epsilon = 1e-6);
    }

    #[test]
    fn test_cosine_ends_at_min() {
        let mut sched = CosineAnnealingLR::new(0.1, 10, 0.001);
        for _ in 0..10 {
            sched.step();
        }
        assert_abs_diff_eq!(sched.get_lr(), 0.001, epsilon = 1e-7);
        // Past the horizon the rate stays at the floor
        sched.step();
        assert_abs_diff_eq!(sched.get_lr(), 0.001, epsilon = 1e-7);
    }

    #[test]
    fn test_cosine_monotonically_decreasing() {
        let mut sched = CosineAnnealingLR::default_min(0.05, 150);
        let mut prev = sched.get_lr();
        for _ in 0..150 {
            sched.step();
            let lr = sched.get_lr();
            assert!(lr <= prev + 1e-9);
            prev = lr;
        }
    }

    #[test]
    fn test_apply_updates_optimizer() {
        let mut opt = SGD::new(0.05, 0.9, 0.0);
        let mut sched = CosineAnnealingLR::default_min(0.05, 2);
        sched.step();
        sched.apply(&mut opt);
        assert_abs_diff_eq!(opt.lr(), 0.025, epsilon = 1e-6);
    }
}
