//! Training metrics: running averages and top-k accuracy

use crate::Tensor;

/// Running average of a streamed metric
#[derive(Clone, Debug, Default)]
pub struct AverageMeter {
    val: f32,
    sum: f32,
    count: usize,
}

impl AverageMeter {
    /// Create a meter with no observations
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `n` observations with value `val`
    pub fn update(&mut self, val: f32, n: usize) {
        self.val = val;
        self.sum += val * n as f32;
        self.count += n;
    }

    /// Most recent value
    pub fn val(&self) -> f32 {
        self.val
    }

    /// Average over all observations (0 when empty)
    pub fn avg(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f32
        }
    }

    /// Number of observations
    pub fn count(&self) -> usize {
        self.count
    }

    /// Discard all observations
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Whether the target class is among the `k` largest logits
pub fn topk_correct(logits: &Tensor, target_class: usize, k: usize) -> bool {
    let mut indices: Vec<usize> = (0..logits.len()).collect();
    indices.sort_by(|&a, &b| logits.data()[b].total_cmp(&logits.data()[a]));
    indices.iter().take(k).any(|&i| i == target_class)
}
