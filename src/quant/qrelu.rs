//! Clipped-and-quantized activation with a learnable threshold

use super::{pact_quantize, QuantConfig};
use crate::Tensor;

/// Initial clip threshold for freshly converted activations
pub const DEFAULT_CLIP_THRESHOLD: f32 = 6.0;

/// Quantization-aware activation layer
///
/// Replaces a plain ReLU. Clips to `[0, clip_threshold]` and rounds onto
/// `2^bits` levels; the threshold is a trainable scalar so the activation
/// range adapts during training. Starts disabled (plain ReLU behavior)
/// until a bit-width pass enables quantization.
#[derive(Clone)]
pub struct QReLU {
    clip_threshold: Tensor,
    quant: QuantConfig,
}

impl QReLU {
    /// Create with the default clip threshold
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_CLIP_THRESHOLD)
    }

    /// Create with an explicit initial clip threshold
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            clip_threshold: Tensor::from_vec(vec![threshold], true),
            quant: QuantConfig::full_precision(false),
        }
    }

    /// Forward pass
    pub fn forward(&self, x: &Tensor) -> Tensor {
        pact_quantize(x, &self.clip_threshold, &self.quant)
    }

    /// Learnable clip threshold (scalar tensor)
    pub fn clip_threshold(&self) -> &Tensor {
        &self.clip_threshold
    }

    /// Mutable clip threshold
    pub fn clip_threshold_mut(&mut self) -> &mut Tensor {
        &mut self.clip_threshold
    }

    /// Quantization state
    pub fn quant(&self) -> &QuantConfig {
        &self.quant
    }

    /// Mutable quantization state
    pub fn quant_mut(&mut self) -> &mut QuantConfig {
        &mut self.quant
    }

    /// Trainable parameters (the clip threshold)
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        vec![&mut self.clip_threshold]
    }
}

impl Default for QReLU {
    fn default() -> Self {
        Self::new()
    }
}
