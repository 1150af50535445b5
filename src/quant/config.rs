//! Quantization state carried by quantized layer variants

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bit width treated as the full-precision sentinel: quantization becomes
/// the identity and gradients pass through unchanged.
pub const FULL_PRECISION_BITS: u32 = 32;

/// Quantization state: target precision and mode
///
/// `bits` is the number of bits per value (positive, typically 1–8),
/// `enabled` switches fake quantization on or off, and `per_channel`
/// selects whether the weight scale is computed per output channel or over
/// the whole tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantConfig {
    pub bits: u32,
    pub enabled: bool,
    pub per_channel: bool,
}

impl QuantConfig {
    /// Create an enabled config with the given precision
    pub fn new(bits: u32, per_channel: bool) -> Result<Self> {
        if bits == 0 {
            return Err(Error::InvalidConfig("bit width must be positive".to_string()));
        }
        Ok(Self { bits, enabled: true, per_channel })
    }

    /// Disabled, full-precision config (identity fake quantization)
    pub fn full_precision(per_channel: bool) -> Self {
        Self { bits: FULL_PRECISION_BITS, enabled: false, per_channel }
    }

    /// Whether fake quantization currently reduces to the identity
    pub fn is_identity(&self) -> bool {
        !self.enabled || self.bits >= FULL_PRECISION_BITS
    }

    /// Positive signed levels per side for the weight scheme:
    /// `n = 2^(bits-1) - 1`, giving `2^bits - 1` signed levels in `[-1, 1]`
    /// with step `1/n`. Only meaningful for `bits >= 2`; binary weights
    /// bypass the uniform formula and use sign quantization instead.
    pub fn signed_levels(&self) -> f32 {
        ((1u64 << (self.bits - 1)) - 1) as f32
    }

    /// Number of steps for the unsigned activation scheme:
    /// `2^bits - 1`, giving `2^bits` levels in `[0, clip_threshold]`.
    pub fn unsigned_steps(&self) -> f32 {
        ((1u64 << self.bits) - 1) as f32
    }

    /// Reset the precision and re-enable quantization
    ///
    /// Used by the bit-width reconfiguration pass; learnable state such as
    /// clip thresholds is deliberately untouched.
    pub fn set_bits(&mut self, bits: u32) -> Result<()> {
        if bits == 0 {
            return Err(Error::InvalidConfig("bit width must be positive".to_string()));
        }
        self.bits = bits;
        self.enabled = true;
        Ok(())
    }
}
