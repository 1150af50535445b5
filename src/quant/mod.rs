//! Fake quantization for quantization-aware training (QAT)
//!
//! Fake quantization simulates the effects of reduced precision during
//! training:
//! - Forward: quantize → dequantize (simulates quantization noise)
//! - Backward: straight-through estimator (STE) passes gradients through a
//!   defined valid range
//!
//! Two schemes are provided:
//! - DoReFa-style weight quantization: sign-preserving uniform levels over
//!   the tensor's (or each output channel's) max-magnitude range
//! - PACT-style activation quantization: unsigned uniform levels over
//!   `[0, clip_threshold]` with a learnable threshold

mod config;
mod dorefa;
mod pact;
mod qconv;
mod qlinear;
mod qrelu;


pub use config::{QuantConfig, FULL_PRECISION_BITS};
pub use dorefa::quantize_weights;
pub use pact::pact_quantize;
pub use qconv::QConv2d;
pub use qlinear::QLinear;
pub use qrelu::{QReLU, DEFAULT_CLIP_THRESHOLD};
