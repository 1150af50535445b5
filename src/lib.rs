//! cuantizar: quantization-aware training for small classification networks
//!
//! Takes a pretrained floating-point network, structurally rewrites its
//! compute layers into fake-quantized equivalents, and fine-tunes the result
//! at a reduced bit width. Quantization is simulated: the forward pass runs
//! quantize→dequantize while gradients update latent full-precision
//! parameters through straight-through estimators.
//!
//! # Typical flow
//!
//! ```no_run
//! use cuantizar::nn::Network;
//! use cuantizar::rewrite::{rewrite, set_bit_width, Registry};
//! # fn pretrained() -> Network { unimplemented!() }
//! # fn main() -> cuantizar::Result<()> {
//! let net = pretrained();
//!
//! // Stage 1: convert weight layers, then activations
//! let net = rewrite(net, &Registry::weight_layers())?;
//! let mut net = rewrite(net, &Registry::activations())?;
//!
//! // Stage 2: pick the target precision
//! set_bit_width(&mut net, 4)?;
//! # Ok(())
//! # }
//! ```
//!
//! Until `set_bit_width` runs, the converted network is numerically
//! identical to the original.

pub mod autograd;
pub mod errors;
pub mod io;
pub mod nn;
pub mod optim;
pub mod quant;
pub mod rewrite;
pub mod train;

pub use autograd::Tensor;
pub use errors::{Error, Result};
