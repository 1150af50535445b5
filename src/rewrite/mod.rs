//! Layer-graph rewriting for quantization-aware training
//!
//! The rewrite engine walks a network's layer tree and replaces nodes whose
//! kind is registered with a factory, producing a structurally identical
//! network whose compute layers are quantization-aware. Conversion is staged:
//!
//! 1. Rewrite weight layers ([`Registry::weight_layers`])
//! 2. Rewrite activations ([`Registry::activations`])
//! 3. Set the target precision ([`set_bit_width`])
//!
//! Until step 3 the converted network is numerically identical to the
//! original, so the two passes can be validated independently.

mod bits;
mod engine;
mod registry;

pub use bits::set_bit_width;
pub use engine::rewrite;
pub use registry::Registry;
