//! Bit-width reconfiguration pass

use crate::errors::{Error, Result};
use crate::nn::{Layer, Network};

/// Set the target precision of every quantization-aware layer in the network
///
/// Recursively visits the tree, sets `bits` and enables quantization on each
/// quantized layer's config. Learnable state (weights, biases, clip
/// thresholds) is never touched, so the pass is safe to re-run mid-training
/// with a different precision. Plain layers are skipped.
///
/// Fails with [`Error::InvalidConfig`] for `bits == 0` before mutating
/// anything.
pub fn set_bit_width(network: &mut Network, bits: u32) -> Result<()> {
    if bits == 0 {
        return Err(Error::InvalidConfig("bit width must be positive".to_string()));
    }
    visit(network.root_mut(), bits)
}

fn visit(layer: &mut Layer, bits: u32) -> Result<()> {
    match layer {
        Layer::QLinear(l) => l.quant_mut().set_bits(bits),
        Layer::QConv2d(l) => l.quant_mut().set_bits(bits),
        Layer::QReLU(l) => l.quant_mut().set_bits(bits),
        Layer::Container(c) => {
            for (_, child) in c.children_mut() {
                visit(child, bits)?;
            }
            Ok(())
        }
        Layer::Linear(_) | Layer::Conv2d(_) | Layer::ReLU(_) => Ok(()),
    }
}
