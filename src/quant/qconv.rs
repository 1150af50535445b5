//! 2D convolutional layer with weight fake quantization

use super::{quantize_weights, QuantConfig};
use crate::autograd::{add_channel_bias, conv2d, Conv2dShape};
use crate::errors::Result;
use crate::nn::Conv2d;
use crate::Tensor;

/// Quantization-aware 2D convolutional layer
///
/// Same contract as [`QLinear`](super::QLinear): latent full-precision
/// weight, fake-quantized forward, straight-through backward. Convolution
/// weights default to per-channel scales (one per output filter), which
/// preserves filters whose magnitudes differ by orders of magnitude.
#[derive(Clone)]
pub struct QConv2d {
    weight: Tensor,
    bias: Option<Tensor>,
    shape: Conv2dShape,
    quant: QuantConfig,
}

impl QConv2d {
    /// Convert a plain layer, taking ownership of its parameters
    pub fn from_conv(layer: Conv2d) -> Self {
        let (weight, bias, shape) = layer.into_params();
        Self { weight, bias, shape, quant: QuantConfig::full_precision(true) }
    }

    /// Create a layer from existing parameters and quantization state
    pub fn from_params(
        weight: Tensor,
        bias: Option<Tensor>,
        shape: Conv2dShape,
        quant: QuantConfig,
    ) -> Result<Self> {
        let layer = Conv2d::from_params(weight, bias, shape)?;
        let (weight, bias, shape) = layer.into_params();
        Ok(Self { weight, bias, shape, quant })
    }

    /// Forward pass: convolution with the fake-quantized weight
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let qw = quantize_weights(&self.weight, &self.quant, self.shape.out_channels);
        let out = conv2d(x, &qw, &self.shape);
        match &self.bias {
            Some(b) => add_channel_bias(
                &out,
                b,
                self.shape.out_channels,
                self.shape.out_h() * self.shape.out_w(),
            ),
            None => out,
        }
    }

    /// Latent full-precision weight
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Bias tensor, if present
    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }

    /// Convolution geometry
    pub fn shape(&self) -> &Conv2dShape {
        &self.shape
    }

    /// Quantization state
    pub fn quant(&self) -> &QuantConfig {
        &self.quant
    }

    /// Mutable quantization state
    pub fn quant_mut(&mut self) -> &mut QuantConfig {
        &mut self.quant
    }

    /// Trainable parameters (latent weight and bias)
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.weight];
        if let Some(b) = self.bias.as_mut() {
            params.push(b);
        }
        params
    }
}
