//! Fully-connected layer with weight fake quantization

use super::{quantize_weights, QuantConfig};
use crate::autograd::{add, matmul};
use crate::errors::Result;
use crate::nn::Linear;
use crate::Tensor;

/// Quantization-aware fully-connected layer
///
/// Holds the latent full-precision weight; the forward pass runs the matmul
/// against the fake-quantized weight while gradients update the latent one.
/// Freshly converted layers start with a disabled config, so they are
/// numerically identical to the [`Linear`] they replaced until a
/// bit-width pass enables quantization.
#[derive(Clone)]
pub struct QLinear {
    weight: Tensor,
    bias: Option<Tensor>,
    d_out: usize,
    d_in: usize,
    quant: QuantConfig,
}

impl QLinear {
    /// Convert a plain layer, taking ownership of its parameters
    pub fn from_linear(layer: Linear) -> Self {
        let (weight, bias, d_out, d_in) = layer.into_params();
        Self { weight, bias, d_out, d_in, quant: QuantConfig::full_precision(false) }
    }

    /// Create a layer from existing parameters and quantization state
    pub fn from_params(
        weight: Tensor,
        bias: Option<Tensor>,
        d_out: usize,
        d_in: usize,
        quant: QuantConfig,
    ) -> Result<Self> {
        let layer = Linear::from_params(weight, bias, d_out, d_in)?;
        let (weight, bias, d_out, d_in) = layer.into_params();
        Ok(Self { weight, bias, d_out, d_in, quant })
    }

    /// Forward pass: y = Q(W) @ x + b
    pub fn forward(&self, x: &Tensor) -> Tensor {
        assert_eq!(x.len(), self.d_in, "linear input size mismatch");

        let qw = quantize_weights(&self.weight, &self.quant, self.d_out);
        let out = matmul(&qw, x, self.d_out, self.d_in, 1);
        match &self.bias {
            Some(b) => add(&out, b),
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

    /// Input dimension
    pub fn d_in(&self) -> usize {
        self.d_in
    }

    /// Output dimension
    pub fn d_out(&self) -> usize {
        self.d_out
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_converted_layer_matches_plain_forward() {
        let weight = Tensor::from_vec(vec![0.3, -0.7, 0.2, 0.5], true);
        let bias = Tensor::from_vec(vec![0.1, -0.1], true);
        let plain = Linear::from_params(weight, Some(bias), 2, 2).unwrap();

        let x = Tensor::from_vec(vec![1.0, 2.0], false);
        let expected = plain.forward(&x);

        let q = QLinear::from_linear(plain);
        let actual = q.forward(&x);
        assert_eq!(actual.data().to_vec(), expected.data().to_vec());
    }

    #[test]
    fn test_enabled_quantization_changes_output() {
        let weight = Tensor::from_vec(vec![0.31, -0.77, 0.23, 0.52], true);
        let plain = Linear::from_params(weight, None, 2, 2).unwrap();
        let x = Tensor::from_vec(vec![1.0, 1.0], false);
        let full = plain.forward(&x);

        let mut q = QLinear::from_linear(plain);
        q.quant_mut().set_bits(2).unwrap();
        let quantized = q.forward(&x);

        assert_ne!(quantized.data().to_vec(), full.data().to_vec());
        // Outputs stay in the same ballpark (bounded quantization error)
        for (a, b) in quantized.data().iter().zip(full.data().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1.0);
        }
    }

    #[test]
    fn test_gradient_reaches_latent_weight() {
        let weight = Tensor::from_vec(vec![0.3, -0.7], true);
        let plain = Linear::from_params(weight, None, 1, 2).unwrap();
        let mut q = QLinear::from_linear(plain);
        q.quant_mut().set_bits(4).unwrap();

        let x = Tensor::from_vec(vec![1.0, 2.0], false);
        let mut y = q.forward(&x);
        crate::autograd::backward(&mut y, None);

        // STE then matmul backward: grad_W = grad_y ⊗ x
        let grad = q.weight().grad().unwrap();
        assert_eq!(grad.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_parameters_exclude_quant_state() {
        let plain = Linear::new(3, 2, true);
        let mut q = QLinear::from_linear(plain);
        assert_eq!(q.parameters_mut().len(), 2);
    }
}
