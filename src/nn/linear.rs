//! Fully-connected layer

use crate::autograd::{add, matmul};
use crate::errors::{Error, Result};
use crate::Tensor;
use rand::Rng;

/// Fully-connected layer: y = W @ x + b
///
/// The weight matrix is stored flattened row-major as `[d_out * d_in]`.
#[derive(Clone)]
pub struct Linear {
    weight: Tensor,
    bias: Option<Tensor>,
    d_out: usize,
    d_in: usize,
}

impl Linear {
    /// Create a layer with uniform Kaiming-style initialization
    pub fn new(d_in: usize, d_out: usize, bias: bool) -> Self {
        let mut rng = rand::thread_rng();
        let bound = 1.0 / (d_in as f32).sqrt();
        let weight_data: Vec<f32> =
            (0..d_out * d_in).map(|_| rng.gen_range(-bound..bound)).collect();
        let weight = Tensor::from_vec(weight_data, true);
        let bias = bias.then(|| Tensor::zeros(d_out, true));

        Self { weight, bias, d_out, d_in }
    }

    /// Create a layer from existing parameters
    ///
    /// Fails with [`Error::StructuralMismatch`] if the tensors do not match
    /// the declared dimensions.
    pub fn from_params(
        weight: Tensor,
        bias: Option<Tensor>,
        d_out: usize,
        d_in: usize,
    ) -> Result<Self> {
        if weight.len() != d_out * d_in {
            return Err(Error::StructuralMismatch(format!(
                "linear weight length {}, expected {} ({}x{})",
                weight.len(),
                d_out * d_in,
                d_out,
                d_in
            )));
        }
        if let Some(b) = &bias {
            if b.len() != d_out {
                return Err(Error::StructuralMismatch(format!(
                    "linear bias length {}, expected {d_out}",
                    b.len()
                )));
            }
        }
        Ok(Self { weight, bias, d_out, d_in })
    }

    /// Forward pass: y = W @ x + b
    pub fn forward(&self, x: &Tensor) -> Tensor {
        assert_eq!(x.len(), self.d_in, "linear input size mismatch");

        let out = matmul(&self.weight, x, self.d_out, self.d_in, 1);
        match &self.bias {
            Some(b) => add(&out, b),
            None => out,
        }
    }

    /// Weight tensor
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

    /// Trainable parameters (weight and bias)
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.weight];
        if let Some(b) = self.bias.as_mut() {
            params.push(b);
        }
        params
    }

    /// Move the parameters out of the layer
    pub(crate) fn into_params(self) -> (Tensor, Option<Tensor>, usize, usize) {
        (self.weight, self.bias, self.d_out, self.d_in)
    }
}
