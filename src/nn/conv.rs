//! 2D convolutional layer

use crate::autograd::{add_channel_bias, conv2d, Conv2dShape};
use crate::errors::{Error, Result};
use crate::Tensor;
use rand::Rng;

/// 2D convolutional layer over channel-major flattened images
///
/// The layer carries its full geometry ([`Conv2dShape`], including the input
/// spatial size) because tensors are flat 1D arrays.
#[derive(Clone)]
pub struct Conv2d {
    weight: Tensor,
    bias: Option<Tensor>,
    shape: Conv2dShape,
}

impl Conv2d {
    /// Create a layer with uniform Kaiming-style initialization
    pub fn new(shape: Conv2dShape, bias: bool) -> Self {
        let mut rng = rand::thread_rng();
        let fan_in = shape.in_channels * shape.kernel * shape.kernel;
        let bound = 1.0 / (fan_in as f32).sqrt();
        let weight_data: Vec<f32> =
            (0..shape.weight_len()).map(|_| rng.gen_range(-bound..bound)).collect();
        let weight = Tensor::from_vec(weight_data, true);
        let bias = bias.then(|| Tensor::zeros(shape.out_channels, true));

        Self { weight, bias, shape }
    }

    /// Create a layer from existing parameters
    ///
    /// Fails with [`Error::StructuralMismatch`] if the tensors do not match
    /// the declared geometry.
    pub fn from_params(weight: Tensor, bias: Option<Tensor>, shape: Conv2dShape) -> Result<Self> {
        if weight.len() != shape.weight_len() {
            return Err(Error::StructuralMismatch(format!(
                "conv weight length {}, expected {}",
                weight.len(),
                shape.weight_len()
            )));
        }
        if let Some(b) = &bias {
            if b.len() != shape.out_channels {
                return Err(Error::StructuralMismatch(format!(
                    "conv bias length {}, expected {}",
                    b.len(),
                    shape.out_channels
                )));
            }
        }
        Ok(Self { weight, bias, shape })
    }

    /// Forward pass: convolution plus per-channel bias
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let out = conv2d(x, &self.weight, &self.shape);
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

    /// Weight tensor
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

    /// Trainable parameters (weight and bias)
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.weight];
        if let Some(b) = self.bias.as_mut() {
            params.push(b);
        }
        params
    }

    /// Move the parameters out of the layer
    pub(crate) fn into_params(self) -> (Tensor, Option<Tensor>, Conv2dShape) {
        (self.weight, self.bias, self.shape)
    }
}
