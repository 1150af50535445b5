//! 2D convolution autograd operation
//!
//! Direct (non-im2col) convolution over a single image stored channel-major:
//! input is `[in_channels * h * w]`, weight is
//! `[out_channels * in_channels * kernel * kernel]`, output is
//! `[out_channels * out_h * out_w]`. Bias is applied separately via
//! `add_channel_bias` so the weight path stays a single op.

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Spatial geometry of a convolution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Conv2dShape {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub stride: usize,
    pub padding: usize,
    pub in_h: usize,
    pub in_w: usize,
}

impl Conv2dShape {
    /// Output height
    pub fn out_h(&self) -> usize {
        (self.in_h + 2 * self.padding - self.kernel) / self.stride + 1
    }

    /// Output width
    pub fn out_w(&self) -> usize {
        (self.in_w + 2 * self.padding - self.kernel) / self.stride + 1
    }

    /// Flattened input length
    pub fn input_len(&self) -> usize {
        self.in_channels * self.in_h * self.in_w
    }

    /// Flattened weight length
    pub fn weight_len(&self) -> usize {
        self.out_channels * self.in_channels * self.kernel * self.kernel
    }

    /// Flattened output length
    pub fn output_len(&self) -> usize {
        self.out_channels * self.out_h() * self.out_w()
    }
}

fn conv2d_compute(x: &[f32], w: &[f32], s: &Conv2dShape) -> Vec<f32> {
    let (out_h, out_w) = (s.out_h(), s.out_w());
    let mut out = vec![0.0f32; s.out_channels * out_h * out_w];

    for oc in 0..s.out_channels {
        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut acc = 0.0f32;
                for ic in 0..s.in_channels {
                    for ky in 0..s.kernel {
                        let iy = (oy * s.stride + ky) as isize - s.padding as isize;
                        if iy < 0 || iy as usize >= s.in_h {
                            continue;
                        }
                        for kx in 0..s.kernel {
                            let ix = (ox * s.stride + kx) as isize - s.padding as isize;
                            if ix < 0 || ix as usize >= s.in_w {
                                continue;
                            }
                            let x_idx = (ic * s.in_h + iy as usize) * s.in_w + ix as usize;
                            let w_idx =
                                ((oc * s.in_channels + ic) * s.kernel + ky) * s.kernel + kx;
                            acc += x[x_idx] * w[w_idx];
                        }
                    }
                }
                out[(oc * out_h + oy) * out_w + ox] = acc;
            }
        }
    }

    out
}

/// 2D convolution
///
/// # Arguments
/// * `x` - Input image `[in_channels * in_h * in_w]`
/// * `w` - Filter weights `[out_channels * in_channels * kernel * kernel]`
/// * `shape` - Convolution geometry
pub fn conv2d(x: &Tensor, w: &Tensor, shape: &Conv2dShape) -> Tensor {
    assert_eq!(x.len(), shape.input_len(), "conv input size mismatch");
    assert_eq!(w.len(), shape.weight_len(), "conv weight size mismatch");

    let result_data = conv2d_compute(
        x.data().as_slice().expect("conv input must be contiguous"),
        w.data().as_slice().expect("conv weight must be contiguous"),
        shape,
    );

    let requires_grad = x.requires_grad() || w.requires_grad();
    let mut result = Tensor::new(Array1::from(result_data), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(Conv2dBackward {
            x: x.clone(),
            w: w.clone(),
            shape: *shape,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct Conv2dBackward {
    x: Tensor,
    w: Tensor,
    shape: Conv2dShape,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for Conv2dBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            let s = &self.shape;
            let (out_h, out_w) = (s.out_h(), s.out_w());
            let grad_out = grad_output.as_slice().expect("gradient must be contiguous");
            let x_data = self.x.data();
            let w_data = self.w.data();
            let x = x_data.as_slice().expect("conv input must be contiguous");
            let w = w_data.as_slice().expect("conv weight must be contiguous");

            let mut grad_x = vec![0.0f32; s.input_len()];
            let mut grad_w = vec![0.0f32; s.weight_len()];

            // Scatter each output gradient back over its receptive field
            for oc in 0..s.out_channels {
                for oy in 0..out_h {
                    for ox in 0..out_w {
                        let g = grad_out[(oc * out_h + oy) * out_w + ox];
                        if g == 0.0 {
                            continue;
                        }
                        for ic in 0..s.in_channels {
                            for ky in 0..s.kernel {
                                let iy = (oy * s.stride + ky) as isize - s.padding as isize;
                                if iy < 0 || iy as usize >= s.in_h {
                                    continue;
                                }
                                for kx in 0..s.kernel {
                                    let ix = (ox * s.stride + kx) as isize - s.padding as isize;
                                    if ix < 0 || ix as usize >= s.in_w {
                                        continue;
                                    }
                                    let x_idx =
                                        (ic * s.in_h + iy as usize) * s.in_w + ix as usize;
                                    let w_idx = ((oc * s.in_channels + ic) * s.kernel + ky)
                                        * s.kernel
                                        + kx;
                                    grad_x[x_idx] += g * w[w_idx];
                                    grad_w[w_idx] += g * x[x_idx];
                                }
                            }
                        }
                    }
                }
            }

            if self.x.requires_grad() {
                self.x.accumulate_grad(Array1::from(grad_x));
            }
            if self.w.requires_grad() {
                self.w.accumulate_grad(Array1::from(grad_w));
            }

            if let Some(op) = self.x.backward_op() {
                op.backward();
            }
            if let Some(op) = self.w.backward_op() {
                op.backward();
            }
        }
    }
}
