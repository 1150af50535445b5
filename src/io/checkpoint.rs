//! Serde checkpoints: parameters, quantization state, training progress
//!
//! Tensors are keyed by dotted child paths (`block.fc.weight`), quantization
//! configs by the owning layer's path. Loading is tolerant of missing
//! entries: a full-precision checkpoint loads into a rewritten network, after
//! which the caller re-runs the bit-width pass to restore the target
//! precision.

use crate::errors::{Error, Result};
use crate::nn::{Layer, Network};
use crate::quant::QuantConfig;
use crate::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name of the best-metric copy written next to a checkpoint
pub const BEST_FILE_NAME: &str = "model_best.json";

/// Flat snapshot of a network's parameters and quantization state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    /// Parameter values keyed by dotted path
    pub tensors: BTreeMap<String, Vec<f32>>,
    /// Quantization configs keyed by the owning layer's dotted path
    pub quant: BTreeMap<String, QuantConfig>,
}

/// A checkpoint: snapshot plus training progress
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last completed epoch
    pub epoch: usize,
    /// Best top-1 accuracy seen so far
    pub best_top1: f32,
    /// Network snapshot
    pub state: StateDict,
}

fn child_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn named_tensors(layer: &Layer) -> Vec<(&'static str, &Tensor)> {
    fn weighted<'a>(w: &'a Tensor, b: Option<&'a Tensor>) -> Vec<(&'static str, &'a Tensor)> {
        let mut out = vec![("weight", w)];
        if let Some(b) = b {
            out.push(("bias", b));
        }
        out
    }

    match layer {
        Layer::Linear(l) => weighted(l.weight(), l.bias()),
        Layer::Conv2d(l) => weighted(l.weight(), l.bias()),
        Layer::QLinear(l) => weighted(l.weight(), l.bias()),
        Layer::QConv2d(l) => weighted(l.weight(), l.bias()),
        Layer::QReLU(l) => vec![("clip_threshold", l.clip_threshold())],
        Layer::ReLU(_) | Layer::Container(_) => Vec::new(),
    }
}

fn quant_config(layer: &Layer) -> Option<QuantConfig> {
    match layer {
        Layer::QLinear(l) => Some(*l.quant()),
        Layer::QConv2d(l) => Some(*l.quant()),
        Layer::QReLU(l) => Some(*l.quant()),
        _ => None,
    }
}

/// Extract a network's parameters and quantization state
pub fn state_dict(network: &Network) -> StateDict {
    fn collect(layer: &Layer, path: &str, dict: &mut StateDict) {
        for (name, tensor) in named_tensors(layer) {
            dict.tensors.insert(child_path(path, name), tensor.data().to_vec());
        }
        if let Some(config) = quant_config(layer) {
            dict.quant.insert(path.to_string(), config);
        }
        if let Layer::Container(c) = layer {
            for (name, child) in c.children() {
                collect(child, &child_path(path, name), dict);
            }
        }
    }

    let mut dict = StateDict::default();
    collect(network.root(), "", &mut dict);
    dict
}

/// Load a snapshot into a network
///
/// Entries the network does not have fail with [`Error::Checkpoint`]; a
/// present entry whose length differs from the target tensor fails with
/// [`Error::StructuralMismatch`]. Network tensors absent from the snapshot
/// are left untouched.
pub fn load_state_dict(network: &mut Network, dict: &StateDict) -> Result<()> {
    fn write_tensor(tensor: &mut Tensor, path: &str, values: &[f32]) -> Result<()> {
        if tensor.len() != values.len() {
            return Err(Error::StructuralMismatch(format!(
                "checkpoint tensor '{path}' has length {}, network expects {}",
                values.len(),
                tensor.len()
            )));
        }
        tensor.data_mut().assign(&ndarray::Array1::from(values.to_vec()));
        Ok(())
    }

    fn apply(
        layer: &mut Layer,
        path: &str,
        dict: &StateDict,
        consumed: &mut usize,
    ) -> Result<()> {
        if let Some(config) = dict.quant.get(path) {
            match layer {
                Layer::QLinear(l) => *l.quant_mut() = *config,
                Layer::QConv2d(l) => *l.quant_mut() = *config,
                Layer::QReLU(l) => *l.quant_mut() = *config,
                _ => {
                    return Err(Error::Checkpoint(format!(
                        "quantization state for non-quantized layer '{path}'"
                    )))
                }
            }
            *consumed += 1;
        }

        match layer {
            Layer::Container(c) => {
                for (name, child) in c.children_mut() {
                    apply(child, &child_path(path, name), dict, consumed)?;
                }
            }
            Layer::QReLU(l) => {
                let key = child_path(path, "clip_threshold");
                if let Some(values) = dict.tensors.get(&key) {
                    write_tensor(l.clip_threshold_mut(), &key, values)?;
                    *consumed += 1;
                }
            }
            _ => {
                // Weight-carrying leaves expose parameters as [weight, bias?]
                let names = ["weight", "bias"];
                for (i, tensor) in layer.parameters_mut().into_iter().enumerate() {
                    let key = child_path(path, names[i]);
                    if let Some(values) = dict.tensors.get(&key) {
                        write_tensor(tensor, &key, values)?;
                        *consumed += 1;
                    }
                }
            }
        }
        Ok(())
    }

    let mut consumed = 0;
    apply(network.root_mut(), "", dict, &mut consumed)?;

    if consumed < dict.tensors.len() + dict.quant.len() {
        return Err(Error::Checkpoint(format!(
            "{} checkpoint entries matched no network layer",
            dict.tensors.len() + dict.quant.len() - consumed
        )));
    }
    Ok(())
}

/// Write a checkpoint to `path`; when `is_best`, also copy it to
/// [`BEST_FILE_NAME`] in the same directory
pub fn save_checkpoint(checkpoint: &Checkpoint, path: &Path, is_best: bool) -> Result<()> {
    let json = serde_json::to_string(checkpoint)?;
    fs::write(path, &json)?;

    if is_best {
        let best = match path.parent() {
            Some(dir) => dir.join(BEST_FILE_NAME),
            None => Path::new(BEST_FILE_NAME).to_path_buf(),
        };
        fs::write(best, &json)?;
    }
    Ok(())
}

/// Read a checkpoint from `path`
pub fn load_checkpoint(path: &Path) -> Result<Checkpoint> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
