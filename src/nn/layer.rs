//! Layer node: tagged union over all layer variants

use super::{Container, Conv2d, Linear, ReLU};
use crate::quant::{QConv2d, QLinear, QReLU};
use crate::Tensor;

/// Type tag identifying a layer's kind, used as the rewrite registry key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Linear,
    Conv2d,
    ReLU,
    QLinear,
    QConv2d,
    QReLU,
    Container,
}

/// A node in the network's layer tree
///
/// Leaves are compute layers; `Container` nodes hold named children. The
/// quantized variants expose the same `forward` signature as the plain
/// layers they replace, so a rewritten tree is a drop-in substitute.
#[derive(Clone)]
pub enum Layer {
    Linear(Linear),
    Conv2d(Conv2d),
    ReLU(ReLU),
    QLinear(QLinear),
    QConv2d(QConv2d),
    QReLU(QReLU),
    Container(Container),
}

impl Layer {
    /// This node's type tag
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Linear(_) => LayerKind::Linear,
            Layer::Conv2d(_) => LayerKind::Conv2d,
            Layer::ReLU(_) => LayerKind::ReLU,
            Layer::QLinear(_) => LayerKind::QLinear,
            Layer::QConv2d(_) => LayerKind::QConv2d,
            Layer::QReLU(_) => LayerKind::QReLU,
            Layer::Container(_) => LayerKind::Container,
        }
    }

    /// Forward pass through this node
    pub fn forward(&self, x: &Tensor) -> Tensor {
        match self {
            Layer::Linear(l) => l.forward(x),
            Layer::Conv2d(l) => l.forward(x),
            Layer::ReLU(l) => l.forward(x),
            Layer::QLinear(l) => l.forward(x),
            Layer::QConv2d(l) => l.forward(x),
            Layer::QReLU(l) => l.forward(x),
            Layer::Container(c) => c.forward(x),
        }
    }

    /// All trainable parameters in traversal order
    ///
    /// Includes quantized layers' learnable clip thresholds, so a generic
    /// optimizer updates them without special-casing.
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        match self {
            Layer::Linear(l) => l.parameters_mut(),
            Layer::Conv2d(l) => l.parameters_mut(),
            Layer::ReLU(_) => Vec::new(),
            Layer::QLinear(l) => l.parameters_mut(),
            Layer::QConv2d(l) => l.parameters_mut(),
            Layer::QReLU(l) => l.parameters_mut(),
            Layer::Container(c) => {
                let mut params = Vec::new();
                for (_, child) in c.children_mut() {
                    params.extend(child.parameters_mut());
                }
                params
            }
        }
    }

    /// Total node count of the subtree rooted here (including this node)
    pub fn num_nodes(&self) -> usize {
        match self {
            Layer::Container(c) => {
                1 + c.children().iter().map(|(_, child)| child.num_nodes()).sum::<usize>()
            }
            _ => 1,
        }
    }

    /// Child-name skeleton of the subtree, for topology comparisons
    pub fn topology(&self) -> Vec<String> {
        fn walk(layer: &Layer, path: &str, out: &mut Vec<String>) {
            if let Layer::Container(c) = layer {
                for (name, child) in c.children() {
                    let child_path =
                        if path.is_empty() { name.clone() } else { format!("{path}.{name}") };
                    walk(child, &child_path, out);
                    out.push(child_path);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, "", &mut out);
        out.sort();
        out
    }

    /// Container view of this node, if it is one
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Layer::Container(c) => Some(c),
            _ => None,
        }
    }
}
