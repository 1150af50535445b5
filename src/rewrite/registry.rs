//! Replacement registry: layer kind → conversion factory

use crate::errors::{Error, Result};
use crate::nn::{Layer, LayerKind};
use crate::quant::{QConv2d, QLinear, QReLU};
use std::collections::HashMap;

/// Conversion factory: consumes a matched layer, produces its replacement
pub type Factory = Box<dyn Fn(Layer) -> Result<Layer>>;

/// Registry mapping layer kinds to conversion factories
///
/// Registration is last-write-wins: registering a second factory for the
/// same kind silently replaces the first, so callers can override the
/// built-in conversions.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<LayerKind, Factory>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Register a factory for a layer kind, replacing any existing one
    pub fn register<F>(&mut self, kind: LayerKind, factory: F) -> &mut Self
    where
        F: Fn(Layer) -> Result<Layer> + 'static,
    {
        self.factories.insert(kind, Box::new(factory));
        self
    }

    /// Factory for a layer kind, if registered
    pub fn get(&self, kind: LayerKind) -> Option<&Factory> {
        self.factories.get(&kind)
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no kinds are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registry converting weight layers: `Linear` → [`QLinear`],
    /// `Conv2d` → [`QConv2d`]
    pub fn weight_layers() -> Self {
        let mut registry = Self::new();
        registry.register(LayerKind::Linear, |layer| match layer {
            Layer::Linear(l) => Ok(Layer::QLinear(QLinear::from_linear(l))),
            other => Err(mismatch(LayerKind::Linear, other.kind())),
        });
        registry.register(LayerKind::Conv2d, |layer| match layer {
            Layer::Conv2d(l) => Ok(Layer::QConv2d(QConv2d::from_conv(l))),
            other => Err(mismatch(LayerKind::Conv2d, other.kind())),
        });
        registry
    }

    /// Registry converting activations: `ReLU` → [`QReLU`]
    pub fn activations() -> Self {
        let mut registry = Self::new();
        registry.register(LayerKind::ReLU, |layer| match layer {
            Layer::ReLU(_) => Ok(Layer::QReLU(QReLU::new())),
            other => Err(mismatch(LayerKind::ReLU, other.kind())),
        });
        registry
    }
}

fn mismatch(expected: LayerKind, got: LayerKind) -> Error {
    Error::StructuralMismatch(format!(
        "factory registered for {expected:?} invoked on {got:?}"
    ))
}
