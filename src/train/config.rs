//! Training configuration

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Hyperparameters for a QAT fine-tuning run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of fine-tuning epochs
    pub epochs: usize,
    /// Initial learning rate (annealed to zero over `epochs`)
    pub lr: f32,
    /// SGD momentum
    pub momentum: f32,
    /// L2 weight decay
    pub weight_decay: f32,
    /// Target quantization bit width
    pub bits: u32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { epochs: 150, lr: 0.05, momentum: 0.9, weight_decay: 4e-5, bits: 4 }
    }
}

impl TrainConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".to_string()));
        }
        if self.lr <= 0.0 || !self.lr.is_finite() {
            return Err(Error::InvalidConfig(format!("invalid learning rate {}", self.lr)));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(Error::InvalidConfig(format!("invalid momentum {}", self.momentum)));
        }
        if self.weight_decay < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "invalid weight decay {}",
                self.weight_decay
            )));
        }
        if self.bits == 0 {
            return Err(Error::InvalidConfig("bit width must be positive".to_string()));
        }
        Ok(())
    }
}
