//! Training loop: batches, losses, metrics, epoch driver

mod batch;
mod config;
mod loss;
mod metrics;
mod trainer;

pub use batch::Batch;
pub use config::TrainConfig;
pub use loss::{CrossEntropyLoss, LossFn};
pub use metrics::{topk_correct, AverageMeter};
pub use trainer::{train_epoch, validate, EpochStats};
