//! Epoch-level train and validate loops

use super::{topk_correct, AverageMeter, Batch, LossFn};
use crate::autograd::backward;
use crate::nn::Network;
use crate::optim::Optimizer;

/// Aggregate metrics for one pass over a batch source
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochStats {
    /// Mean loss
    pub loss: f32,
    /// Top-1 accuracy in `[0, 1]`
    pub top1: f32,
    /// Top-5 accuracy in `[0, 1]`
    pub top5: f32,
}

/// Run one training epoch over a batch source
///
/// Per batch: forward, loss, backward, optimizer step, zero gradients. The
/// optimizer sees every trainable parameter, including quantized layers'
/// latent weights and learnable clip thresholds.
pub fn train_epoch<'a, I, L, O>(
    network: &mut Network,
    batches: I,
    loss_fn: &L,
    optimizer: &mut O,
) -> EpochStats
where
    I: IntoIterator<Item = &'a Batch>,
    L: LossFn + ?Sized,
    O: Optimizer + ?Sized,
{
    let mut losses = AverageMeter::new();
    let mut top1 = AverageMeter::new();
    let mut top5 = AverageMeter::new();

    for batch in batches {
        let output = network.forward(&batch.inputs);
        let mut loss = loss_fn.forward(&output, &batch.targets);

        let target = batch.target_class();
        losses.update(loss.data()[0], 1);
        top1.update(f32::from(u8::from(topk_correct(&output, target, 1))), 1);
        top5.update(f32::from(u8::from(topk_correct(&output, target, 5))), 1);

        backward(&mut loss, None);

        let mut params = network.parameters_mut();
        optimizer.step_refs(&mut params);
        optimizer.zero_grad_refs(&mut params);
    }

    EpochStats { loss: losses.avg(), top1: top1.avg(), top5: top5.avg() }
}

/// Run one evaluation pass over a batch source (no parameter updates)
pub fn validate<'a, I, L>(network: &Network, batches: I, loss_fn: &L) -> EpochStats
where
    I: IntoIterator<Item = &'a Batch>,
    L: LossFn + ?Sized,
{
    let mut losses = AverageMeter::new();
    let mut top1 = AverageMeter::new();
    let mut top5 = AverageMeter::new();

    for batch in batches {
        let output = network.forward(&batch.inputs);
        let loss = loss_fn.forward(&output, &batch.targets);

        let target = batch.target_class();
        losses.update(loss.data()[0], 1);
        top1.update(f32::from(u8::from(topk_correct(&output, target, 1))), 1);
        top5.update(f32::from(u8::from(topk_correct(&output, target, 5))), 1);
    }

    EpochStats { loss: losses.avg(), top1: top1.avg(), top5: top5.avg() }
}
