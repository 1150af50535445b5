//! Backward operation trait for the gradient tape

/// Trait for backward operations in the computational graph
///
/// Each differentiable operation records one of these on its output tensor.
/// Calling `backward` propagates the output gradient to the operation's
/// inputs and recurses into their recorded operations.
pub trait BackwardOp {
    /// Propagate gradients to this operation's inputs
    fn backward(&self);
}
