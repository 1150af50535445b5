//! Sequential container of named child layers

use super::Layer;
use crate::Tensor;

/// Container holding an ordered mapping from child name to child layer
///
/// Children execute sequentially in declared order; the same order governs
/// tree traversal, so rewriting and reconfiguration are deterministic.
#[derive(Clone, Default)]
pub struct Container {
    children: Vec<(String, Layer)>,
}

impl Container {
    /// Create an empty container
    pub fn new() -> Self {
        Self { children: Vec::new() }
    }

    /// Append a named child
    pub fn add(&mut self, name: impl Into<String>, layer: Layer) -> &mut Self {
        self.children.push((name.into(), layer));
        self
    }

    /// Forward pass: children applied sequentially in declared order
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let mut out = x.clone();
        for (_, child) in &self.children {
            out = child.forward(&out);
        }
        out
    }

    /// Child layer by name
    pub fn child(&self, name: &str) -> Option<&Layer> {
        self.children.iter().find(|(n, _)| n == name).map(|(_, l)| l)
    }

    /// Children in declared order
    pub fn children(&self) -> &[(String, Layer)] {
        &self.children
    }

    /// Mutable children in declared order
    pub fn children_mut(&mut self) -> &mut Vec<(String, Layer)> {
        &mut self.children
    }

    /// Consume the container, yielding its children
    pub fn into_children(self) -> Vec<(String, Layer)> {
        self.children
    }

    /// Rebuild a container from children
    pub fn from_children(children: Vec<(String, Layer)>) -> Self {
        Self { children }
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the container has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
