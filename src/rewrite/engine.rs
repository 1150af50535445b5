//! Tree-walk rewrite pass

use super::Registry;
use crate::errors::Result;
use crate::nn::{Container, Layer, Network};

/// Rewrite a network by replacing registered layer kinds
///
/// Depth-first over the layer tree: each node whose kind has a registered
/// factory is handed to that factory and replaced by its output. Replacement
/// is terminal: the engine does not descend into a replaced node, so a
/// factory returning a subtree containing further matching kinds does not
/// trigger repeated conversion. Unregistered leaves pass through unchanged,
/// and containers are rebuilt with their children rewritten in order.
///
/// The child-name topology is preserved exactly; only node kinds and
/// parameters change.
pub fn rewrite(network: Network, registry: &Registry) -> Result<Network> {
    Ok(Network::new(transform(network.into_root(), registry)?))
}

fn transform(layer: Layer, registry: &Registry) -> Result<Layer> {
    if let Some(factory) = registry.get(layer.kind()) {
        return factory(layer);
    }

    match layer {
        Layer::Container(container) => {
            let mut children = Vec::with_capacity(container.len());
            for (name, child) in container.into_children() {
                children.push((name, transform(child, registry)?));
            }
            Ok(Layer::Container(Container::from_children(children)))
        }
        other => Ok(other),
    }
}
