//! # Node Collector
//!
//! Enumerates the root plus every overridable descendant in pre-order.
//! Memoized per root for the duration of one capture or apply operation;
//! callers create a fresh collector (or invalidate) whenever structure may
//! have changed, so a stale enumeration is never reused after mutation.

use std::collections::HashMap;
use stencil_document::{Document, NodeId};

#[derive(Default)]
pub struct NodeCollector {
    cache: HashMap<NodeId, Vec<NodeId>>,
}

impl NodeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The root itself plus all overridable descendants, in pre-order.
    pub fn collect(&mut self, doc: &Document, root: &str) -> Vec<NodeId> {
        if let Some(hit) = self.cache.get(root) {
            return hit.clone();
        }
        let mut nodes = vec![root.to_string()];
        nodes.extend(
            doc.descendants(root)
                .into_iter()
                .filter(|id| doc.node(id).map_or(false, |n| n.kind.is_overridable())),
        );
        self.cache.insert(root.to_string(), nodes.clone());
        nodes
    }

    /// Drop the memoized enumeration for one root.
    pub fn invalidate(&mut self, root: &str) {
        self.cache.remove(root);
    }
}
