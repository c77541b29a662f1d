//! # Hierarchy Path Resolver
//!
//! Computes a node's position relative to an instance root as the ordered
//! sequence of ancestor names, outermost first, excluding both the root and
//! the node itself. Results are memoized per resolver; a resolver is scoped
//! to one root for the duration of one capture or apply operation and
//! discarded afterwards, so entries can never leak across roots or across
//! structural mutations.

use std::collections::HashMap;
use stencil_document::{Document, NodeId, NodeKind};

pub struct PathResolver {
    root: NodeId,
    cache: HashMap<NodeId, Vec<String>>,
}

impl PathResolver {
    pub fn new(root: impl Into<NodeId>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Ancestor names from `node` up to (but excluding) the root. Empty if
    /// `node` is the root itself. Always succeeds: a broken ancestor chain
    /// (detached node) yields an empty path rather than an error, and a
    /// document/page boundary stops the walk early.
    pub fn path(&mut self, doc: &Document, node: &str) -> Vec<String> {
        if node == self.root {
            return Vec::new();
        }
        if let Some(hit) = self.cache.get(node) {
            return hit.clone();
        }

        let mut names = Vec::new();
        let mut current = doc.node(node).and_then(|n| n.parent.clone());
        let path = loop {
            let Some(id) = current else {
                // ancestry broken before reaching the root
                break Vec::new();
            };
            if id == self.root {
                names.reverse();
                break names;
            }
            let Some(ancestor) = doc.node(&id) else {
                break Vec::new();
            };
            if matches!(ancestor.kind, NodeKind::Document | NodeKind::Page) {
                names.reverse();
                break names;
            }
            names.push(ancestor.name.clone());
            current = ancestor.parent.clone();
        };

        self.cache.insert(node.to_string(), path.clone());
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_document::NodeKind;

    fn fixture() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let header = doc.create_node(NodeKind::Frame, "Header", &card).unwrap();
        let title = doc.create_node(NodeKind::Text, "Title", &header).unwrap();
        (doc, card, header, title)
    }

    #[test]
    fn test_path_of_root_is_empty() {
        let (doc, card, ..) = fixture();
        let mut resolver = PathResolver::new(card.clone());
        assert!(resolver.path(&doc, &card).is_empty());
    }

    #[test]
    fn test_path_is_outermost_first() {
        let (doc, card, header, title) = fixture();
        let mut resolver = PathResolver::new(card);
        assert_eq!(resolver.path(&doc, &title), vec!["Header".to_string()]);
        assert!(resolver.path(&doc, &header).is_empty());
    }

    #[test]
    fn test_path_stops_at_page_boundary() {
        let (doc, card, _, title) = fixture();
        // root unrelated to the title's ancestry: walk ends at the page
        let mut resolver = PathResolver::new("node-999");
        assert_eq!(
            resolver.path(&doc, &title),
            vec!["Card".to_string(), "Header".to_string()]
        );
        let _ = card;
    }

    #[test]
    fn test_detached_node_yields_empty_path() {
        let (mut doc, card, _, title) = fixture();
        doc.node_mut(&title).unwrap().parent = Some("node-404".to_string());
        let mut resolver = PathResolver::new(card);
        assert!(resolver.path(&doc, &title).is_empty());
    }

    #[test]
    fn test_warm_cache_matches_cold() {
        let (doc, card, _, title) = fixture();
        let mut resolver = PathResolver::new(card);
        let cold = resolver.path(&doc, &title);
        let warm = resolver.path(&doc, &title);
        assert_eq!(cold, warm);
    }
}
