//! # Structural Signature Builder
//!
//! Derives a structure-based identity string for a node:
//! `kind:name:joined-path:sibling-rank`. Two nodes in structurally
//! isomorphic trees (same shape, names, ordering) produce equal signatures;
//! this is the sole basis for correlating nodes across an instance and its
//! template, or across two instances. Indistinguishable duplicate subtrees
//! can collide; this is a known, accepted limitation.
//!
//! Signatures are pure functions of current document state. They are not
//! cached across mutations; callers rebuild signature maps after any
//! structural change.

use crate::hierarchy::PathResolver;
use stencil_document::{Document, NodeKind};

/// Index of a node among its same-name, same-kind siblings under one
/// parent, preserving child order. A node without a parent ranks 0.
pub fn sibling_rank(doc: &Document, node: &str) -> usize {
    let Some(n) = doc.node(node) else {
        return 0;
    };
    let Some(parent) = n.parent.as_deref().and_then(|p| doc.node(p)) else {
        return 0;
    };
    parent
        .children
        .iter()
        .filter(|c| {
            doc.node(c)
                .map_or(false, |s| s.name == n.name && s.kind == n.kind)
        })
        .position(|c| c == &n.id)
        .unwrap_or(0)
}

/// Signature of `node` relative to the resolver's root.
pub fn signature(doc: &Document, resolver: &mut PathResolver, node: &str) -> String {
    let Some(n) = doc.node(node) else {
        return String::new();
    };
    let path = resolver.path(doc, node);
    format!(
        "{}:{}:{}:{}",
        n.kind,
        n.name,
        path.join("/"),
        sibling_rank(doc, node)
    )
}

/// The rank-free prefix of a signature, used for tier-2 matching: any node
/// sharing kind, name, and path matches regardless of sibling rank.
pub fn structural_prefix(kind: NodeKind, name: &str, path: &[String]) -> String {
    format!("{}:{}:{}:", kind, name, path.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_document::NodeKind;

    #[test]
    fn test_signature_format() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let header = doc.create_node(NodeKind::Frame, "Header", &card).unwrap();
        let title = doc.create_node(NodeKind::Text, "Title", &header).unwrap();

        let mut resolver = PathResolver::new(card);
        assert_eq!(
            signature(&doc, &mut resolver, &title),
            "text:Title:Header:0"
        );
    }

    #[test]
    fn test_sibling_rank_disambiguates_same_name_children() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let a = doc.create_node(NodeKind::Rectangle, "Dot", &card).unwrap();
        let b = doc.create_node(NodeKind::Rectangle, "Dot", &card).unwrap();
        let c = doc.create_node(NodeKind::Rectangle, "Dot", &card).unwrap();

        assert_eq!(sibling_rank(&doc, &a), 0);
        assert_eq!(sibling_rank(&doc, &b), 1);
        assert_eq!(sibling_rank(&doc, &c), 2);

        let mut resolver = PathResolver::new(card);
        let sigs: Vec<String> = [&a, &b, &c]
            .iter()
            .map(|id| signature(&doc, &mut resolver, id))
            .collect();
        assert_ne!(sigs[0], sigs[1]);
        assert_ne!(sigs[1], sigs[2]);
    }

    #[test]
    fn test_rank_ignores_different_kind_siblings() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        doc.create_node(NodeKind::Text, "Dot", &card).unwrap();
        let rect = doc.create_node(NodeKind::Rectangle, "Dot", &card).unwrap();

        // the text sibling shares the name but not the kind
        assert_eq!(sibling_rank(&doc, &rect), 0);
    }

    #[test]
    fn test_signature_stable_across_cache_state() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let header = doc.create_node(NodeKind::Frame, "Header", &card).unwrap();
        let title = doc.create_node(NodeKind::Text, "Title", &header).unwrap();

        let mut cold = PathResolver::new(card.clone());
        let first = signature(&doc, &mut cold, &title);

        let mut warm = PathResolver::new(card);
        let _ = warm.path(&doc, &title);
        let second = signature(&doc, &mut warm, &title);
        assert_eq!(first, second);
    }

    #[test]
    fn test_structural_prefix_matches_rank_variants() {
        let prefix = structural_prefix(NodeKind::Rectangle, "Dot", &["Row".to_string()]);
        assert_eq!(prefix, "rectangle:Dot:Row:");
        assert!("rectangle:Dot:Row:2".starts_with(&prefix));
        assert!(!"rectangle:Dot:Column:0".starts_with(&prefix));
    }
}
