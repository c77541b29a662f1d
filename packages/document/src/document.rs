//! # Document Tree
//!
//! In-memory host document: an id-keyed node arena with parent/child links
//! and the mutation primitives the override engine consumes. All mutation
//! goes through setters that validate the target kind; a single failing
//! setter never leaves the tree in a broken state.

use crate::errors::DocumentError;
use crate::library::Template;
use crate::node::{FieldValue, FontRef, Node, NodeId, NodeKind, Paint, TemplateId};
use std::collections::HashMap;

/// Sequential id generator for nodes and templates within one document.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdGenerator {
    count: u32,
}

impl IdGenerator {
    pub(crate) fn new_id(&mut self, prefix: &str) -> String {
        self.count += 1;
        format!("{}-{}", prefix, self.count)
    }
}

/// A host document: one node tree plus the template registry.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    page: NodeId,
    pub(crate) templates: HashMap<TemplateId, Template>,
    pub(crate) families: HashMap<String, Vec<TemplateId>>,
    pub(crate) ids: IdGenerator,
}

impl Document {
    /// Create an empty document with a single page.
    pub fn new() -> Self {
        let mut doc = Document::default();
        let root_id = doc.ids.new_id("node");
        let page_id = doc.ids.new_id("node");

        let mut root = Node::new(root_id.clone(), NodeKind::Document, "Document");
        root.children.push(page_id.clone());
        let mut page = Node::new(page_id.clone(), NodeKind::Page, "Page 1");
        page.parent = Some(root_id.clone());

        doc.nodes.insert(root_id.clone(), root);
        doc.nodes.insert(page_id.clone(), page);
        doc.root = root_id;
        doc.page = page_id;
        doc
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Host-level mutable access. The override engine never uses this; it
    /// exists for hosts and tests that need to shape documents directly.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub(crate) fn get(&self, id: &str) -> Result<&Node, DocumentError> {
        self.nodes
            .get(id)
            .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut Node, DocumentError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| DocumentError::NodeNotFound(id.to_string()))
    }

    /// Create a node under `parent`.
    pub fn create_node(
        &mut self,
        kind: NodeKind,
        name: impl Into<String>,
        parent: &str,
    ) -> Result<NodeId, DocumentError> {
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or_else(|| DocumentError::ParentNotFound(parent.to_string()))?;
        if !parent_node.kind.supports_children() {
            return Err(DocumentError::InvalidParent(parent.to_string()));
        }

        let id = self.ids.new_id("node");
        let mut node = Node::new(id.clone(), kind, name);
        node.parent = Some(parent.to_string());
        self.nodes.insert(id.clone(), node);
        self.get_mut(parent)?.children.push(id.clone());
        Ok(id)
    }

    /// All descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.nodes.get(id) else {
            return out;
        };
        for child in &node.children {
            out.push(child.clone());
            out.extend(self.descendants(child));
        }
        out
    }

    /// Deep-copy the subtree rooted at `src` under `parent`, assigning
    /// fresh ids throughout.
    pub fn clone_subtree(&mut self, src: &str, parent: &str) -> Result<NodeId, DocumentError> {
        let src_node = self.get(src)?.clone();
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or_else(|| DocumentError::ParentNotFound(parent.to_string()))?;
        if !parent_node.kind.supports_children() {
            return Err(DocumentError::InvalidParent(parent.to_string()));
        }

        let id = self.ids.new_id("node");
        let mut copy = src_node.clone();
        copy.id = id.clone();
        copy.parent = Some(parent.to_string());
        copy.children = Vec::new();
        self.nodes.insert(id.clone(), copy);
        self.get_mut(parent)?.children.push(id.clone());

        for child in &src_node.children {
            self.clone_subtree(child, &id)?;
        }
        Ok(id)
    }

    /// Remove a node and all its descendants.
    pub fn remove_subtree(&mut self, id: &str) -> Result<(), DocumentError> {
        let node = self.get(id)?.clone();
        for child in &node.children {
            self.remove_subtree(child)?;
        }
        if let Some(parent) = &node.parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.retain(|c| c != id);
            }
        }
        self.nodes.remove(id);
        Ok(())
    }

    /// Move a node under a new parent at `index` (clamped to child count).
    /// Fails rather than creating an orphan or a cycle.
    pub fn reparent(
        &mut self,
        id: &str,
        new_parent: &str,
        index: usize,
    ) -> Result<(), DocumentError> {
        let _ = self.get(id)?;
        let parent_node = self
            .nodes
            .get(new_parent)
            .ok_or_else(|| DocumentError::ParentNotFound(new_parent.to_string()))?;
        if !parent_node.kind.supports_children() {
            return Err(DocumentError::InvalidParent(new_parent.to_string()));
        }
        if self.would_create_cycle(id, new_parent) {
            return Err(DocumentError::CycleDetected);
        }

        let old_parent = self.get(id)?.parent.clone();
        if let Some(old) = old_parent {
            if let Some(old_node) = self.nodes.get_mut(&old) {
                old_node.children.retain(|c| c != id);
            }
        }

        let parent_node = self.get_mut(new_parent)?;
        let insert_index = index.min(parent_node.children.len());
        parent_node.children.insert(insert_index, id.to_string());
        self.get_mut(id)?.parent = Some(new_parent.to_string());
        Ok(())
    }

    fn would_create_cycle(&self, id: &str, new_parent: &str) -> bool {
        let mut current = Some(new_parent.to_string());
        while let Some(c) = current {
            if c == id {
                return true;
            }
            current = self.nodes.get(&c).and_then(|n| n.parent.clone());
        }
        false
    }

    // --- property setters -------------------------------------------------

    pub fn set_name(&mut self, id: &str, name: &str) -> Result<(), DocumentError> {
        self.get_mut(id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_characters(&mut self, id: &str, content: &str) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind != NodeKind::Text {
            return Err(DocumentError::NotText(id.to_string()));
        }
        node.characters = Some(content.to_string());
        Ok(())
    }

    pub fn set_font(&mut self, id: &str, font: FontRef) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind != NodeKind::Text {
            return Err(DocumentError::NotText(id.to_string()));
        }
        node.font = Some(FieldValue::Uniform(font));
        Ok(())
    }

    pub fn set_font_size(&mut self, id: &str, size: f32) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if node.kind != NodeKind::Text {
            return Err(DocumentError::NotText(id.to_string()));
        }
        node.font_size = Some(FieldValue::Uniform(size));
        Ok(())
    }

    pub fn set_fills(&mut self, id: &str, fills: Vec<Paint>) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if !node.kind.supports_paints() {
            return Err(DocumentError::PropertyUnsupported {
                node: id.to_string(),
                property: "fills",
            });
        }
        node.fills = Some(fills);
        Ok(())
    }

    pub fn set_strokes(&mut self, id: &str, strokes: Vec<Paint>) -> Result<(), DocumentError> {
        let node = self.get_mut(id)?;
        if !node.kind.supports_paints() {
            return Err(DocumentError::PropertyUnsupported {
                node: id.to_string(),
                property: "strokes",
            });
        }
        node.strokes = Some(strokes);
        Ok(())
    }

    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> Result<(), DocumentError> {
        self.get_mut(id)?.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), DocumentError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }
}
