//! # Copied Payload
//!
//! The portable, structure-independent representation of detected
//! overrides. An [`OverrideRecord`] keys a node by the structural facts
//! observed at capture time (signature, kind, name, path, sibling rank)
//! plus the node id as a last-resort hint, and carries only the sparse set
//! of properties that were detected or inferred as overridden.
//!
//! A [`CopiedPayload`] is a caller-owned value: it never leaves process
//! memory, is read-only during application, and is replaced wholesale by
//! each new capture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use stencil_document::{
    ComponentValue, FontRef, Node, NodeId, NodeKind, Paint, TemplateId,
};

use crate::signature::structural_prefix;

/// Sparse per-node override set. A record with no property fields
/// populated is never emitted by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Node id as observed at capture time. Ids are not stable across
    /// instances; this is only a hint, never a matching tier.
    pub node_id: NodeId,
    pub signature: String,
    pub kind: NodeKind,
    pub name: String,
    pub path: Vec<String>,
    pub sibling_rank: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<FontRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Paint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_properties: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_properties: Option<BTreeMap<String, ComponentValue>>,
}

impl OverrideRecord {
    /// An empty record keyed by a node's structural facts.
    pub fn keyed(node: &Node, signature: String, path: Vec<String>, sibling_rank: usize) -> Self {
        Self {
            node_id: node.id.clone(),
            signature,
            kind: node.kind,
            name: node.name.clone(),
            path,
            sibling_rank,
            characters: None,
            font: None,
            font_size: None,
            fills: None,
            strokes: None,
            opacity: None,
            visible: None,
            variant_properties: None,
            component_properties: None,
        }
    }

    /// True if at least one property field is populated.
    pub fn has_overrides(&self) -> bool {
        self.characters.is_some()
            || self.font.is_some()
            || self.font_size.is_some()
            || self.fills.is_some()
            || self.strokes.is_some()
            || self.opacity.is_some()
            || self.visible.is_some()
            || self.variant_properties.is_some()
            || self.component_properties.is_some()
    }

    /// Rank-free structural prefix for tier-2 matching.
    pub fn structural_prefix(&self) -> String {
        structural_prefix(self.kind, &self.name, &self.path)
    }
}

/// Everything one capture produced: source-template identity, the root
/// instance's own selector and parameter maps, and the ordered override
/// records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiedPayload {
    pub template_id: TemplateId,
    /// Family id for cross-variant compatibility, if the source template
    /// belongs to a family.
    pub family_id: Option<String>,
    pub template_name: String,
    pub variant_properties: BTreeMap<String, String>,
    pub component_properties: BTreeMap<String, ComponentValue>,
    pub records: Vec<OverrideRecord>,
    pub captured_at: DateTime<Utc>,
}

impl CopiedPayload {
    /// Distinct font references mentioned by the records, for preloading.
    pub fn fonts(&self) -> BTreeSet<FontRef> {
        self.records
            .iter()
            .filter_map(|r| r.font.clone())
            .collect()
    }
}
