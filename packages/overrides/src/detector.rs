//! # Override Detector
//!
//! Walks a live instance, locates each node's structural counterpart in the
//! instance's template via a signature map, and emits a sparse
//! [`OverrideRecord`] per node that differs. Nodes with no counterpart
//! (structure diverged, e.g. a nested instance swapped to an incompatible
//! variant) fall back to an unconditional snapshot of their non-default
//! content and visual fields, so nothing is silently dropped when
//! comparison is impossible.
//!
//! All working state (path caches, node enumeration, the template signature
//! map) is created fresh per capture and discarded with it.
//!
//! Fill lists are captured whenever non-empty even when a counterpart was
//! found: a shape's fills are treated as overridden once a correspondence
//! exists, regardless of equality with the default. This matches the
//! long-observed behavior of the host and is intentional.

use chrono::Utc;
use std::collections::BTreeMap;
use stencil_document::{
    Document, DocumentError, FieldValue, Node, NodeId, NodeKind,
};
use tracing::debug;

use crate::collector::NodeCollector;
use crate::errors::OverrideError;
use crate::hierarchy::PathResolver;
use crate::payload::{CopiedPayload, OverrideRecord};
use crate::signature::{sibling_rank, signature};
use crate::values::{
    clone_font, clone_paints, clone_params, clone_variants, fonts_equal, nearly_eq, paints_equal,
    params_equal,
};

/// Capture every local override on `instance_root` into a fresh payload.
pub fn capture(doc: &Document, instance_root: &str) -> Result<CopiedPayload, OverrideError> {
    let root_node = doc.node(instance_root).ok_or_else(|| {
        OverrideError::Document(DocumentError::NodeNotFound(instance_root.to_string()))
    })?;
    if root_node.kind != NodeKind::Instance {
        return Err(OverrideError::Selection(format!(
            "node {} is not an instance",
            instance_root
        )));
    }
    let template = doc
        .main_template(instance_root)
        .cloned()
        .ok_or_else(|| OverrideError::NoTemplate(instance_root.to_string()))?;

    // Signature map over the template's default tree, rebuilt at the start
    // of every capture so no stale cross-operation state survives.
    let mut template_resolver = PathResolver::new(template.root.clone());
    let mut template_collector = NodeCollector::new();
    let mut template_map: BTreeMap<String, NodeId> = BTreeMap::new();
    for id in template_collector.collect(doc, &template.root) {
        template_map.insert(signature(doc, &mut template_resolver, &id), id);
    }

    let mut resolver = PathResolver::new(instance_root.to_string());
    let mut collector = NodeCollector::new();
    let mut records = Vec::new();

    for id in collector.collect(doc, instance_root) {
        let Some(node) = doc.node(&id) else {
            continue;
        };
        let path = resolver.path(doc, &id);
        let rank = sibling_rank(doc, &id);
        let sig = signature(doc, &mut resolver, &id);
        let mut record = OverrideRecord::keyed(node, sig.clone(), path, rank);

        if id == instance_root {
            // The root is compared against the template root as a whole;
            // its variant baseline is the template's own selector values.
            if let Some(base) = doc.node(&template.root) {
                diff_shared_fields(node, base, &mut record);
            }
            let variants = node.variant_properties.clone().unwrap_or_default();
            if variants != template.variant_values {
                record.variant_properties = Some(clone_variants(&variants));
            }
        } else {
            match template_map.get(&sig).and_then(|cid| doc.node(cid)) {
                Some(base) => {
                    diff_shared_fields(node, base, &mut record);
                    diff_instance_fields(node, base, &mut record);
                }
                None => snapshot_node(node, &mut record),
            }
        }

        if record.has_overrides() {
            records.push(record);
        }
    }

    // Component parameters on the root are easy to miss: the root is never
    // discovered as a child. Append a synthetic record carrying just them.
    let root_params = root_node.component_properties.clone().unwrap_or_default();
    if !root_params.is_empty()
        && !records
            .iter()
            .any(|r| r.node_id == instance_root && r.component_properties.is_some())
    {
        let mut synthetic = OverrideRecord::keyed(
            root_node,
            signature(doc, &mut resolver, instance_root),
            Vec::new(),
            sibling_rank(doc, instance_root),
        );
        synthetic.component_properties = Some(clone_params(&root_params));
        records.push(synthetic);
    }

    Ok(CopiedPayload {
        template_id: template.id.clone(),
        family_id: template.family.clone(),
        template_name: template.name.clone(),
        variant_properties: clone_variants(
            &root_node.variant_properties.clone().unwrap_or_default(),
        ),
        component_properties: clone_params(&root_params),
        records,
        captured_at: Utc::now(),
    })
}

/// Field-by-field comparison against a structural counterpart. A field
/// that cannot be read (mixed value) is skipped, never aborting the node.
fn diff_shared_fields(node: &Node, base: &Node, record: &mut OverrideRecord) {
    if let (Some(a), Some(b)) = (&node.characters, &base.characters) {
        if a != b {
            record.characters = Some(a.clone());
        }
    }

    match &node.font {
        Some(FieldValue::Uniform(font)) => {
            let base_font = base.font.as_ref().and_then(|f| f.uniform());
            if base_font.map_or(true, |b| !fonts_equal(font, b)) {
                record.font = Some(clone_font(font));
            }
        }
        Some(FieldValue::Mixed) => debug!(node = %node.id, "skipping mixed font field"),
        None => {}
    }

    match &node.font_size {
        Some(FieldValue::Uniform(size)) => {
            let base_size = base.font_size.as_ref().and_then(|f| f.uniform());
            if base_size.map_or(true, |b| !nearly_eq(*size, *b)) {
                record.font_size = Some(*size);
            }
        }
        Some(FieldValue::Mixed) => debug!(node = %node.id, "skipping mixed font size field"),
        None => {}
    }

    // Fills: captured whenever non-empty (see module docs).
    if let Some(fills) = &node.fills {
        if !fills.is_empty() {
            record.fills = Some(clone_paints(fills));
        }
    }

    if let Some(strokes) = &node.strokes {
        let base_strokes = base.strokes.as_deref().unwrap_or(&[]);
        if !paints_equal(strokes, base_strokes) {
            record.strokes = Some(clone_paints(strokes));
        }
    }

    if !nearly_eq(node.opacity, base.opacity) {
        record.opacity = Some(node.opacity);
    }
    if node.visible != base.visible {
        record.visible = Some(node.visible);
    }
}

/// Variant and parameter maps on nested instances, compared against the
/// counterpart node's own maps.
fn diff_instance_fields(node: &Node, base: &Node, record: &mut OverrideRecord) {
    if node.kind != NodeKind::Instance {
        return;
    }
    let variants = node.variant_properties.clone().unwrap_or_default();
    let base_variants = base.variant_properties.clone().unwrap_or_default();
    if variants != base_variants {
        record.variant_properties = Some(clone_variants(&variants));
    }

    let params = node.component_properties.clone().unwrap_or_default();
    let base_params = base.component_properties.clone().unwrap_or_default();
    if !params_equal(&params, &base_params) {
        record.component_properties = Some(clone_params(&params));
    }
}

/// Fallback capture when no counterpart exists: unconditionally snapshot
/// every non-empty / non-default content and visual field.
fn snapshot_node(node: &Node, record: &mut OverrideRecord) {
    if let Some(chars) = &node.characters {
        if !chars.trim().is_empty() {
            record.characters = Some(chars.clone());
        }
    }
    if let Some(FieldValue::Uniform(font)) = &node.font {
        record.font = Some(clone_font(font));
    }
    if let Some(FieldValue::Uniform(size)) = &node.font_size {
        record.font_size = Some(*size);
    }
    if let Some(fills) = &node.fills {
        if !fills.is_empty() {
            record.fills = Some(clone_paints(fills));
        }
    }
    if let Some(strokes) = &node.strokes {
        if !strokes.is_empty() {
            record.strokes = Some(clone_paints(strokes));
        }
    }
    if !nearly_eq(node.opacity, 1.0) {
        record.opacity = Some(node.opacity);
    }
    if !node.visible {
        record.visible = Some(false);
    }
    if let Some(variants) = &node.variant_properties {
        if !variants.is_empty() {
            record.variant_properties = Some(clone_variants(variants));
        }
    }
    if let Some(params) = &node.component_properties {
        if !params.is_empty() {
            record.component_properties = Some(clone_params(params));
        }
    }
}
