//! # Correspondence & Application Engine
//!
//! Re-applies a [`CopiedPayload`] onto target instances. Per target the
//! sequencing is fixed, because later steps depend on structure produced by
//! earlier ones:
//!
//! 1. root variant selectors (may restructure the entire subtree)
//! 2. root component parameters (three capability probes per parameter)
//! 3. fresh node enumeration + signature map for the restructured target
//! 4. per record: three-tier correspondence (exact signature, structural
//!    prefix ignoring sibling rank, kind+name anywhere under the target)
//! 5. per matched record: fields in fixed order: font, size, characters
//!    (text content last so formatting is already in place), opacity,
//!    visibility, non-text fills, strokes, variant map, parameter map
//! 6. a second resolution/application pass for non-text fills only: variant
//!    and parameter work in step 5 can rebuild subtrees and silently
//!    discard fills applied earlier in the same pass; re-applying an
//!    already-correct fill is a no-op
//!
//! Tier 2/3 matches are deliberately imprecise; something is better than
//! nothing when structure has drifted. Unmatched records and incompatible
//! targets are counted, never errors; a failing field never aborts the rest
//! of its record, and a failing record never aborts its target.

use std::collections::BTreeMap;
use stencil_document::{
    ComponentValue, Document, DocumentError, NodeId, NodeKind,
};
use tracing::{debug, warn};

use crate::collector::NodeCollector;
use crate::errors::OverrideError;
use crate::fonts::{FontLoader, FontPreloader};
use crate::hierarchy::PathResolver;
use crate::payload::{CopiedPayload, OverrideRecord};
use crate::signature::signature;
use crate::values::{clone_font, clone_paints};

/// Final per-operation tally surfaced to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplySummary {
    /// Targets the payload was applied to.
    pub applied: usize,
    /// Targets skipped as incompatible with the payload's template.
    pub skipped: usize,
    pub template_name: String,
}

impl ApplySummary {
    pub fn message(&self) -> String {
        format!(
            "Applied '{}' overrides to {} instance(s), skipped {}",
            self.template_name, self.applied, self.skipped
        )
    }
}

/// Apply `payload` to every compatible target. All referenced fonts are
/// preloaded before any target's fields are written. Each target's outcome
/// is independent of every other target's.
pub async fn apply_payload<L: FontLoader>(
    doc: &mut Document,
    payload: &CopiedPayload,
    targets: &[NodeId],
    fonts: &mut FontPreloader<L>,
) -> Result<ApplySummary, OverrideError> {
    if targets.is_empty() {
        return Err(OverrideError::Selection(
            "no target instances selected".to_string(),
        ));
    }
    for target in targets {
        let node = doc.node(target).ok_or_else(|| {
            OverrideError::Document(DocumentError::NodeNotFound(target.clone()))
        })?;
        if node.kind != NodeKind::Instance {
            return Err(OverrideError::Selection(format!(
                "node {} is not an instance",
                target
            )));
        }
    }

    fonts.preload(payload.fonts()).await;

    let mut applied = 0;
    let mut skipped = 0;
    for target in targets {
        if is_compatible(doc, payload, target) {
            apply_to_target(doc, payload, target);
            applied += 1;
        } else {
            debug!(target = %target, "incompatible target skipped");
            skipped += 1;
        }
    }

    Ok(ApplySummary {
        applied,
        skipped,
        template_name: payload.template_name.clone(),
    })
}

/// A target is compatible iff its template is the payload's source
/// template, or both belong to the same template family.
fn is_compatible(doc: &Document, payload: &CopiedPayload, target: &str) -> bool {
    let Some(template) = doc.main_template(target) else {
        return false;
    };
    if template.id == payload.template_id {
        return true;
    }
    match (&payload.family_id, template.family.as_deref()) {
        (Some(family), Some(target_family)) => family == target_family,
        _ => false,
    }
}

fn apply_to_target(doc: &mut Document, payload: &CopiedPayload, target: &str) {
    if !payload.variant_properties.is_empty() {
        if let Err(err) = doc.set_variant_properties(target, &payload.variant_properties) {
            warn!(target = %target, %err, "root variant selectors not applied");
        }
    }

    for (key, wrapped) in &payload.component_properties {
        set_parameter(doc, target, key, wrapped);
    }

    // steps 1-2 may have restructured the target; any prior map is invalid
    let (map, nodes) = build_signature_map(doc, target);
    for record in &payload.records {
        match resolve_target(doc, &map, &nodes, record) {
            Some(node) => apply_record(doc, &node, record),
            None => {
                debug!(target = %target, signature = %record.signature, "no tier matched; record skipped")
            }
        }
    }

    let (map, nodes) = build_signature_map(doc, target);
    for record in &payload.records {
        let Some(fills) = &record.fills else {
            continue;
        };
        let Some(node) = resolve_target(doc, &map, &nodes, record) else {
            continue;
        };
        if doc.node(&node).map_or(true, |n| n.kind == NodeKind::Text) {
            continue;
        }
        if let Err(err) = doc.set_fills(&node, clone_paints(fills)) {
            debug!(node = %node, %err, "fill re-application skipped");
        }
    }
}

fn build_signature_map(doc: &Document, root: &str) -> (BTreeMap<String, NodeId>, Vec<NodeId>) {
    let mut resolver = PathResolver::new(root.to_string());
    let mut collector = NodeCollector::new();
    let nodes = collector.collect(doc, root);
    let mut map = BTreeMap::new();
    for id in &nodes {
        map.insert(signature(doc, &mut resolver, id), id.clone());
    }
    (map, nodes)
}

/// Ordered capability probes for setting one component parameter. The
/// first mechanism that does not fail wins.
#[derive(Debug, Clone, Copy)]
enum ParamMechanism {
    /// Direct per-parameter setter exposed by the target.
    Direct,
    /// Batch property call scoped to the single key.
    Batch,
    /// Last-resort direct write into the parameter map.
    Raw,
}

const PARAM_MECHANISMS: [ParamMechanism; 3] = [
    ParamMechanism::Direct,
    ParamMechanism::Batch,
    ParamMechanism::Raw,
];

fn set_parameter(doc: &mut Document, target: &str, key: &str, wrapped: &ComponentValue) {
    for mechanism in PARAM_MECHANISMS {
        let result = match mechanism {
            ParamMechanism::Direct => {
                doc.set_component_parameter(target, key, wrapped.value.clone())
            }
            ParamMechanism::Batch => {
                let mut single = BTreeMap::new();
                single.insert(key.to_string(), wrapped.value.clone());
                doc.set_properties(target, single)
            }
            ParamMechanism::Raw => doc.write_component_parameter(target, key, wrapped.clone()),
        };
        if result.is_ok() {
            return;
        }
    }
    warn!(target = %target, key = %key, "component parameter could not be applied");
}

/// Three-tier correspondence, attempted in order, first hit wins.
fn resolve_target(
    doc: &Document,
    map: &BTreeMap<String, NodeId>,
    nodes: &[NodeId],
    record: &OverrideRecord,
) -> Option<NodeId> {
    if let Some(id) = map.get(&record.signature) {
        return Some(id.clone());
    }

    let prefix = record.structural_prefix();
    if let Some((_, id)) = map
        .range(prefix.clone()..)
        .take_while(|(sig, _)| sig.starts_with(&prefix))
        .next()
    {
        return Some(id.clone());
    }

    // `nodes[0]` is the target root itself; tier 3 only ever matches nodes
    // under it
    nodes
        .iter()
        .skip(1)
        .find(|id| {
            doc.node(id)
                .map_or(false, |n| n.kind == record.kind && n.name == record.name)
        })
        .cloned()
}

fn apply_record(doc: &mut Document, target: &str, record: &OverrideRecord) {
    let kind = doc.node(target).map(|n| n.kind);
    let is_text = kind == Some(NodeKind::Text);

    if is_text {
        if let Some(font) = &record.font {
            log_field(doc.set_font(target, clone_font(font)), target, "font");
        }
        if let Some(size) = record.font_size {
            log_field(doc.set_font_size(target, size), target, "font_size");
        }
        if let Some(chars) = &record.characters {
            log_field(doc.set_characters(target, chars), target, "characters");
        }
    }

    if let Some(opacity) = record.opacity {
        log_field(doc.set_opacity(target, opacity), target, "opacity");
    }
    if let Some(visible) = record.visible {
        log_field(doc.set_visible(target, visible), target, "visible");
    }
    if !is_text {
        if let Some(fills) = &record.fills {
            log_field(doc.set_fills(target, clone_paints(fills)), target, "fills");
        }
    }
    if let Some(strokes) = &record.strokes {
        log_field(
            doc.set_strokes(target, clone_paints(strokes)),
            target,
            "strokes",
        );
    }

    if kind == Some(NodeKind::Instance) {
        if let Some(variants) = &record.variant_properties {
            if let Err(err) = doc.set_variant_properties(target, variants) {
                warn!(target = %target, %err, "nested variant selectors not applied");
            }
        }
        if let Some(params) = &record.component_properties {
            for (key, wrapped) in params {
                // nested instances expose only the direct setter; anything
                // it refuses is silently not applied
                if let Err(err) =
                    doc.set_component_parameter(target, key, wrapped.value.clone())
                {
                    debug!(target = %target, key = %key, %err, "nested parameter not applied");
                }
            }
        }
    }
}

fn log_field(result: Result<(), DocumentError>, target: &str, field: &'static str) {
    if let Err(err) = result {
        warn!(target = %target, field, %err, "field application failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_document::{ParamKind, ParamValue};

    fn instance_with_params(doc: &mut Document) -> NodeId {
        let page = doc.page().to_string();
        let root = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let mut params = BTreeMap::new();
        params.insert("label".to_string(), ParamKind::Text);
        params.insert("state".to_string(), ParamKind::Variant);
        let template = doc
            .define_template("Card", None, BTreeMap::new(), params, root)
            .unwrap();
        doc.create_instance(&template, &page).unwrap()
    }

    #[test]
    fn test_parameter_probes_fall_through_in_order() {
        let mut doc = Document::new();
        let instance = instance_with_params(&mut doc);

        // declared Text key: handled by the direct setter
        set_parameter(&mut doc, &instance, "label", &ComponentValue::text("Hi"));
        // Variant key: direct setter refuses, batch call succeeds
        set_parameter(
            &mut doc,
            &instance,
            "state",
            &ComponentValue::new(ParamValue::Text("on".into()), ParamKind::Variant),
        );
        // undeclared key: only the raw write accepts it
        set_parameter(&mut doc, &instance, "ghost", &ComponentValue::bool(true));

        let props = doc
            .node(&instance)
            .unwrap()
            .component_properties
            .clone()
            .unwrap();
        assert_eq!(props["label"].value, ParamValue::Text("Hi".into()));
        assert_eq!(props["state"].value, ParamValue::Text("on".into()));
        assert_eq!(props["ghost"].value, ParamValue::Bool(true));
    }

    #[test]
    fn test_resolution_tiers() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        let row = doc.create_node(NodeKind::Frame, "Row", &card).unwrap();
        let dot = doc.create_node(NodeKind::Rectangle, "Dot", &row).unwrap();

        let (map, nodes) = build_signature_map(&doc, &card);
        let mut record = OverrideRecord::keyed(
            doc.node(&dot).unwrap(),
            "rectangle:Dot:Row:0".to_string(),
            vec!["Row".to_string()],
            0,
        );

        // tier 1: exact signature
        assert_eq!(resolve_target(&doc, &map, &nodes, &record), Some(dot.clone()));

        // tier 2: rank drifted, prefix still matches
        record.signature = "rectangle:Dot:Row:3".to_string();
        record.sibling_rank = 3;
        assert_eq!(resolve_target(&doc, &map, &nodes, &record), Some(dot.clone()));

        // tier 3: path changed entirely, kind+name still match
        record.signature = "rectangle:Dot:Other:0".to_string();
        record.path = vec!["Other".to_string()];
        assert_eq!(resolve_target(&doc, &map, &nodes, &record), Some(dot));

        // no tier: nothing with that kind+name
        record.name = "Missing".to_string();
        record.signature = "rectangle:Missing:Row:0".to_string();
        assert_eq!(resolve_target(&doc, &map, &nodes, &record), None);
    }

    #[test]
    fn test_tier3_never_matches_the_target_root() {
        let mut doc = Document::new();
        let page = doc.page().to_string();
        let card = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        doc.create_node(NodeKind::Frame, "Inner", &card).unwrap();

        let (map, nodes) = build_signature_map(&doc, &card);
        // a nested record sharing the root's kind+name, with a path no
        // descendant has: tiers 1 and 2 miss, and tier 3 must not fall
        // back onto the root itself
        let record = OverrideRecord::keyed(
            doc.node(&card).unwrap(),
            "frame:Card:Other:0".to_string(),
            vec!["Other".to_string()],
            0,
        );
        assert_eq!(resolve_target(&doc, &map, &nodes, &record), None);
    }
}
