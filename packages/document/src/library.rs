//! # Template Library
//!
//! Templates (component definitions), template families (interchangeable
//! variants of one component), instance creation, and the instance-level
//! setters that can restructure a subtree: variant selection and the three
//! component-parameter mechanisms.

use crate::document::Document;
use crate::errors::DocumentError;
use crate::node::{
    ComponentValue, Node, NodeId, NodeKind, ParamKind, ParamValue, TemplateId,
};
use std::collections::BTreeMap;

/// A component definition: the canonical default state instances are
/// created from and diffed against.
#[derive(Debug, Clone)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    /// Family this template belongs to, if it is one variant of a set.
    pub family: Option<String>,
    /// The variant-selector values identifying this template within its
    /// family. Empty for standalone templates.
    pub variant_values: BTreeMap<String, String>,
    /// Declared component-parameter schema.
    pub parameters: BTreeMap<String, ParamKind>,
    /// Root node of the default tree, owned by the document.
    pub root: NodeId,
}

impl Document {
    /// Register a subtree as a template. `root` must already exist in the
    /// document (conventionally under a library page).
    pub fn define_template(
        &mut self,
        name: impl Into<String>,
        family: Option<&str>,
        variant_values: BTreeMap<String, String>,
        parameters: BTreeMap<String, ParamKind>,
        root: NodeId,
    ) -> Result<TemplateId, DocumentError> {
        let _ = self.get(&root)?;
        let id = self.ids.new_id("tmpl");
        if let Some(family) = family {
            self.families
                .entry(family.to_string())
                .or_default()
                .push(id.clone());
        }
        self.templates.insert(
            id.clone(),
            Template {
                id: id.clone(),
                name: name.into(),
                family: family.map(str::to_string),
                variant_values,
                parameters,
                root,
            },
        );
        Ok(id)
    }

    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.get(id)
    }

    /// The template an instance was created from, if still registered.
    pub fn main_template(&self, instance: &str) -> Option<&Template> {
        let node = self.node(instance)?;
        node.template_id
            .as_deref()
            .and_then(|id| self.templates.get(id))
    }

    /// The family id of a template, if it belongs to one.
    pub fn template_family(&self, template_id: &str) -> Option<&str> {
        self.templates.get(template_id)?.family.as_deref()
    }

    /// Create a live instance of a template under `parent`. The instance
    /// node mirrors the template root's visual defaults and receives a deep
    /// copy of its children.
    pub fn create_instance(
        &mut self,
        template_id: &str,
        parent: &str,
    ) -> Result<NodeId, DocumentError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or_else(|| DocumentError::TemplateNotFound(template_id.to_string()))?
            .clone();
        let template_root = self.get(&template.root)?.clone();

        let instance = self.create_node(NodeKind::Instance, template.name.clone(), parent)?;
        self.seed_instance_node(&instance, &template, &template_root)?;

        for child in &template_root.children {
            self.clone_subtree(child, &instance)?;
        }
        Ok(instance)
    }

    fn seed_instance_node(
        &mut self,
        instance: &str,
        template: &Template,
        template_root: &Node,
    ) -> Result<(), DocumentError> {
        let node = self.get_mut(instance)?;
        node.template_id = Some(template.id.clone());
        node.variant_properties = Some(template.variant_values.clone());
        node.component_properties = Some(BTreeMap::new());
        node.fills = template_root.fills.clone();
        node.strokes = template_root.strokes.clone();
        node.opacity = template_root.opacity;
        node.visible = template_root.visible;
        Ok(())
    }

    /// Merge variant selectors into an instance and, when the merged
    /// selectors resolve to a different member of the template's family,
    /// swap the instance's entire child subtree for that variant's default
    /// tree. The instance node itself (id, name, own visual overrides)
    /// survives the swap.
    pub fn set_variant_properties(
        &mut self,
        instance: &str,
        props: &BTreeMap<String, String>,
    ) -> Result<(), DocumentError> {
        let node = self.get(instance)?;
        if node.kind != NodeKind::Instance {
            return Err(DocumentError::NotAnInstance(instance.to_string()));
        }
        let current_template_id = node
            .template_id
            .clone()
            .ok_or_else(|| DocumentError::TemplateNotFound(instance.to_string()))?;
        let current = self
            .templates
            .get(&current_template_id)
            .ok_or(DocumentError::TemplateNotFound(current_template_id.clone()))?
            .clone();

        let mut merged = node.variant_properties.clone().unwrap_or_default();
        for (k, v) in props {
            merged.insert(k.clone(), v.clone());
        }

        if merged == current.variant_values {
            self.get_mut(instance)?.variant_properties = Some(merged);
            return Ok(());
        }

        let family = current
            .family
            .as_deref()
            .ok_or_else(|| DocumentError::NoMatchingVariant(instance.to_string()))?;
        let resolved = self
            .families
            .get(family)
            .and_then(|members| {
                members
                    .iter()
                    .find(|id| self.templates[*id].variant_values == merged)
            })
            .cloned()
            .ok_or_else(|| DocumentError::NoMatchingVariant(instance.to_string()))?;

        let new_root = self.templates[&resolved].root.clone();
        let new_children = self.get(&new_root)?.children.clone();

        for child in self.get(instance)?.children.clone() {
            self.remove_subtree(&child)?;
        }
        for child in &new_children {
            self.clone_subtree(child, instance)?;
        }

        let node = self.get_mut(instance)?;
        node.template_id = Some(resolved);
        node.variant_properties = Some(merged);
        Ok(())
    }

    /// Direct per-parameter setter. Only available for parameters declared
    /// `Bool` or `Text` with a value of the matching type; variant and
    /// instance-swap parameters must go through [`Document::set_properties`].
    pub fn set_component_parameter(
        &mut self,
        instance: &str,
        key: &str,
        value: ParamValue,
    ) -> Result<(), DocumentError> {
        let declared = self.declared_param_kind(instance, key)?;
        let matches = matches!(
            (declared, &value),
            (ParamKind::Bool, ParamValue::Bool(_)) | (ParamKind::Text, ParamValue::Text(_))
        );
        if !matches {
            return Err(DocumentError::ParameterMechanismUnsupported(key.to_string()));
        }
        self.write_param(instance, key, ComponentValue::new(value, declared))
    }

    /// Batch property setter. Accepts any declared parameter key.
    pub fn set_properties(
        &mut self,
        instance: &str,
        props: BTreeMap<String, ParamValue>,
    ) -> Result<(), DocumentError> {
        let mut entries = Vec::with_capacity(props.len());
        for (key, value) in props {
            let declared = self.declared_param_kind(instance, &key)?;
            entries.push((key, ComponentValue::new(value, declared)));
        }
        for (key, wrapped) in entries {
            self.write_param(instance, &key, wrapped)?;
        }
        Ok(())
    }

    /// Last-resort raw write into the parameter map. Requires only an
    /// instance-kind node; the key need not be declared.
    pub fn write_component_parameter(
        &mut self,
        instance: &str,
        key: &str,
        wrapped: ComponentValue,
    ) -> Result<(), DocumentError> {
        let node = self.get(instance)?;
        if node.kind != NodeKind::Instance {
            return Err(DocumentError::NotAnInstance(instance.to_string()));
        }
        self.write_param(instance, key, wrapped)
    }

    fn declared_param_kind(&self, instance: &str, key: &str) -> Result<ParamKind, DocumentError> {
        let node = self.get(instance)?;
        if node.kind != NodeKind::Instance {
            return Err(DocumentError::NotAnInstance(instance.to_string()));
        }
        let template = self
            .main_template(instance)
            .ok_or_else(|| DocumentError::TemplateNotFound(instance.to_string()))?;
        template
            .parameters
            .get(key)
            .copied()
            .ok_or_else(|| DocumentError::ParameterUnknown(key.to_string()))
    }

    fn write_param(
        &mut self,
        instance: &str,
        key: &str,
        wrapped: ComponentValue,
    ) -> Result<(), DocumentError> {
        let node = self.get_mut(instance)?;
        node.component_properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), wrapped);
        Ok(())
    }
}
