//! Node types and the small closed set of mutable property values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Host-assigned node identifier. Unique within a document and stable for
/// the node's lifetime.
pub type NodeId = String;

/// Template (component definition) identifier.
pub type TemplateId = String;

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Document,
    Page,
    Frame,
    Group,
    Rectangle,
    Ellipse,
    Polygon,
    Star,
    Line,
    Vector,
    Text,
    Instance,
}

impl NodeKind {
    /// Kinds the override engine enumerates: text, instances, and the
    /// primitive shape/container kinds. Document and page structure is
    /// never overridable.
    pub fn is_overridable(&self) -> bool {
        !matches!(self, NodeKind::Document | NodeKind::Page)
    }

    /// Kinds that carry fill/stroke paint lists.
    pub fn supports_paints(&self) -> bool {
        matches!(
            self,
            NodeKind::Frame
                | NodeKind::Rectangle
                | NodeKind::Ellipse
                | NodeKind::Polygon
                | NodeKind::Star
                | NodeKind::Line
                | NodeKind::Vector
                | NodeKind::Text
                | NodeKind::Instance
        )
    }

    /// Kinds that may contain children.
    pub fn supports_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::Page
                | NodeKind::Frame
                | NodeKind::Group
                | NodeKind::Instance
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Page => "page",
            NodeKind::Frame => "frame",
            NodeKind::Group => "group",
            NodeKind::Rectangle => "rectangle",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Polygon => "polygon",
            NodeKind::Star => "star",
            NodeKind::Line => "line",
            NodeKind::Vector => "vector",
            NodeKind::Text => "text",
            NodeKind::Instance => "instance",
        };
        write!(f, "{}", name)
    }
}

/// A property value that the host may report as mixed (e.g. a text node
/// whose characters span multiple fonts). Mixed values cannot be read as a
/// single value and are skipped by the override engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldValue<T> {
    Uniform(T),
    Mixed,
}

impl<T> FieldValue<T> {
    pub fn uniform(&self) -> Option<&T> {
        match self {
            FieldValue::Uniform(v) => Some(v),
            FieldValue::Mixed => None,
        }
    }
}

/// RGBA color, channels in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    Fill,
    Fit,
    Crop,
    Tile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: Rgba,
}

/// Paint entry in a fill or stroke list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Paint {
    Solid {
        color: Rgba,
        opacity: f32,
    },
    Image {
        hash: String,
        scale_mode: ScaleMode,
    },
    Gradient {
        stops: Vec<GradientStop>,
        opacity: f32,
    },
}

impl Paint {
    pub fn solid(r: f32, g: f32, b: f32) -> Self {
        Paint::Solid {
            color: Rgba::new(r, g, b, 1.0),
            opacity: 1.0,
        }
    }
}

/// Font identity: family plus style ("Inter" + "Bold").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontRef {
    pub family: String,
    pub style: String,
}

impl FontRef {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl fmt::Display for FontRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

/// Declared kind of a component parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Bool,
    Text,
    Variant,
    InstanceSwap,
}

/// Scalar component-parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Text(String),
}

/// A component-parameter entry as stored on an instance: the scalar value
/// wrapped together with its declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentValue {
    pub value: ParamValue,
    pub kind: ParamKind,
}

impl ComponentValue {
    pub fn new(value: ParamValue, kind: ParamKind) -> Self {
        Self { value, kind }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(ParamValue::Text(value.into()), ParamKind::Text)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ParamValue::Bool(value), ParamKind::Bool)
    }
}

/// A node in the document tree.
///
/// Property fields are `Option` because each applies only to a subset of
/// kinds; a `None` means "not applicable", never "applicable but unset".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,

    pub characters: Option<String>,
    pub font: Option<FieldValue<FontRef>>,
    pub font_size: Option<FieldValue<f32>>,
    pub fills: Option<Vec<Paint>>,
    pub strokes: Option<Vec<Paint>>,
    pub opacity: f32,
    pub visible: bool,

    pub variant_properties: Option<BTreeMap<String, String>>,
    pub component_properties: Option<BTreeMap<String, ComponentValue>>,
    pub template_id: Option<TemplateId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        let is_text = kind == NodeKind::Text;
        let is_instance = kind == NodeKind::Instance;
        Self {
            id,
            kind,
            name: name.into(),
            parent: None,
            children: Vec::new(),
            characters: is_text.then(String::new),
            font: is_text.then(|| FieldValue::Uniform(FontRef::new("Inter", "Regular"))),
            font_size: is_text.then(|| FieldValue::Uniform(12.0)),
            fills: kind.supports_paints().then(Vec::new),
            strokes: kind.supports_paints().then(Vec::new),
            opacity: 1.0,
            visible: true,
            variant_properties: is_instance.then(BTreeMap::new),
            component_properties: is_instance.then(BTreeMap::new),
            template_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overridable_kinds() {
        assert!(NodeKind::Text.is_overridable());
        assert!(NodeKind::Instance.is_overridable());
        assert!(NodeKind::Rectangle.is_overridable());
        assert!(!NodeKind::Page.is_overridable());
        assert!(!NodeKind::Document.is_overridable());
    }

    #[test]
    fn test_text_node_defaults() {
        let node = Node::new("node-1".to_string(), NodeKind::Text, "Title");
        assert_eq!(node.characters.as_deref(), Some(""));
        assert!(node.font.is_some());
        assert_eq!(node.font_size.and_then(|f| f.uniform().copied()), Some(12.0));
        assert_eq!(node.opacity, 1.0);
        assert!(node.visible);
    }

    #[test]
    fn test_group_has_no_paints() {
        let node = Node::new("node-2".to_string(), NodeKind::Group, "wrap");
        assert!(node.fills.is_none());
        assert!(node.strokes.is_none());
    }

    #[test]
    fn test_mixed_field_has_no_uniform_value() {
        let field: FieldValue<f32> = FieldValue::Mixed;
        assert!(field.uniform().is_none());
        assert_eq!(FieldValue::Uniform(18.0).uniform(), Some(&18.0));
    }
}
