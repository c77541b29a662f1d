//! # Stencil Document
//!
//! In-memory host document model: a node tree with a closed set of node
//! kinds, a template library (component definitions and variant families),
//! and validated mutation primitives.
//!
//! This crate owns the nodes. The override engine (`stencil-overrides`)
//! only reads them and mutates declared properties through the setters
//! exposed here.

mod document;
mod errors;
mod library;
mod node;

pub use document::Document;
pub use errors::DocumentError;
pub use library::Template;
pub use node::{
    ComponentValue, FieldValue, FontRef, GradientStop, Node, NodeId, NodeKind, Paint, ParamKind,
    ParamValue, Rgba, ScaleMode, TemplateId,
};
