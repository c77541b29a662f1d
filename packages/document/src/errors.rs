//! Error types for document mutation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("Node {0} is not an instance")]
    NotAnInstance(String),

    #[error("Node {0} is not a text node")]
    NotText(String),

    #[error("Node {node} does not support {property}")]
    PropertyUnsupported { node: String, property: &'static str },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("No variant of the template family matches the selectors on {0}")]
    NoMatchingVariant(String),

    #[error("Unknown component parameter: {0}")]
    ParameterUnknown(String),

    #[error("Component parameter {0} cannot be set through this mechanism")]
    ParameterMechanismUnsupported(String),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Parent element cannot have children: {0}")]
    InvalidParent(String),
}
