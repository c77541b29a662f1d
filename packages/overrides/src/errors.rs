//! Error types for the override engine.
//!
//! Only the outermost failure scopes become errors: bad selections,
//! unresolvable templates, and a missing payload. Narrower failures
//! (per-field, per-record, per-target) are contained where they occur and
//! surface as counts or warnings, never as `Err`.

use stencil_document::DocumentError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Selection error: {0}")]
    Selection(String),

    #[error("No main template found for instance {0}")]
    NoTemplate(String),

    #[error("Nothing has been copied yet")]
    NothingCopied,

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}
