//! # Stencil Overrides
//!
//! Structural override diff/patch engine: detects which properties of a
//! live instance were locally overridden relative to its template's default
//! state, encodes them into a portable, structure-independent payload, and
//! re-applies that payload onto other instances (possibly of a different
//! variant of the same template family) by best-effort structural
//! correspondence.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ session: copy/paste surface + payload slot  │
//! └─────────────────────────────────────────────┘
//!            ↓ capture              ↓ apply
//! ┌──────────────────────┐ ┌───────────────────────┐
//! │ detector: instance   │ │ applier: 3-tier match │
//! │ vs template diff     │ │ + ordered field write │
//! └──────────────────────┘ └───────────────────────┘
//!            ↓                        ↓
//! ┌─────────────────────────────────────────────┐
//! │ hierarchy + signature + collector + values  │
//! │ (paths, structural identity, enumeration,   │
//! │  type-aware equality/cloning)               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Correspondence across trees rests solely on structural signatures
//! (`kind:name:path:rank`); node ids never cross instances. The payload
//! flows detector → session slot → applier and never leaves process memory.

mod applier;
mod collector;
mod detector;
mod errors;
mod fonts;
mod hierarchy;
mod payload;
mod session;
mod signature;
mod values;

pub use applier::{apply_payload, ApplySummary};
pub use collector::NodeCollector;
pub use detector::capture;
pub use errors::OverrideError;
pub use fonts::{FontError, FontLoader, FontPreloader, NullFontLoader};
pub use hierarchy::PathResolver;
pub use payload::{CopiedPayload, OverrideRecord};
pub use session::{CaptureSummary, OverrideSession};
pub use signature::{sibling_rank, signature, structural_prefix};
pub use values::{
    clone_font, clone_paints, clone_params, clone_variants, fonts_equal, paints_equal,
    params_equal,
};
