//! # Resource Preload Coordinator
//!
//! Deduplicates and batches the asynchronous loading of fonts referenced by
//! a pending set of overrides. The loaded set is append-only until an
//! explicit clear, so a given font reference is requested from the host at
//! most once per preloader lifetime. Preloading completes before any
//! target's field application begins; a single font failing to load is a
//! warning, not an abort.

use futures_util::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::future::Future;
use stencil_document::FontRef;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontError {
    #[error("Font unavailable: {0}")]
    Unavailable(String),
}

/// Host capability for loading a font resource by reference.
///
/// The returned future must be `Send` so preloading (and everything built
/// on it) stays spawnable on multi-threaded executors. Implementations can
/// still be written as plain `async fn`.
pub trait FontLoader {
    fn load_font(&self, font: &FontRef) -> impl Future<Output = Result<(), FontError>> + Send;
}

/// Loader for hosts whose fonts are always available (and for tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFontLoader;

impl FontLoader for NullFontLoader {
    async fn load_font(&self, _font: &FontRef) -> Result<(), FontError> {
        Ok(())
    }
}

pub struct FontPreloader<L> {
    loader: L,
    loaded: HashSet<FontRef>,
}

impl<L: FontLoader> FontPreloader<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            loaded: HashSet::new(),
        }
    }

    /// Load every font in `fonts` that is not already loaded, issuing all
    /// pending loads jointly and awaiting them together.
    pub async fn preload(&mut self, fonts: BTreeSet<FontRef>) {
        let pending: Vec<FontRef> = fonts
            .into_iter()
            .filter(|f| !self.loaded.contains(f))
            .collect();
        if pending.is_empty() {
            return;
        }

        let results = join_all(pending.iter().map(|f| self.loader.load_font(f))).await;
        for (font, result) in pending.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    self.loaded.insert(font);
                }
                Err(err) => warn!(font = %font, %err, "font preload failed"),
            }
        }
    }

    pub fn is_loaded(&self, font: &FontRef) -> bool {
        self.loaded.contains(font)
    }

    /// Forget everything loaded; subsequent preloads request again.
    pub fn clear(&mut self) {
        self.loaded.clear();
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}
