//! # Override Session
//!
//! User-action surface over the detector and application engine: `copy`
//! validates the selection and captures a payload, `paste` applies the most
//! recent one. The session holds the single "last copied" slot as a
//! convenience for a single-user host; callers that want to own payload
//! lifetime themselves use [`crate::apply_payload`] directly.

use stencil_document::{Document, NodeId, NodeKind};

use crate::applier::{apply_payload, ApplySummary};
use crate::detector::capture;
use crate::errors::OverrideError;
use crate::fonts::{FontLoader, FontPreloader};
use crate::payload::CopiedPayload;

/// Result of a copy, for user-facing status text.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub template_name: String,
    pub override_count: usize,
}

impl CaptureSummary {
    pub fn message(&self) -> String {
        format!(
            "Copied {} override(s) from '{}'",
            self.override_count, self.template_name
        )
    }
}

pub struct OverrideSession<L> {
    fonts: FontPreloader<L>,
    last_copied: Option<CopiedPayload>,
}

impl<L: FontLoader> OverrideSession<L> {
    pub fn new(loader: L) -> Self {
        Self {
            fonts: FontPreloader::new(loader),
            last_copied: None,
        }
    }

    /// Capture overrides from the selected instance. Requires exactly one
    /// instance-kind node selected; replaces the previous payload wholesale.
    pub fn copy(
        &mut self,
        doc: &Document,
        selection: &[NodeId],
    ) -> Result<CaptureSummary, OverrideError> {
        let [instance] = selection else {
            return Err(OverrideError::Selection(
                "select exactly one instance to copy overrides from".to_string(),
            ));
        };
        if doc.node(instance).map(|n| n.kind) != Some(NodeKind::Instance) {
            return Err(OverrideError::Selection(format!(
                "node {} is not an instance",
                instance
            )));
        }

        let payload = capture(doc, instance)?;
        let summary = CaptureSummary {
            template_name: payload.template_name.clone(),
            override_count: payload.records.len(),
        };
        self.last_copied = Some(payload);
        Ok(summary)
    }

    /// Apply the last copied payload to the selected target instances.
    pub async fn paste(
        &mut self,
        doc: &mut Document,
        targets: &[NodeId],
    ) -> Result<ApplySummary, OverrideError> {
        let payload = self.last_copied.as_ref().ok_or(OverrideError::NothingCopied)?;
        apply_payload(doc, payload, targets, &mut self.fonts).await
    }

    /// The currently held payload, if any.
    pub fn payload(&self) -> Option<&CopiedPayload> {
        self.last_copied.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::NullFontLoader;
    use std::collections::BTreeMap;
    use stencil_document::NodeKind;

    fn session() -> OverrideSession<NullFontLoader> {
        OverrideSession::new(NullFontLoader)
    }

    fn simple_instance(doc: &mut Document) -> NodeId {
        let page = doc.page().to_string();
        let root = doc.create_node(NodeKind::Frame, "Card", &page).unwrap();
        doc.create_node(NodeKind::Text, "Title", &root).unwrap();
        let template = doc
            .define_template("Card", None, BTreeMap::new(), BTreeMap::new(), root)
            .unwrap();
        doc.create_instance(&template, &page).unwrap()
    }

    #[test]
    fn test_copy_requires_single_instance_selection() {
        let mut doc = Document::new();
        let a = simple_instance(&mut doc);
        let b = simple_instance(&mut doc);

        let mut session = session();
        assert!(matches!(
            session.copy(&doc, &[]),
            Err(OverrideError::Selection(_))
        ));
        assert!(matches!(
            session.copy(&doc, &[a.clone(), b]),
            Err(OverrideError::Selection(_))
        ));
        assert!(session.copy(&doc, &[a]).is_ok());
        assert!(session.payload().is_some());
    }

    #[tokio::test]
    async fn test_paste_without_copy_fails() {
        let mut doc = Document::new();
        let target = simple_instance(&mut doc);

        let mut session = session();
        assert!(matches!(
            session.paste(&mut doc, &[target]).await,
            Err(OverrideError::NothingCopied)
        ));
    }

    #[tokio::test]
    async fn test_copy_replaces_previous_payload() {
        let mut doc = Document::new();
        let a = simple_instance(&mut doc);
        let title = doc.node(&a).unwrap().children[0].clone();
        doc.set_font_size(&title, 20.0).unwrap();

        let mut session = session();
        let first = session.copy(&doc, &[a.clone()]).unwrap();
        assert_eq!(first.override_count, 1);

        doc.set_font_size(&title, 12.0).unwrap();
        let second = session.copy(&doc, &[a]).unwrap();
        assert_eq!(second.override_count, 0);
        assert!(second.message().contains("Copied 0 override(s)"));
    }
}
