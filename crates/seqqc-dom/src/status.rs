//! Status region receiving user-visible error lines

use crate::document::{Document, NodeId};

/// Class of an error line
pub const ERROR_LINE_CLASS: &str = "failed_mqc";

/// Handle on the `<ul>` that shows errors to the reviewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegion {
    id: String,
}

impl StatusRegion {
    /// Region identified by element id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Element id of the region
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Region element, created at the top of the page when missing
    pub fn ensure(&self, doc: &mut Document) -> NodeId {
        if let Some(node) = doc.get_element_by_id(&self.id) {
            return node;
        }
        let list = doc.create_element("ul");
        doc.set_id(list, self.id.clone());
        let root = doc.root();
        let inserted = doc
            .children(root)
            .first()
            .copied()
            .is_some_and(|first| doc.insert_before(first, list).is_ok());
        if !inserted {
            doc.append_child(root, list);
        }
        list
    }

    /// Replace any shown error with `message`
    pub fn display_error(&self, doc: &mut Document, message: &str) {
        let region = self.ensure(doc);
        doc.remove_children(region);
        let line = doc.append_element(region, "li");
        doc.add_class(line, ERROR_LINE_CLASS);
        doc.set_text(line, message);
        tracing::warn!(region = %self.id, %message, "QC error displayed");
    }

    /// Remove every shown error
    pub fn remove_error_messages(&self, doc: &mut Document) {
        if let Some(region) = doc.get_element_by_id(&self.id) {
            doc.remove_children(region);
        }
    }

    /// Error lines currently shown
    #[must_use]
    pub fn error_lines(&self, doc: &Document) -> Vec<String> {
        doc.get_element_by_id(&self.id)
            .map(|region| {
                doc.children_with_class(region, ERROR_LINE_CLASS)
                    .into_iter()
                    .map(|line| doc.text_content(line))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for StatusRegion {
    fn default() -> Self {
        Self::new("ajax_status")
    }
}
