//! Utility QC marks on table cells

use crate::document::{Document, NodeId};
use seqqc_model::{ModelError, UtilityOutcome};

/// Class of the mark shown for an accepted utility outcome
pub const UTILITY_PASS: &str = "utility_pass";

/// Class of the mark shown for a rejected utility outcome
pub const UTILITY_FAIL: &str = "utility_fail";

/// Show the utility QC mark for `value` in `cell`
///
/// Any previous mark is replaced; `Undecided` leaves no mark.
///
/// # Errors
/// `ModelError::Argument` if `value` is not a utility outcome; the cell is
/// left untouched.
pub fn utility_display_switch(doc: &mut Document, cell: NodeId, value: &str) -> Result<(), ModelError> {
    let outcome: UtilityOutcome = value.parse()?;
    clear_utility_marks(doc, cell);
    let class = match outcome {
        UtilityOutcome::Accepted => UTILITY_PASS,
        UtilityOutcome::Rejected => UTILITY_FAIL,
        UtilityOutcome::Undecided => return Ok(()),
    };
    let mark = doc.append_element(cell, "span");
    doc.add_class(mark, class);
    Ok(())
}

/// Remove utility QC marks from `cell`
pub fn clear_utility_marks(doc: &mut Document, cell: NodeId) {
    let marks: Vec<NodeId> = doc
        .children(cell)
        .iter()
        .copied()
        .filter(|c| doc.has_class(*c, UTILITY_PASS) || doc.has_class(*c, UTILITY_FAIL))
        .collect();
    for mark in marks {
        doc.detach(mark);
    }
}

/// Utility outcome currently marked on `cell`
#[must_use]
pub fn displayed_utility(doc: &Document, cell: NodeId) -> Option<UtilityOutcome> {
    if !doc.children_with_class(cell, UTILITY_PASS).is_empty() {
        Some(UtilityOutcome::Accepted)
    } else if !doc.children_with_class(cell, UTILITY_FAIL).is_empty() {
        Some(UtilityOutcome::Rejected)
    } else {
        None
    }
}
