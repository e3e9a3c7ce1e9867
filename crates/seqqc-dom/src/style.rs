//! Outcome style mapper
//!
//! Owns the "currently displayed QC outcome" class of an element. At most
//! one class matching the QC style pattern is present after any call.

use crate::document::{Document, NodeId};
use once_cell::sync::Lazy;
use regex::Regex;
use seqqc_model::{ModelError, Outcome};

/// Prefix of every QC outcome style class
pub const STYLE_PREFIX: &str = "qc_outcome_";

/// Style classes that may be displayed
pub const RECOGNIZED_STYLES: [&str; 6] = [
    "qc_outcome_accepted_final",
    "qc_outcome_accepted_preliminary",
    "qc_outcome_rejected_final",
    "qc_outcome_rejected_preliminary",
    "qc_outcome_undecided",
    "qc_outcome_undecided_final",
];

static QC_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^qc_outcome[a-zA-Z_]+$").expect("valid regex"));

/// Style class for an outcome value: lower case, spaces as underscores
#[must_use]
pub fn style_class_for(outcome: &str) -> String {
    format!("{STYLE_PREFIX}{}", outcome.to_lowercase().replace(' ', "_"))
}

/// Recognized style class for an outcome value
///
/// # Errors
/// `ModelError::UnknownOutcome` if the computed class is not recognized.
pub fn checked_style_class(outcome: &str) -> Result<String, ModelError> {
    let class = style_class_for(outcome);
    if RECOGNIZED_STYLES.contains(&class.as_str()) {
        Ok(class)
    } else {
        Err(ModelError::UnknownOutcome(outcome.to_string()))
    }
}

/// Remove every QC outcome style class from an element
pub fn remove_previous_qc_outcome_styles(doc: &mut Document, node: NodeId) {
    doc.remove_classes_where(node, |c| QC_STYLE.is_match(c));
}

/// Display an element as having `outcome`
///
/// # Errors
/// `ModelError::UnknownOutcome` for values outside the vocabulary; the
/// element is left untouched.
pub fn display_element_as(doc: &mut Document, node: NodeId, outcome: &str) -> Result<(), ModelError> {
    let class = checked_style_class(outcome)?;
    remove_previous_qc_outcome_styles(doc, node);
    doc.add_class(node, &class);
    Ok(())
}

/// Display every element as having `outcome`
///
/// # Errors
/// `ModelError::UnknownOutcome` before any element is changed.
pub fn display_elements_as(
    doc: &mut Document,
    nodes: &[NodeId],
    outcome: &str,
) -> Result<(), ModelError> {
    let class = checked_style_class(outcome)?;
    for node in nodes {
        remove_previous_qc_outcome_styles(doc, *node);
        doc.add_class(*node, &class);
    }
    Ok(())
}

/// Display an element with a vocabulary outcome
pub fn display_outcome(doc: &mut Document, node: NodeId, outcome: Outcome) {
    remove_previous_qc_outcome_styles(doc, node);
    doc.add_class(node, &style_class_for(outcome.as_str()));
}

/// Outcome currently displayed on an element, if any
#[must_use]
pub fn displayed_outcome(doc: &Document, node: NodeId) -> Option<Outcome> {
    doc.classes(node).iter().find_map(|class| {
        Outcome::ALL
            .into_iter()
            .find(|o| style_class_for(o.as_str()) == *class)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cell() -> (Document, NodeId) {
        let mut doc = Document::new();
        let td = doc.append_element(doc.root(), "td");
        doc.add_class(td, "lane");
        (doc, td)
    }

    fn qc_classes(doc: &Document, node: NodeId) -> Vec<String> {
        doc.classes(node)
            .iter()
            .filter(|c| c.starts_with("qc_outcome"))
            .cloned()
            .collect()
    }

    #[test]
    fn every_outcome_has_a_recognized_style() {
        for outcome in Outcome::ALL {
            assert!(checked_style_class(outcome.as_str()).is_ok(), "{outcome}");
        }
        assert_eq!(style_class_for("Accepted final"), "qc_outcome_accepted_final");
    }

    #[test]
    fn unknown_outcome_leaves_element_untouched() {
        let (mut doc, td) = cell();
        display_element_as(&mut doc, td, "Accepted preliminary").unwrap();
        let err = display_element_as(&mut doc, td, "Fantastic").unwrap_err();
        assert_eq!(err.to_string(), "Can't find corresponding style for QC outcome Fantastic.");
        assert_eq!(qc_classes(&doc, td), vec!["qc_outcome_accepted_preliminary"]);
        assert_eq!(displayed_outcome(&doc, td), Some(Outcome::AcceptedPreliminary));
    }

    #[test]
    fn bulk_display_validates_first() {
        let mut doc = Document::new();
        let a = doc.append_element(doc.root(), "td");
        let b = doc.append_element(doc.root(), "td");
        display_elements_as(&mut doc, &[a, b], "Undecided").unwrap();
        assert!(display_elements_as(&mut doc, &[a, b], "Accepted").is_err());
        assert_eq!(displayed_outcome(&doc, a), Some(Outcome::Undecided));
        assert_eq!(displayed_outcome(&doc, b), Some(Outcome::Undecided));
    }

    #[test]
    fn removal_is_idempotent_and_keeps_other_classes() {
        let (mut doc, td) = cell();
        doc.add_class(td, "qc_outcome_something_stale");
        remove_previous_qc_outcome_styles(&mut doc, td);
        remove_previous_qc_outcome_styles(&mut doc, td);
        assert_eq!(doc.classes(td), ["lane"]);
    }

    fn outcome_strategy() -> impl Strategy<Value = Outcome> {
        prop_oneof![
            Just(Outcome::AcceptedPreliminary),
            Just(Outcome::RejectedPreliminary),
            Just(Outcome::Undecided),
            Just(Outcome::AcceptedFinal),
            Just(Outcome::RejectedFinal),
            Just(Outcome::UndecidedFinal),
        ]
    }

    proptest! {
        #[test]
        fn exactly_one_style_after_any_sequence(outcomes in prop::collection::vec(outcome_strategy(), 1..8)) {
            let (mut doc, td) = cell();
            for outcome in &outcomes {
                display_element_as(&mut doc, td, outcome.as_str()).unwrap();
                display_element_as(&mut doc, td, outcome.as_str()).unwrap();
            }
            prop_assert_eq!(qc_classes(&doc, td).len(), 1);
            prop_assert_eq!(displayed_outcome(&doc, td), outcomes.last().copied());
            prop_assert!(doc.has_class(td, "lane"));
        }
    }
}
