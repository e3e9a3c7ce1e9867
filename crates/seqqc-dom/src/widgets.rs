//! Manual QC widgets
//!
//! Builders for the small pieces of markup the controls put on the page:
//! outcome radios, the save (padlock) button, the working indicator and the
//! "set all libraries" buttons.

use crate::document::{Document, NodeId};
use seqqc_model::{Outcome, QcConfig};

/// Placeholder marking a QC-editable row
pub const LANE_MQC_CONTROL: &str = "lane_mqc_control";
/// Working indicator slot of a row control
pub const LANE_MQC_WORKING: &str = "lane_mqc_working";
/// Save-as-final button
pub const LANE_MQC_SAVE: &str = "lane_mqc_save";
/// Any clickable control button
pub const LANE_MQC_BUTTON: &str = "lane_mqc_button";
/// Bulk button marker
pub const LANE_MQC_OVERALL: &str = "lane_mqc_overall";
/// Working indicator slot of the bulk control
pub const LIB_MQC_WORKING: &str = "lib_mqc_working";
/// Placeholder replaced by the bulk buttons
pub const LIBRARY_OVERALL_PLACEHOLDER: &str = "library_mqc_overall_controls";
/// Cell formatting while a lane control is editable
pub const TD_MQC: &str = "td_mqc";
/// Cell formatting while a library control is editable
pub const TD_LIBRARY_MQC: &str = "td_library_mqc";

/// Bulk "accept all" button
pub const CLASS_ALL_ACCEPT: &str = "lane_mqc_accept_all";
/// Bulk "reject all" button
pub const CLASS_ALL_REJECT: &str = "lane_mqc_reject_all";
/// Bulk "undecided all" button
pub const CLASS_ALL_UNDECIDED: &str = "lane_mqc_undecided_all";

/// Bulk button background at rest
pub const BULK_DEFAULT_BACKGROUND: &str = "#F4F4F4";
/// Bulk button background when every library shares its outcome
pub const BULK_SELECTED_BACKGROUND: &str = "#D4D4D4";

const WORKING_TITLE: &str = "Processing request.";
const SAVE_TITLE: &str = "Save current outcome as final (can not be changed again)";

/// Label shown next to an outcome radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioLabel {
    /// Image with a tooltip
    Icon {
        /// Image file under `images/`
        image: &'static str,
        /// Tooltip
        title: &'static str,
    },
    /// Blank spacer
    Blank,
}

impl RadioLabel {
    /// Label used for an editable outcome
    #[must_use]
    pub fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::AcceptedPreliminary => RadioLabel::Icon {
                image: "tick.png",
                title: "Mark lane as preliminary pass",
            },
            Outcome::RejectedPreliminary => RadioLabel::Icon {
                image: "cross.png",
                title: "Mark lane as preliminary fail",
            },
            _ => RadioLabel::Blank,
        }
    }
}

/// One radio of a row's outcome group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRadio {
    /// Row the radio belongs to
    pub row_id: String,
    /// Outcome selected by this radio
    pub outcome: Outcome,
    /// Label next to the radio
    pub label: RadioLabel,
    /// Group name shared by the row's radios
    pub group: String,
    /// Initially selected
    pub checked: bool,
}

impl OutcomeRadio {
    /// Radio for `outcome` in the group of `row_id`
    #[must_use]
    pub fn new(row_id: &str, outcome: Outcome, checked: bool) -> Self {
        Self {
            row_id: row_id.to_string(),
            outcome,
            label: RadioLabel::for_outcome(outcome),
            group: radio_group_name(row_id),
            checked,
        }
    }

    /// Element id of the input
    #[must_use]
    pub fn input_id(&self) -> String {
        format!("radio_{}_{}", self.row_id, self.outcome.as_str())
    }

    /// Append the input and its label to `parent`, returning the input
    pub fn append_to(&self, doc: &mut Document, parent: NodeId, config: &QcConfig) -> NodeId {
        let input_id = self.input_id();
        let input = doc.append_element(parent, "input");
        doc.set_attr(input, "type", "radio");
        doc.set_id(input, input_id.clone());
        doc.set_attr(input, "name", self.group.clone());
        doc.set_attr(input, "value", self.outcome.as_str());
        if self.checked {
            doc.set_attr(input, "checked", "checked");
        }

        let label = doc.append_element(parent, "label");
        doc.set_attr(label, "for", input_id);
        match self.label {
            RadioLabel::Icon { image, title } => {
                let img = doc.append_element(label, "img");
                doc.set_attr(img, "src", config.image_url(image));
                doc.set_attr(img, "title", title);
            }
            RadioLabel::Blank => doc.set_text(label, "\u{a0}\u{a0}\u{a0}"),
        }
        input
    }
}

/// Radio group name for a row
#[must_use]
pub fn radio_group_name(row_id: &str) -> String {
    format!("radios_{row_id}")
}

fn radios_in(doc: &Document, group: &str) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|n| doc.tag(*n) == "input" && doc.attr(*n, "type") == Some("radio"))
        .filter(|n| doc.attr(*n, "name") == Some(group))
        .collect()
}

/// Value of the checked radio of a group
#[must_use]
pub fn radio_group_value(doc: &Document, group: &str) -> Option<String> {
    radios_in(doc, group)
        .into_iter()
        .find(|r| doc.attr(*r, "checked").is_some())
        .and_then(|r| doc.attr(r, "value").map(str::to_string))
}

/// Check the radio of `group` whose value is `value`; `None` clears the group
pub fn set_radio_group_value(doc: &mut Document, group: &str, value: Option<&str>) {
    for radio in radios_in(doc, group) {
        set_checked(doc, radio, value);
    }
}

fn set_checked(doc: &mut Document, radio: NodeId, value: Option<&str>) {
    let matches = value.is_some() && doc.attr(radio, "value") == value;
    if matches {
        doc.set_attr(radio, "checked", "checked");
    } else {
        doc.remove_attr(radio, "checked");
    }
}

/// Append an empty working indicator slot with `class` to `parent`
pub fn append_working_slot(doc: &mut Document, parent: NodeId, class: &str) -> NodeId {
    let slot = doc.append_element(parent, "span");
    doc.add_class(slot, class);
    slot
}

/// Show the spinner in a working slot
pub fn show_working(doc: &mut Document, slot: NodeId, config: &QcConfig) {
    doc.remove_children(slot);
    let img = doc.append_element(slot, "img");
    doc.set_attr(img, "src", config.image_url("waiting.gif"));
    doc.set_attr(img, "width", "10");
    doc.set_attr(img, "height", "10");
    doc.set_attr(img, "title", WORKING_TITLE);
}

/// Clear the spinner from a working slot
pub fn clear_working(doc: &mut Document, slot: NodeId) {
    doc.remove_children(slot);
}

/// Check if a working slot shows the spinner
#[must_use]
pub fn is_working(doc: &Document, slot: NodeId) -> bool {
    !doc.children(slot).is_empty()
}

/// Append the save-as-final (padlock) button to `parent`
pub fn append_save_button(doc: &mut Document, parent: NodeId, config: &QcConfig) -> NodeId {
    let button = doc.append_element(parent, "span");
    doc.add_class(button, LANE_MQC_BUTTON);
    doc.add_class(button, LANE_MQC_SAVE);
    doc.set_attr(button, "title", SAVE_TITLE);
    let img = doc.append_element(button, "img");
    doc.set_attr(img, "src", config.image_url("padlock.png"));
    button
}

/// Append one bulk button to `parent`
pub fn append_bulk_button(
    doc: &mut Document,
    parent: NodeId,
    class: &str,
    title: &str,
    icon_url: &str,
) -> NodeId {
    let button = doc.append_element(parent, "span");
    doc.add_class(button, LANE_MQC_BUTTON);
    doc.add_class(button, LANE_MQC_OVERALL);
    doc.add_class(button, class);
    doc.set_attr(button, "title", title);
    let img = doc.append_element(button, "img");
    doc.set_attr(img, "src", icon_url);
    doc.set_attr(img, "width", "10");
    doc.set_attr(img, "height", "10");
    button
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_with_radios(doc: &mut Document, row_id: &str, checked: Option<Outcome>) -> NodeId {
        let config = QcConfig::default();
        let cell = doc.append_element(doc.root(), "span");
        for outcome in Outcome::EDITABLE {
            OutcomeRadio::new(row_id, outcome, checked == Some(outcome)).append_to(doc, cell, &config);
        }
        cell
    }

    #[test]
    fn radio_markup() {
        let mut doc = Document::new();
        let cell = row_with_radios(&mut doc, "rpt_key:1:1", Some(Outcome::Undecided));
        let input = doc.get_element_by_id("radio_rpt_key:1:1_Accepted preliminary").unwrap();
        assert_eq!(doc.attr(input, "name"), Some("radios_rpt_key:1:1"));
        assert_eq!(doc.attr(input, "value"), Some("Accepted preliminary"));
        assert_eq!(doc.children(cell).len(), 6);
        let label = doc.children(cell)[1];
        let img = doc.children(label)[0];
        assert_eq!(doc.attr(img, "src"), Some("/static/images/tick.png"));
        assert_eq!(
            radio_group_value(&doc, "radios_rpt_key:1:1").as_deref(),
            Some("Undecided")
        );
    }

    #[test]
    fn group_values_are_independent() {
        let mut doc = Document::new();
        row_with_radios(&mut doc, "a", None);
        row_with_radios(&mut doc, "b", Some(Outcome::RejectedPreliminary));
        assert_eq!(radio_group_value(&doc, "radios_a"), None);

        set_radio_group_value(&mut doc, "radios_a", Some("Accepted preliminary"));
        assert_eq!(radio_group_value(&doc, "radios_a").as_deref(), Some("Accepted preliminary"));
        assert_eq!(radio_group_value(&doc, "radios_b").as_deref(), Some("Rejected preliminary"));

        set_radio_group_value(&mut doc, "radios_b", None);
        assert_eq!(radio_group_value(&doc, "radios_b"), None);
    }

    #[test]
    fn working_indicator() {
        let mut doc = Document::new();
        let config = QcConfig::default().with_asset_root("/assets");
        let root = doc.root();
        let slot = append_working_slot(&mut doc, root, LANE_MQC_WORKING);
        assert!(!is_working(&doc, slot));
        show_working(&mut doc, slot, &config);
        show_working(&mut doc, slot, &config);
        assert_eq!(doc.children(slot).len(), 1);
        assert_eq!(doc.attr(doc.children(slot)[0], "src"), Some("/assets/images/waiting.gif"));
        clear_working(&mut doc, slot);
        assert!(!is_working(&doc, slot));
    }

    #[test]
    fn buttons() {
        let mut doc = Document::new();
        let config = QcConfig::default();
        let root = doc.root();
        let save = append_save_button(&mut doc, root, &config);
        assert!(doc.has_class(save, LANE_MQC_SAVE));
        let accept = append_bulk_button(
            &mut doc,
            root,
            CLASS_ALL_ACCEPT,
            "Set all libraries in page as accepted",
            &config.image_url("tick.png"),
        );
        assert_eq!(doc.find_by_class(doc.root(), LANE_MQC_OVERALL), vec![accept]);
    }
}
