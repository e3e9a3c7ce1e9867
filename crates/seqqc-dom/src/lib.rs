//! SeqQC DOM - document projection of QC outcomes
//!
//! A small in-memory document standing in for the results page, with just
//! enough CSS selector support for rpt key lookups:
//! - Arena document with shared handle ([`SharedDocument`])
//! - Selector subset (tag, `#id`, `.class`, attribute matchers, descendant)
//! - Outcome style mapper (mutually exclusive `qc_outcome_*` classes)
//! - Utility QC marks and the status region
//! - Widget builders for manual QC controls
//!
//! # Example
//!
//! ```rust
//! use seqqc_dom::{display_element_as, Document};
//!
//! let mut doc = Document::new();
//! let cell = doc.append_element(doc.root(), "td");
//! display_element_as(&mut doc, cell, "Accepted final").unwrap();
//! assert!(doc.has_class(cell, "qc_outcome_accepted_final"));
//! ```

#![warn(unreachable_pub)]

pub mod document;
pub mod error;
pub mod selector;
pub mod status;
pub mod style;
pub mod utility;
pub mod widgets;

pub use document::{shared, Document, NodeId, SharedDocument};
pub use error::DomError;
pub use selector::Selector;
pub use status::StatusRegion;
pub use style::{
    display_element_as, display_elements_as, display_outcome, displayed_outcome,
    remove_previous_qc_outcome_styles, style_class_for,
};
pub use utility::utility_display_switch;
