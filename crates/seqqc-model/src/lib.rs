//! SeqQC Model - QC outcome domain vocabulary
//!
//! Side-effect-free building blocks shared by the document and control
//! layers:
//! - Manual and utility QC outcome vocabularies
//! - Rpt keys, row ids and id selectors
//! - Outcome service payloads and update queries
//! - Page classification for manual/utility QC eligibility
//! - Viewer configuration
//!
//! # Example
//!
//! ```rust
//! use seqqc_model::{build_update_query, Category, Outcome, OutcomeChange};
//!
//! let query = build_update_query(
//!     Category::Seq,
//!     &[OutcomeChange::new("18245:1", Outcome::AcceptedPreliminary)],
//! );
//! assert_eq!(query["Action"], "UPDATE");
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod outcome;
pub mod page;
pub mod payload;
pub mod rpt_key;

pub use config::QcConfig;
pub use error::ModelError;
pub use outcome::{Outcome, UtilityOutcome};
pub use page::{classify_page, PageForQc};
pub use payload::{
    build_query, build_update_query, Category, OutcomeChange, OutcomeField, OutcomeMap,
    OutcomeRecord, OutcomesPayload,
};
pub use rpt_key::{
    build_id_selector, build_id_selector_from_rpt_key, id_from_selector, is_lane_key,
    rpt_key_from_id, RptKey, ID_PREFIX,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
