//! SeqQC Core - manual and utility QC for sequencing results pages
//!
//! Keeps per-row QC outcomes in sync with the QC outcomes service and
//! projects them onto the page:
//! - Fetch/render pipeline painting stored outcomes onto table cells
//! - Row controls (lane and library) with generation-guarded updates
//! - Bulk control for library pages
//! - Manual and utility QC launchers, UI event routing and page bootstrap
//!
//! # Example
//!
//! ```rust,ignore
//! use seqqc_core::{HttpOutcomesService, QcViewer};
//! use seqqc_dom::{shared, Document};
//! use seqqc_model::QcConfig;
//! use std::sync::Arc;
//!
//! # async fn example(page: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(QcConfig::new().with_outcomes_url("https://qc.example.org/qcoutcomes"));
//! let service = Arc::new(HttpOutcomesService::new(&config)?);
//! let viewer = QcViewer::start(shared(page), service, config).await?;
//!
//! if let Some(session) = viewer.session() {
//!     println!("{} rows under manual QC", session.registry().len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod bootstrap;
pub mod bulk;
pub mod control;
pub mod error;
pub mod launch;
pub mod registry;
pub mod transport;
pub mod view;

pub use bootstrap::QcViewer;
pub use bulk::{BulkAction, BulkControl};
pub use control::{ControlState, ConvergenceObserver, RowControl, RowController, RowKind, Transition};
pub use error::{QcError, TransportError};
pub use launch::{add_uqc_annotation_link, launch_utility_qc, ManualQcSession, UiEvent};
pub use registry::ControlRegistry;
pub use transport::{HttpOutcomesService, OutcomesService};
pub use view::{
    parse_rpt_keys, process_outcomes, update_display_with_qc_outcomes, CellClass, DisplayReport,
    ExistenceMap, OutcomesView,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving QC on a page
    pub use crate::{
        BulkAction, ManualQcSession, OutcomesService, QcError, QcViewer, RowController, Transition,
        UiEvent,
    };
    pub use seqqc_model::{Outcome, QcConfig};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
