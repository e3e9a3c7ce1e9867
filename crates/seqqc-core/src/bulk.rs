//! Bulk ("set all libraries") control
//!
//! Present on library pages only. Sends one batched update for every
//! editable row and, after any change, pins the button matching the outcome
//! shared by all rows. Each row renders its own confirmed outcome; a row
//! updated while a bulk request was pending keeps its newer outcome. A pinned button ignores clicks until the rows
//! diverge again.

use crate::control::{ControlState, ConvergenceObserver, RowController, Transition};
use crate::error::QcError;
use crate::transport::OutcomesService;
use indexmap::IndexMap;
use parking_lot::Mutex;
use seqqc_dom::widgets::{
    append_bulk_button, append_working_slot, clear_working, show_working,
    BULK_DEFAULT_BACKGROUND, BULK_SELECTED_BACKGROUND, CLASS_ALL_ACCEPT, CLASS_ALL_REJECT,
    CLASS_ALL_UNDECIDED, LANE_MQC_CONTROL, LIBRARY_OVERALL_PLACEHOLDER, LIB_MQC_WORKING,
};
use seqqc_dom::{Document, DomError, NodeId, SharedDocument, StatusRegion};
use seqqc_model::{build_update_query, Category, Outcome, OutcomeChange, QcConfig};
use std::fmt;
use std::sync::Arc;

/// One of the three bulk buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkAction {
    /// Accept every library
    AcceptAll,
    /// Set every library undecided
    UndecidedAll,
    /// Reject every library
    RejectAll,
}

impl BulkAction {
    /// Buttons in page order
    pub const ALL: [BulkAction; 3] = [
        BulkAction::AcceptAll,
        BulkAction::UndecidedAll,
        BulkAction::RejectAll,
    ];

    /// Outcome requested by the button
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            BulkAction::AcceptAll => Outcome::AcceptedPreliminary,
            BulkAction::UndecidedAll => Outcome::Undecided,
            BulkAction::RejectAll => Outcome::RejectedPreliminary,
        }
    }

    /// Button for a shared outcome, if any
    #[must_use]
    pub fn for_outcome(outcome: Outcome) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.outcome() == outcome)
    }

    /// CSS class of the button
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            BulkAction::AcceptAll => CLASS_ALL_ACCEPT,
            BulkAction::UndecidedAll => CLASS_ALL_UNDECIDED,
            BulkAction::RejectAll => CLASS_ALL_REJECT,
        }
    }

    /// Tooltip
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            BulkAction::AcceptAll => "Set all libraries in page as accepted",
            BulkAction::UndecidedAll => "Set all libraries in page as undecided",
            BulkAction::RejectAll => "Set all libraries in page as rejected",
        }
    }

    /// Icon file under `images/`
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            BulkAction::AcceptAll => "tick.png",
            BulkAction::UndecidedAll => "circle.png",
            BulkAction::RejectAll => "cross.png",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class())
    }
}

#[derive(Debug, Default)]
struct BulkState {
    working: Option<NodeId>,
    buttons: IndexMap<BulkAction, NodeId>,
    selected: Option<BulkAction>,
    generation: u64,
}

/// Bulk control of a library page
pub struct BulkControl {
    document: SharedDocument,
    service: Arc<dyn OutcomesService>,
    config: Arc<QcConfig>,
    status: StatusRegion,
    rows: Mutex<Vec<Arc<dyn RowController>>>,
    state: Mutex<BulkState>,
}

impl fmt::Debug for BulkControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkControl")
            .field("rows", &self.rows.lock().len())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl BulkControl {
    /// Create a bulk control; call [`setup_controls`](Self::setup_controls) next
    pub fn new(document: SharedDocument, service: Arc<dyn OutcomesService>, config: Arc<QcConfig>) -> Self {
        let status = StatusRegion::new(config.status_region_id.clone());
        Self {
            document,
            service,
            config,
            status,
            rows: Mutex::new(Vec::new()),
            state: Mutex::new(BulkState::default()),
        }
    }

    /// Replace the placeholder with the three buttons and a working slot
    ///
    /// Single-row control markup left in the placeholder's cell is removed.
    ///
    /// # Errors
    /// `DomError::MissingElement` when the page has no placeholder.
    pub fn setup_controls(&self) -> Result<(), QcError> {
        let mut state = self.state.lock();
        let mut doc = self.document.lock();
        let placeholder = doc
            .find_by_class(doc.root(), LIBRARY_OVERALL_PLACEHOLDER)
            .first()
            .copied()
            .ok_or_else(|| DomError::MissingElement(format!(".{LIBRARY_OVERALL_PLACEHOLDER}")))?;
        let parent = doc.parent(placeholder).ok_or(DomError::Detached(placeholder))?;

        for leftover in doc.children_with_class(parent, LANE_MQC_CONTROL) {
            doc.detach(leftover);
        }
        state.working = Some(append_working_slot(&mut doc, parent, LIB_MQC_WORKING));

        doc.remove_children(placeholder);
        state.buttons.clear();
        for action in BulkAction::ALL {
            let button = append_bulk_button(
                &mut doc,
                placeholder,
                action.class(),
                action.title(),
                &self.config.image_url(action.icon()),
            );
            state.buttons.insert(action, button);
        }
        doc.set_style(parent, "text-align", "left");
        tracing::debug!("Bulk controls set up");
        Ok(())
    }

    /// Make every button clickable with the default appearance
    pub fn init(&self) {
        let mut state = self.state.lock();
        self.paint_buttons(&mut state, &mut self.document.lock(), None);
    }

    /// Rows coordinated by this control
    pub fn set_rows(&self, rows: Vec<Arc<dyn RowController>>) {
        *self.rows.lock() = rows;
    }

    /// Button pinned as matching every row's outcome
    #[must_use]
    pub fn selected(&self) -> Option<BulkAction> {
        self.state.lock().selected
    }

    /// Check if a button reacts to clicks
    #[must_use]
    pub fn is_clickable(&self, action: BulkAction) -> bool {
        let state = self.state.lock();
        state.buttons.contains_key(&action) && state.selected != Some(action)
    }

    /// Button element
    #[must_use]
    pub fn button(&self, action: BulkAction) -> Option<NodeId> {
        self.state.lock().buttons.get(&action).copied()
    }

    /// Apply the button's outcome to every editable row
    ///
    /// In-flight row requests are superseded. Returns `Unchanged` for a
    /// pinned button or when no row is editable.
    ///
    /// # Errors
    /// Transport errors, after the rows have been re-rendered with their
    /// confirmed outcomes and the error shown.
    pub async fn click(&self, action: BulkAction) -> Result<Transition, QcError> {
        let outcome = action.outcome();
        let (generation, targets) = {
            let mut state = self.state.lock();
            if !state.buttons.contains_key(&action) || state.selected == Some(action) {
                tracing::debug!("Ignoring click on {}", action);
                return Ok(Transition::Unchanged);
            }
            let rows = self.rows.lock().clone();
            let targets: Vec<(Arc<dyn RowController>, u64)> = rows
                .into_iter()
                .filter(|r| {
                    matches!(
                        r.state(),
                        ControlState::LinkedUndefined | ControlState::Editable(_)
                    )
                })
                .map(|r| {
                    let generation = r.supersede();
                    (r, generation)
                })
                .collect();
            if targets.is_empty() {
                return Ok(Transition::Unchanged);
            }
            state.generation += 1;
            if let Some(slot) = state.working {
                show_working(&mut self.document.lock(), slot, &self.config);
            }
            (state.generation, targets)
        };

        let changes: Vec<OutcomeChange> = targets
            .iter()
            .map(|(row, _)| OutcomeChange::new(row.rpt_key().to_string(), outcome))
            .collect();
        tracing::info!("Setting {} libraries to {}", changes.len(), outcome);
        let result = self
            .service
            .post_json(&build_update_query(Category::Lib, &changes))
            .await;

        let mut state = self.state.lock();
        if state.generation != generation {
            tracing::debug!(generation, "Discarding superseded bulk response");
            return Ok(Transition::Superseded);
        }
        if let Some(slot) = state.working {
            clear_working(&mut self.document.lock(), slot);
        }

        if let Err(e) = result {
            let error = QcError::from(e);
            for (row, _) in &targets {
                row.refresh_view();
            }
            tracing::warn!("Bulk update failed: {}", error);
            self.status
                .display_error(&mut self.document.lock(), &error.user_message());
            return Err(error);
        }

        let applied = targets
            .iter()
            .filter(|(row, generation)| row.apply_confirmed(*generation, outcome))
            .count();
        let selected = self.shared_action();
        let mut doc = self.document.lock();
        self.status.remove_error_messages(&mut doc);
        self.paint_buttons(&mut state, &mut doc, selected);
        tracing::info!("Bulk update applied to {} of {} libraries", applied, targets.len());
        Ok(Transition::Applied(outcome))
    }

    /// Button matching the outcome every row shares
    ///
    /// Takes the rows lock and each row's lock, so the document must not be
    /// held by the caller.
    fn shared_action(&self) -> Option<BulkAction> {
        let outcomes: Vec<Option<Outcome>> = self.rows.lock().iter().map(|r| r.outcome()).collect();
        let shared = match outcomes.split_first() {
            Some((first, rest)) if rest.iter().all(|o| o == first) => *first,
            _ => None,
        };
        let selected = shared.and_then(BulkAction::for_outcome);
        tracing::debug!(?selected, rows = outcomes.len(), "Bulk convergence evaluated");
        selected
    }

    fn paint_buttons(&self, state: &mut BulkState, doc: &mut Document, selected: Option<BulkAction>) {
        for (action, button) in &state.buttons {
            let colour = if Some(*action) == selected {
                BULK_SELECTED_BACKGROUND
            } else {
                BULK_DEFAULT_BACKGROUND
            };
            doc.set_style(*button, "background-color", colour);
        }
        state.selected = selected;
    }
}

impl ConvergenceObserver for BulkControl {
    fn update_if_all_match(&self) {
        let mut state = self.state.lock();
        let selected = self.shared_action();
        self.paint_buttons(&mut state, &mut self.document.lock(), selected);
    }
}
