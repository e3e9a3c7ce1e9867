//! Per-row manual QC control
//!
//! A [`RowControl`] is the single source of truth for the outcome of one
//! lane or library row. The row's markup is a projection of it: radios,
//! save button, working indicator and the outcome style of the row cell are
//! recomputed from the control and never read back.
//!
//! State machine:
//!
//! ```text
//! Unlinked --link--> LinkedUndefined --update ok--> Editable(o)
//!                    Editable(o) --update ok--> Editable(o') | Final(f)
//!                    Editable(o) --update failed--> Editable(o)
//! ```
//!
//! Every outgoing update carries a generation number. A response whose
//! generation has been superseded (by a later update of the same row or by
//! a bulk update) is discarded.

use crate::error::QcError;
use crate::transport::OutcomesService;
use parking_lot::Mutex;
use seqqc_dom::widgets::{
    append_save_button, append_working_slot, clear_working, radio_group_name,
    set_radio_group_value, show_working, OutcomeRadio, LANE_MQC_WORKING, TD_LIBRARY_MQC, TD_MQC,
};
use seqqc_dom::{display_outcome, Document, DomError, NodeId, SharedDocument, StatusRegion};
use seqqc_model::{
    build_update_query, rpt_key_from_id, Category, Outcome, OutcomeChange, QcConfig, RptKey,
};
use std::fmt;
use std::sync::{Arc, Weak};

/// Row granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Lane row on a run page
    Lane,
    /// Library row on a lane page
    Library,
}

impl RowKind {
    /// Row kind used on a run page or a lane page
    #[inline]
    #[must_use]
    pub fn for_page(is_run_page: bool) -> Self {
        if is_run_page {
            RowKind::Lane
        } else {
            RowKind::Library
        }
    }

    /// Update category
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            RowKind::Lane => Category::Seq,
            RowKind::Library => Category::Lib,
        }
    }

    fn format_class(self) -> &'static str {
        match self {
            RowKind::Lane => TD_MQC,
            RowKind::Library => TD_LIBRARY_MQC,
        }
    }
}

/// Control state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Not bound to a row
    Unlinked,
    /// Bound, no known outcome
    LinkedUndefined,
    /// Preliminary or undecided, radios shown
    Editable(Outcome),
    /// Final, controls replaced by an inert display
    Final(Outcome),
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlState::Unlinked => f.write_str("unlinked"),
            ControlState::LinkedUndefined => f.write_str("undefined"),
            ControlState::Editable(o) | ControlState::Final(o) => write!(f, "{o}"),
        }
    }
}

/// Result of a transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested outcome equals the current one; nothing sent
    Unchanged,
    /// Server confirmed the outcome and the view shows it
    Applied(Outcome),
    /// A later request superseded this one; its response was discarded
    Superseded,
}

/// Notified after a row's outcome changes
pub trait ConvergenceObserver: Send + Sync {
    /// Re-evaluate whether every row shares one outcome
    fn update_if_all_match(&self);
}

/// Capabilities shared by lane and library row controls
#[async_trait::async_trait]
pub trait RowController: Send + Sync {
    /// Id of the bound table row
    fn row_id(&self) -> &str;

    /// Rpt key of the row
    fn rpt_key(&self) -> &RptKey;

    /// Current confirmed outcome
    fn outcome(&self) -> Option<Outcome>;

    /// Current state
    fn state(&self) -> ControlState;

    /// Render radios, save button and working slot into the bound row
    ///
    /// # Errors
    /// `InvalidState` if the control is not linked.
    fn generate_active_controls(&self) -> Result<(), QcError>;

    /// Show `outcome` as the row's confirmed outcome
    ///
    /// # Errors
    /// `InvalidState` if the control is not linked.
    fn update_view(&self, outcome: Outcome) -> Result<(), QcError>;

    /// Request a new outcome from the service
    ///
    /// # Errors
    /// `InvalidState` when unlinked or final; transport errors after the
    /// view has been rolled back and the error shown.
    async fn update_outcome(&self, outcome: Outcome) -> Result<Transition, QcError>;

    /// Turn the preliminary outcome into the matching final one
    ///
    /// # Errors
    /// `InvalidState` from `Undecided`, undefined or final outcomes.
    async fn save_as_final_outcome(&self) -> Result<Transition, QcError>;

    /// Re-render the confirmed outcome, discarding unconfirmed selections
    fn refresh_view(&self);

    /// Invalidate any in-flight request, returning the new generation
    fn supersede(&self) -> u64;

    /// Apply an outcome confirmed for `generation`; false if superseded
    fn apply_confirmed(&self, generation: u64, outcome: Outcome) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    control: NodeId,
    cell: NodeId,
    working: Option<NodeId>,
    save: Option<NodeId>,
}

#[derive(Debug, Default)]
struct ControlInner {
    outcome: Option<Outcome>,
    binding: Option<Binding>,
    generation: u64,
    in_flight: Option<u64>,
}

impl ControlInner {
    fn state(&self) -> ControlState {
        match (self.binding, self.outcome) {
            (None, _) => ControlState::Unlinked,
            (Some(_), None) => ControlState::LinkedUndefined,
            (Some(_), Some(o)) if o.is_final() => ControlState::Final(o),
            (Some(_), Some(o)) => ControlState::Editable(o),
        }
    }
}

/// Manual QC control of one row
pub struct RowControl {
    kind: RowKind,
    row_id: String,
    rpt_key: RptKey,
    document: SharedDocument,
    service: Arc<dyn OutcomesService>,
    config: Arc<QcConfig>,
    status: StatusRegion,
    inner: Mutex<ControlInner>,
    observer: Mutex<Option<Weak<dyn ConvergenceObserver>>>,
}

impl fmt::Debug for RowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowControl")
            .field("kind", &self.kind)
            .field("row_id", &self.row_id)
            .field("state", &self.inner.lock().state())
            .finish_non_exhaustive()
    }
}

impl RowControl {
    /// Create an unlinked control for the row with id `row_id`
    ///
    /// # Errors
    /// `ModelError::Format` if the row id is not a rpt key id.
    pub fn new(
        kind: RowKind,
        row_id: &str,
        document: SharedDocument,
        service: Arc<dyn OutcomesService>,
        config: Arc<QcConfig>,
    ) -> Result<Self, QcError> {
        let rpt_key = rpt_key_from_id(row_id)?;
        let status = StatusRegion::new(config.status_region_id.clone());
        Ok(Self {
            kind,
            row_id: row_id.to_string(),
            rpt_key,
            document,
            service,
            config,
            status,
            inner: Mutex::new(ControlInner::default()),
            observer: Mutex::new(None),
        })
    }

    /// With the outcome known before linking
    #[must_use]
    pub fn with_outcome(self, outcome: Option<Outcome>) -> Self {
        self.inner.lock().outcome = outcome;
        self
    }

    /// Row granularity
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RowKind {
        self.kind
    }

    /// Name of the row's radio group
    #[must_use]
    pub fn radio_group(&self) -> String {
        radio_group_name(&self.row_id)
    }

    /// Observer notified after each confirmed change
    pub fn set_observer(&self, observer: Weak<dyn ConvergenceObserver>) {
        *self.observer.lock() = Some(observer);
    }

    /// Working indicator slot, while editable
    #[must_use]
    pub fn working_slot(&self) -> Option<NodeId> {
        self.inner.lock().binding.and_then(|b| b.working)
    }

    /// Save-as-final button, lane rows only
    #[must_use]
    pub fn save_button(&self) -> Option<NodeId> {
        self.inner.lock().binding.and_then(|b| b.save)
    }

    /// Generation of the in-flight request, if any
    #[must_use]
    pub fn pending_generation(&self) -> Option<u64> {
        self.inner.lock().in_flight
    }

    /// Bind the control to its placeholder element
    ///
    /// Undefined and editable outcomes get live controls; a final outcome
    /// is left as rendered from the fetched payload.
    ///
    /// # Errors
    /// `DomError::Detached` if the placeholder has no parent cell.
    pub fn link_control(&self, control: NodeId) -> Result<(), QcError> {
        let mut inner = self.inner.lock();
        let mut doc = self.document.lock();
        let cell = doc.parent(control).ok_or(DomError::Detached(control))?;
        inner.binding = Some(Binding {
            control,
            cell,
            working: None,
            save: None,
        });
        match inner.outcome {
            None => self.render_active(&mut inner, &mut doc),
            Some(outcome) if outcome.is_editable() => {
                self.render_active(&mut inner, &mut doc);
                self.render(&mut inner, &mut doc, outcome);
            }
            Some(outcome) => {
                tracing::debug!("Row {} is final ({}), no active controls", self.row_id, outcome);
            }
        }
        tracing::debug!(row = %self.row_id, state = %inner.state(), "Control linked");
        Ok(())
    }

    /// Handle a radio selection made by the reviewer
    ///
    /// # Errors
    /// `ModelError::UnknownOutcome` for a value outside the vocabulary, and
    /// the errors of [`RowController::update_outcome`].
    pub async fn on_radio_change(&self, value: &str) -> Result<Transition, QcError> {
        let outcome: Outcome = value.parse()?;
        {
            let mut doc = self.document.lock();
            set_radio_group_value(&mut doc, &self.radio_group(), Some(value));
        }
        self.update_outcome(outcome).await
    }

    fn render_active(&self, inner: &mut ControlInner, doc: &mut Document) {
        let outcome = inner.outcome;
        let Some(binding) = inner.binding.as_mut() else {
            return;
        };
        doc.remove_children(binding.control);
        for editable in Outcome::EDITABLE {
            OutcomeRadio::new(&self.row_id, editable, outcome == Some(editable)).append_to(
                doc,
                binding.control,
                &self.config,
            );
        }
        doc.add_class(binding.cell, self.kind.format_class());
        doc.set_style(binding.cell, "text-align", "left");
        binding.save = match self.kind {
            RowKind::Lane => {
                let save = append_save_button(doc, binding.control, &self.config);
                doc.set_hidden(save, !outcome.is_some_and(|o| o.to_final().is_ok()));
                Some(save)
            }
            RowKind::Library => None,
        };
        binding.working = Some(append_working_slot(doc, binding.control, LANE_MQC_WORKING));
    }

    fn render(&self, inner: &mut ControlInner, doc: &mut Document, outcome: Outcome) {
        inner.outcome = Some(outcome);
        let Some(binding) = inner.binding.as_mut() else {
            return;
        };
        if outcome.is_final() {
            doc.remove_children(binding.control);
            doc.remove_class(binding.cell, self.kind.format_class());
            doc.set_style(binding.cell, "text-align", "center");
            display_outcome(doc, binding.cell, outcome);
            binding.working = None;
            binding.save = None;
            return;
        }
        display_outcome(doc, binding.cell, outcome);
        if let Some(save) = binding.save {
            doc.set_hidden(save, outcome == Outcome::Undecided);
        }
        set_radio_group_value(doc, &radio_group_name(&self.row_id), Some(outcome.as_str()));
    }

    fn error_line(&self, error: &QcError) -> String {
        let message = error.user_message();
        match (&self.config.lane_error_hint, self.kind) {
            (Some(hint), RowKind::Lane) if error.is_transport() => format!("{message} {hint}"),
            _ => message,
        }
    }

    fn notify_observer(&self) {
        let observer = self.observer.lock().as_ref().and_then(Weak::upgrade);
        if let Some(observer) = observer {
            observer.update_if_all_match();
        }
    }

    fn require_linked(&self, inner: &ControlInner) -> Result<(), QcError> {
        if inner.binding.is_none() {
            return Err(QcError::invalid_state(format!(
                "control for {} is not linked",
                self.row_id
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RowController for RowControl {
    fn row_id(&self) -> &str {
        &self.row_id
    }

    fn rpt_key(&self) -> &RptKey {
        &self.rpt_key
    }

    fn outcome(&self) -> Option<Outcome> {
        self.inner.lock().outcome
    }

    fn state(&self) -> ControlState {
        self.inner.lock().state()
    }

    fn generate_active_controls(&self) -> Result<(), QcError> {
        let mut inner = self.inner.lock();
        self.require_linked(&inner)?;
        let mut doc = self.document.lock();
        self.render_active(&mut inner, &mut doc);
        Ok(())
    }

    fn update_view(&self, outcome: Outcome) -> Result<(), QcError> {
        let mut inner = self.inner.lock();
        self.require_linked(&inner)?;
        let mut doc = self.document.lock();
        self.render(&mut inner, &mut doc, outcome);
        Ok(())
    }

    async fn update_outcome(&self, outcome: Outcome) -> Result<Transition, QcError> {
        let generation = {
            let mut inner = self.inner.lock();
            match inner.state() {
                ControlState::Unlinked => {
                    return Err(QcError::invalid_state(format!(
                        "control for {} is not linked",
                        self.row_id
                    )))
                }
                ControlState::Final(current) => {
                    return Err(QcError::invalid_state(format!(
                        "outcome for {} is already final ({current})",
                        self.rpt_key
                    )))
                }
                ControlState::LinkedUndefined | ControlState::Editable(_) => {}
            }
            if inner.outcome == Some(outcome) {
                return Ok(Transition::Unchanged);
            }
            inner.generation += 1;
            inner.in_flight = Some(inner.generation);
            if let Some(slot) = inner.binding.and_then(|b| b.working) {
                show_working(&mut self.document.lock(), slot, &self.config);
            }
            inner.generation
        };

        tracing::info!(rpt_key = %self.rpt_key, %outcome, generation, "Requesting QC outcome update");
        let query = build_update_query(
            self.kind.category(),
            &[OutcomeChange::new(self.rpt_key.to_string(), outcome)],
        );
        let result = self.service.post_json(&query).await;

        {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                tracing::debug!(
                    rpt_key = %self.rpt_key,
                    generation,
                    current = inner.generation,
                    "Discarding superseded QC outcome response"
                );
                return Ok(Transition::Superseded);
            }
            inner.in_flight = None;
            let mut doc = self.document.lock();
            if let Some(slot) = inner.binding.and_then(|b| b.working) {
                clear_working(&mut doc, slot);
            }
            if let Err(e) = result {
                let error = QcError::from(e);
                let previous = inner.outcome;
                set_radio_group_value(
                    &mut doc,
                    &self.radio_group(),
                    previous.as_ref().map(Outcome::as_str),
                );
                if let Some(previous) = previous {
                    self.render(&mut inner, &mut doc, previous);
                }
                tracing::warn!(rpt_key = %self.rpt_key, "QC outcome update failed: {}", error);
                self.status.display_error(&mut doc, &self.error_line(&error));
                return Err(error);
            }
            self.status.remove_error_messages(&mut doc);
            self.render(&mut inner, &mut doc, outcome);
        }

        tracing::info!(rpt_key = %self.rpt_key, %outcome, "QC outcome updated");
        self.notify_observer();
        Ok(Transition::Applied(outcome))
    }

    async fn save_as_final_outcome(&self) -> Result<Transition, QcError> {
        let current = match self.state() {
            ControlState::Editable(current) => current,
            other => {
                return Err(QcError::invalid_state(format!(
                    "cannot save {other} outcome of {} as final",
                    self.rpt_key
                )))
            }
        };
        let target = current.to_final()?;
        self.update_outcome(target).await
    }

    fn refresh_view(&self) {
        let mut inner = self.inner.lock();
        if inner.binding.is_none() {
            return;
        }
        let mut doc = self.document.lock();
        match inner.outcome {
            Some(outcome) => self.render(&mut inner, &mut doc, outcome),
            None => set_radio_group_value(&mut doc, &self.radio_group(), None),
        }
    }

    fn supersede(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if inner.in_flight.take().is_some() {
            tracing::debug!(rpt_key = %self.rpt_key, "In-flight QC outcome request superseded");
            if let Some(slot) = inner.binding.and_then(|b| b.working) {
                clear_working(&mut self.document.lock(), slot);
            }
        }
        inner.generation
    }

    fn apply_confirmed(&self, generation: u64, outcome: Outcome) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.binding.is_none() {
            return false;
        }
        let mut doc = self.document.lock();
        self.render(&mut inner, &mut doc, outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::MockOutcomesService;
    use seqqc_dom::widgets::{radio_group_value, LANE_MQC_CONTROL};
    use seqqc_dom::{displayed_outcome, shared};
    use seqqc_model::ModelError;
    use serde_json::{json, Value};

    const ROW: &str = "rpt_key:18245:1";

    fn page() -> (SharedDocument, NodeId) {
        let mut doc = Document::new();
        let table = doc.append_element(doc.root(), "table");
        doc.set_id(table, "results_summary");
        let row = doc.append_element(table, "tr");
        doc.set_id(row, ROW);
        let cell = doc.append_element(row, "td");
        doc.add_class(cell, "lane");
        let control = doc.append_element(cell, "span");
        doc.add_class(control, LANE_MQC_CONTROL);
        (shared(doc), control)
    }

    fn control_with(service: MockOutcomesService, outcome: Option<Outcome>) -> (RowControl, SharedDocument) {
        let (document, placeholder) = page();
        let control = RowControl::new(
            RowKind::Lane,
            ROW,
            document.clone(),
            Arc::new(service),
            Arc::new(QcConfig::default()),
        )
        .unwrap()
        .with_outcome(outcome);
        control.link_control(placeholder).unwrap();
        (control, document)
    }

    fn cell(document: &SharedDocument) -> NodeId {
        let doc = document.lock();
        doc.find_by_class(doc.root(), "lane")[0]
    }

    #[test]
    fn rejects_non_rpt_key_rows() {
        let (document, _) = page();
        let err = RowControl::new(
            RowKind::Lane,
            "row_1",
            document,
            Arc::new(MockOutcomesService::new()),
            Arc::new(QcConfig::default()),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn linking_undefined_shows_radios_without_style() {
        let (control, document) = control_with(MockOutcomesService::new(), None);
        assert_eq!(control.state(), ControlState::LinkedUndefined);
        let cell = cell(&document);
        let doc = document.lock();
        assert_eq!(radio_group_value(&doc, &control.radio_group()), None);
        assert!(doc.is_hidden(control.save_button().unwrap()));
        assert_eq!(displayed_outcome(&doc, cell), None);
    }

    #[test]
    fn linking_preliminary_applies_style() {
        let (control, document) = control_with(MockOutcomesService::new(), Some(Outcome::AcceptedPreliminary));
        assert_eq!(control.state(), ControlState::Editable(Outcome::AcceptedPreliminary));
        let cell = cell(&document);
        let doc = document.lock();
        assert_eq!(
            radio_group_value(&doc, &control.radio_group()).as_deref(),
            Some("Accepted preliminary")
        );
        assert!(!doc.is_hidden(control.save_button().unwrap()));
        assert_eq!(displayed_outcome(&doc, cell), Some(Outcome::AcceptedPreliminary));
    }

    #[test]
    fn linking_final_renders_nothing() {
        let (control, document) = control_with(MockOutcomesService::new(), Some(Outcome::RejectedFinal));
        assert_eq!(control.state(), ControlState::Final(Outcome::RejectedFinal));
        assert!(control.working_slot().is_none());
        let doc = document.lock();
        assert!(doc.find_by_class(doc.root(), "lane_mqc_save").is_empty());
    }

    #[tokio::test]
    async fn same_outcome_sends_nothing() {
        let mut service = MockOutcomesService::new();
        service.expect_post_json().times(0);
        let (control, _) = control_with(service, Some(Outcome::Undecided));
        assert_eq!(control.update_outcome(Outcome::Undecided).await.unwrap(), Transition::Unchanged);
    }

    #[tokio::test]
    async fn successful_update_repaints() {
        let mut service = MockOutcomesService::new();
        service
            .expect_post_json()
            .withf(|body: &Value| {
                *body
                    == json!({
                        "seq": { "18245:1": { "mqc_outcome": "Rejected preliminary" } },
                        "Action": "UPDATE"
                    })
            })
            .times(1)
            .returning(|_| Ok(Value::Null));
        let (control, document) = control_with(service, Some(Outcome::Undecided));

        let transition = control.on_radio_change("Rejected preliminary").await.unwrap();
        assert_eq!(transition, Transition::Applied(Outcome::RejectedPreliminary));
        assert_eq!(control.outcome(), Some(Outcome::RejectedPreliminary));
        let cell = cell(&document);
        assert_eq!(
            displayed_outcome(&document.lock(), cell),
            Some(Outcome::RejectedPreliminary)
        );
        assert!(!document.lock().is_hidden(control.save_button().unwrap()));
        assert_eq!(control.pending_generation(), None);
    }

    #[tokio::test]
    async fn failed_update_rolls_back() {
        let mut service = MockOutcomesService::new();
        service
            .expect_post_json()
            .times(1)
            .returning(|_| Err(TransportError::status(500, "Cannot update")));
        let (control, document) = control_with(service, Some(Outcome::AcceptedPreliminary));

        let err = control.on_radio_change("Undecided").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(control.outcome(), Some(Outcome::AcceptedPreliminary));
        let doc = document.lock();
        assert_eq!(
            radio_group_value(&doc, &control.radio_group()).as_deref(),
            Some("Accepted preliminary")
        );
        assert!(!seqqc_dom::widgets::is_working(&doc, control.working_slot().unwrap()));
        assert_eq!(StatusRegion::default().error_lines(&doc), vec!["Cannot update".to_string()]);
    }

    #[tokio::test]
    async fn lane_hint_is_appended_to_transport_errors() {
        let mut service = MockOutcomesService::new();
        service
            .expect_post_json()
            .returning(|_| Err(TransportError::Network("connection refused".into())));
        let (document, placeholder) = page();
        let control = RowControl::new(
            RowKind::Lane,
            ROW,
            document.clone(),
            Arc::new(service),
            Arc::new(QcConfig::default().with_lane_error_hint("Please contact qc-admins.")),
        )
        .unwrap();
        control.link_control(placeholder).unwrap();
        control.update_outcome(Outcome::AcceptedPreliminary).await.unwrap_err();
        assert_eq!(
            StatusRegion::default().error_lines(&document.lock()),
            vec!["connection refused Please contact qc-admins.".to_string()]
        );
        assert_eq!(radio_group_value(&document.lock(), &control.radio_group()), None);
    }

    #[tokio::test]
    async fn save_as_final_from_undecided_is_invalid() {
        let mut service = MockOutcomesService::new();
        service.expect_post_json().times(0);
        let (control, _) = control_with(service, Some(Outcome::Undecided));
        let err = control.save_as_final_outcome().await.unwrap_err();
        assert!(matches!(err, QcError::Model(ModelError::InvalidState(_))));
        assert_eq!(control.outcome(), Some(Outcome::Undecided));
    }

    #[tokio::test]
    async fn save_as_final_makes_row_inert() {
        let mut service = MockOutcomesService::new();
        service.expect_post_json().times(1).returning(|_| Ok(json!({})));
        let (control, document) = control_with(service, Some(Outcome::AcceptedPreliminary));

        let transition = control.save_as_final_outcome().await.unwrap();
        assert_eq!(transition, Transition::Applied(Outcome::AcceptedFinal));
        assert_eq!(control.state(), ControlState::Final(Outcome::AcceptedFinal));
        let cell = cell(&document);
        let doc = document.lock();
        assert_eq!(displayed_outcome(&doc, cell), Some(Outcome::AcceptedFinal));
        assert!(!doc.has_class(cell, TD_MQC));
        assert!(doc.find_by_class(doc.root(), "lane_mqc_save").is_empty());
        drop(doc);

        let err = control.update_outcome(Outcome::Undecided).await.unwrap_err();
        assert!(matches!(err, QcError::Model(ModelError::InvalidState(_))));
    }

    #[tokio::test]
    async fn unlinked_control_cannot_update() {
        let (document, _) = page();
        let control = RowControl::new(
            RowKind::Library,
            ROW,
            document,
            Arc::new(MockOutcomesService::new()),
            Arc::new(QcConfig::default()),
        )
        .unwrap();
        assert_eq!(control.state(), ControlState::Unlinked);
        assert!(control.update_outcome(Outcome::Undecided).await.is_err());
        assert!(control.update_view(Outcome::Undecided).is_err());
    }

    #[test]
    fn superseded_generation_is_not_applied() {
        let (control, _) = control_with(MockOutcomesService::new(), Some(Outcome::Undecided));
        let generation = control.supersede();
        assert!(!control.apply_confirmed(generation - 1, Outcome::RejectedPreliminary));
        assert!(control.apply_confirmed(generation, Outcome::AcceptedPreliminary));
        assert_eq!(control.outcome(), Some(Outcome::AcceptedPreliminary));
    }
}
