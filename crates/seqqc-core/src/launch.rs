//! Manual and utility QC launchers
//!
//! [`ManualQcSession::launch`] turns every `.lane_mqc_control` placeholder
//! of an eligible page into a live [`RowControl`], wiring the bulk control
//! on library pages. Reviewer actions arrive as [`UiEvent`]s.

use crate::bulk::{BulkAction, BulkControl};
use crate::control::{ConvergenceObserver, RowControl, RowController, RowKind, Transition};
use crate::error::QcError;
use crate::registry::ControlRegistry;
use crate::transport::OutcomesService;
use crate::view::CellClass;
use seqqc_dom::widgets::LANE_MQC_CONTROL;
use seqqc_dom::{remove_previous_qc_outcome_styles, Document, NodeId, SharedDocument, StatusRegion};
use seqqc_model::{
    rpt_key_from_id, Category, ModelError, Outcome, OutcomeField, OutcomesPayload, QcConfig,
    UtilityOutcome,
};
use std::sync::Arc;

/// Placeholder for library utility QC controls
pub const LIBRARY_UQC_CONTROL: &str = "library_uqc_control";

/// Placeholder for page-wide utility QC controls on library pages
pub const LIBRARY_UQC_OVERALL: &str = "library_uqc_overall_controls";

/// Class of the link that starts utility QC annotation
pub const UQC_ANNOTATION_LINK: &str = "uqcClickable";

/// Reviewer action on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A radio of `group` was selected
    RadioChanged {
        /// Radio group name, `radios_<rowId>`
        group: String,
        /// Selected outcome
        value: String,
    },
    /// The save-as-final button of a lane row was clicked
    SaveClicked {
        /// Row id
        row_id: String,
    },
    /// A bulk button was clicked
    BulkClicked(BulkAction),
}

struct Placeholder {
    node: NodeId,
    row_id: String,
    outcome: Option<Outcome>,
}

/// Live manual QC controls of one page
pub struct ManualQcSession {
    document: SharedDocument,
    status: StatusRegion,
    is_run_page: bool,
    registry: ControlRegistry,
    bulk: Option<Arc<BulkControl>>,
}

impl std::fmt::Debug for ManualQcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualQcSession")
            .field("is_run_page", &self.is_run_page)
            .field("controls", &self.registry.len())
            .field("bulk", &self.bulk.is_some())
            .finish_non_exhaustive()
    }
}

impl ManualQcSession {
    /// Launch manual QC over a painted page
    ///
    /// Lane rows take their outcomes from `seq` on run pages; library rows
    /// take them from `lib` on lane pages. Returns `None` on a lane page
    /// whose lane outcome is already final.
    ///
    /// # Errors
    /// `DomError::MissingElement` when a lane page lacks the bulk
    /// placeholder; `ModelError` for outcome values outside the vocabulary.
    pub fn launch(
        is_run_page: bool,
        payload: &OutcomesPayload,
        document: SharedDocument,
        service: Arc<dyn OutcomesService>,
        config: Arc<QcConfig>,
    ) -> Result<Option<Self>, QcError> {
        let kind = RowKind::for_page(is_run_page);
        let outcomes = payload.category(kind.category());

        let bulk = if is_run_page {
            None
        } else {
            {
                let mut doc = document.lock();
                for lane in doc.find_by_class(doc.root(), CellClass::Lane.class()) {
                    doc.set_style(lane, "background-color", "");
                    remove_previous_qc_outcome_styles(&mut doc, lane);
                }
            }
            if payload.any_lane_final() {
                tracing::info!("Lane outcome is final, manual QC not launched");
                return Ok(None);
            }
            let bulk = Arc::new(BulkControl::new(document.clone(), service.clone(), config.clone()));
            bulk.setup_controls()?;
            bulk.init();
            Some(bulk)
        };

        let placeholders = {
            let mut doc = document.lock();
            let mut placeholders = Vec::new();
            for node in doc.find_by_class(doc.root(), LANE_MQC_CONTROL) {
                let Some(row) = doc.closest(node, "tr") else {
                    continue;
                };
                let Some(row_id) = doc.id(row).map(str::to_string) else {
                    continue;
                };
                let outcome = match rpt_key_from_id(&row_id) {
                    Ok(key) => match outcomes.get(&key.to_string()) {
                        Some(record) => record.manual_outcome()?,
                        None => None,
                    },
                    Err(e) => {
                        tracing::warn!("Skipping QC control: {}", e);
                        continue;
                    }
                };
                if !outcome.is_some_and(|o| o.is_final()) {
                    clear_row_styles(&mut doc, row);
                }
                doc.set_style(node, "padding-right", "5px");
                doc.set_style(node, "padding-left", "10px");
                placeholders.push(Placeholder {
                    node,
                    row_id,
                    outcome,
                });
            }
            placeholders
        };

        let mut registry = ControlRegistry::new();
        for placeholder in placeholders {
            let control = RowControl::new(
                kind,
                &placeholder.row_id,
                document.clone(),
                service.clone(),
                config.clone(),
            )?
            .with_outcome(placeholder.outcome);
            control.link_control(placeholder.node)?;
            registry.insert(Arc::new(control));
        }

        if let Some(bulk) = &bulk {
            let observer: Arc<dyn ConvergenceObserver> = bulk.clone();
            for control in registry.iter() {
                control.set_observer(Arc::downgrade(&observer));
            }
            bulk.set_rows(registry.controllers());
            bulk.update_if_all_match();
        }

        tracing::info!(
            controls = registry.len(),
            run_page = is_run_page,
            "Manual QC launched"
        );
        Ok(Some(Self {
            document,
            status: StatusRegion::new(config.status_region_id.clone()),
            is_run_page,
            registry,
            bulk,
        }))
    }

    /// Controls in page order
    #[must_use]
    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    /// Bulk control, library pages only
    #[must_use]
    pub fn bulk(&self) -> Option<&Arc<BulkControl>> {
        self.bulk.as_ref()
    }

    /// Check if the session controls lanes
    #[inline]
    #[must_use]
    pub fn is_run_page(&self) -> bool {
        self.is_run_page
    }

    /// Route a reviewer action to its control
    ///
    /// Errors that the control did not already show (unknown targets,
    /// invalid transitions) are shown in the status region.
    ///
    /// # Errors
    /// The error of the routed operation.
    pub async fn dispatch(&self, event: UiEvent) -> Result<Transition, QcError> {
        tracing::debug!(?event, "Dispatching UI event");
        let result = match &event {
            UiEvent::RadioChanged { group, value } => match self.registry.by_radio_group(group) {
                Some(control) => control.on_radio_change(value).await,
                None => Err(ModelError::argument(format!("no QC control for radio group {group}")).into()),
            },
            UiEvent::SaveClicked { row_id } => match self.registry.get(row_id) {
                Some(control) => control.save_as_final_outcome().await,
                None => Err(ModelError::argument(format!("no QC control for row {row_id}")).into()),
            },
            UiEvent::BulkClicked(action) => match &self.bulk {
                Some(bulk) => bulk.click(*action).await,
                None => Err(QcError::invalid_state("bulk QC controls exist on library pages only")),
            },
        };
        if let Err(e) = &result {
            if !e.is_transport() {
                self.status
                    .display_error(&mut self.document.lock(), &e.user_message());
            }
        }
        result
    }
}

fn clear_row_styles(doc: &mut Document, row: NodeId) {
    let cells: Vec<NodeId> = doc
        .descendants(row)
        .into_iter()
        .filter(|c| doc.has_class(*c, CellClass::Lane.class()) || doc.has_class(*c, CellClass::TagInfo.class()))
        .collect();
    for cell in cells {
        doc.set_style(cell, "background-color", "");
        remove_previous_qc_outcome_styles(doc, cell);
    }
}

/// Mark every QC placeholder with its utility outcome colour
///
/// Lane rows colour their `.lane_mqc_control`; library rows get a
/// `span.library_uqc_control` in their `tag_info` cell, placed before the
/// first line break. A library page also gets one
/// `span.library_uqc_overall_controls` in the first lane cell. Returns the
/// number of marked elements.
///
/// # Errors
/// `ModelError::Argument` for a utility value outside the vocabulary.
pub fn launch_utility_qc(
    doc: &mut Document,
    payload: &OutcomesPayload,
    is_run_page: bool,
    config: &QcConfig,
) -> Result<usize, QcError> {
    let outcomes = payload.category(Category::Uqc);
    if !is_run_page {
        let first_lane = doc
            .get_element_by_id(&config.summary_table_id)
            .and_then(|table| doc.find_by_class(table, CellClass::Lane.class()).first().copied());
        if let Some(lane) = first_lane {
            let overall = doc.append_element(lane, "span");
            doc.add_class(overall, LIBRARY_UQC_OVERALL);
        }
    }

    let mut marked = 0;
    for control in doc.find_by_class(doc.root(), LANE_MQC_CONTROL) {
        let Some(row) = doc.closest(control, "tr") else {
            continue;
        };
        let Some(key) = doc.id(row).and_then(|id| rpt_key_from_id(id).ok()) else {
            continue;
        };
        let outcome = outcomes
            .get(&key.to_string())
            .and_then(|r| r.outcome_value(OutcomeField::Uqc))
            .map(str::parse::<UtilityOutcome>)
            .transpose()?;

        let target = if key.is_lane() {
            control
        } else {
            let Some(tag_info) = doc
                .children(row)
                .iter()
                .copied()
                .find(|c| doc.has_class(*c, CellClass::TagInfo.class()))
            else {
                tracing::debug!("Library row {} has no tag_info cell", key);
                continue;
            };
            library_uqc_slot(doc, tag_info)
        };
        doc.set_style(target, "padding-right", "5px");
        doc.set_style(target, "padding-left", "10px");
        doc.set_style(target, "background-color", UtilityOutcome::mark_colour(outcome));
        marked += 1;
    }
    tracing::info!(marked, "Utility QC launched");
    Ok(marked)
}

fn library_uqc_slot(doc: &mut Document, tag_info: NodeId) -> NodeId {
    let slot = doc.create_element("span");
    doc.add_class(slot, LIBRARY_UQC_CONTROL);
    let line_break = doc
        .children(tag_info)
        .iter()
        .copied()
        .find(|c| doc.tag(*c) == "br");
    match line_break {
        Some(br) if doc.insert_before(br, slot).is_ok() => {}
        _ => doc.append_child(tag_info, slot),
    }
    slot
}

/// Add the link that starts utility QC annotation to the page menu
///
/// Returns `None` when the page has no `#menu #links` container.
pub fn add_uqc_annotation_link(doc: &mut Document) -> Option<NodeId> {
    let links = doc.query("#menu #links").ok()?.first().copied()?;
    let link = doc.append_element(links, "span");
    doc.add_class(link, UQC_ANNOTATION_LINK);
    doc.set_text(link, "Prepare utility QC annotation");
    Some(link)
}
