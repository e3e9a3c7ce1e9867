//! Outcome fetch/render pipeline
//!
//! Discovers the rpt keys rendered in the summary table, fetches their
//! outcomes in one batched request and paints the matching cells.
//!
//! Manual QC outcomes of lanes match fuzzily: every row whose id is
//! `rpt_key:<lane>` or extends it with further `:`-separated segments is
//! painted, so plex rows follow their lane while lane 10 stays clear of a
//! lane 1 outcome. Library
//! outcomes and utility outcomes match the exact row only. Rows missing
//! from the page are tolerated and reported with a count of 0.

use crate::error::QcError;
use crate::transport::OutcomesService;
use indexmap::IndexMap;
use seqqc_dom::style::checked_style_class;
use seqqc_dom::{display_elements_as, utility_display_switch, Document, NodeId, SharedDocument, StatusRegion};
use seqqc_model::rpt_key::escape_id;
use seqqc_model::{
    build_query, is_lane_key, rpt_key_from_id, Category, ModelError, OutcomeField, OutcomeMap,
    OutcomesPayload, QcConfig, UtilityOutcome, ID_PREFIX,
};
use std::sync::Arc;

/// Number of cells painted per rpt key, 0 when the row is absent
pub type ExistenceMap = IndexMap<String, usize>;

/// Table cell carrying an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    /// Lane number cell
    Lane,
    /// Library (tag) cell
    TagInfo,
}

impl CellClass {
    /// CSS class of the cell
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            CellClass::Lane => "lane",
            CellClass::TagInfo => "tag_info",
        }
    }

    /// Cell showing a key's utility outcome
    #[must_use]
    pub fn for_key(key: &str) -> Self {
        if is_lane_key(key) {
            CellClass::Lane
        } else {
            CellClass::TagInfo
        }
    }
}

/// How a rpt key is matched against row ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Row id is `rpt_key:<key>` or starts with `rpt_key:<key>:`
    Fuzzy,
    /// Row id is `rpt_key:<key>`
    Exact,
}

/// Selector for the cells of a rpt key
#[must_use]
pub fn cell_selector(key: &str, cell: CellClass, matching: Matching) -> String {
    let row = match matching {
        Matching::Fuzzy => format!("tr[id^=\"{ID_PREFIX}{key}\"]"),
        Matching::Exact => format!("#{}", escape_id(&format!("{ID_PREFIX}{key}"))),
    };
    format!("{row} td.{}", cell.class())
}

/// Cells of a rpt key
///
/// # Errors
/// `QcError::Dom` if the key produces an unparsable selector.
pub fn find_cells(
    doc: &Document,
    key: &str,
    cell: CellClass,
    matching: Matching,
) -> Result<Vec<NodeId>, QcError> {
    let cells = doc.query(&cell_selector(key, cell, matching))?;
    if matching == Matching::Exact {
        return Ok(cells);
    }
    let row_id = format!("{ID_PREFIX}{key}");
    Ok(cells
        .into_iter()
        .filter(|c| {
            doc.closest(*c, "tr")
                .and_then(|row| doc.id(row))
                .and_then(|id| id.strip_prefix(row_id.as_str()))
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
        })
        .collect())
}

/// Per-category existence maps of one display update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayReport {
    /// Library outcomes
    pub lib: ExistenceMap,
    /// Lane outcomes
    pub seq: ExistenceMap,
    /// Utility outcomes
    pub uqc: ExistenceMap,
}

/// Unique rpt keys of the rows of `table_id`, in first-seen order
#[must_use]
pub fn parse_rpt_keys(doc: &Document, table_id: &str) -> Vec<String> {
    let Some(table) = doc.get_element_by_id(table_id) else {
        tracing::debug!("No table '{}' in page", table_id);
        return Vec::new();
    };
    let mut keys: Vec<String> = Vec::new();
    for row in doc.descendants(table) {
        if doc.tag(row) != "tr" {
            continue;
        }
        let Some(id) = doc.id(row).filter(|id| id.starts_with(ID_PREFIX)) else {
            continue;
        };
        match rpt_key_from_id(id) {
            Ok(key) => {
                let key = key.to_string();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            Err(e) => tracing::warn!("Skipping row: {}", e),
        }
    }
    keys
}

fn validate_outcomes(outcomes: &OutcomeMap, field: OutcomeField) -> Result<(), QcError> {
    for (key, record) in outcomes {
        let value = record
            .outcome_value(field)
            .ok_or_else(|| ModelError::MalformedData(key.clone()))?;
        match field {
            OutcomeField::Mqc => {
                checked_style_class(value)?;
            }
            OutcomeField::Uqc => {
                value.parse::<UtilityOutcome>()?;
            }
        }
    }
    Ok(())
}

/// Paint one category's outcomes onto `cell` cells
///
/// Every record is validated before any cell changes.
///
/// # Errors
/// `ModelError::MalformedData` for a record without the outcome field,
/// `ModelError::UnknownOutcome` or `ModelError::Argument` for values with no
/// display mapping.
pub fn process_outcomes(
    doc: &mut Document,
    outcomes: &OutcomeMap,
    field: OutcomeField,
    cell: CellClass,
) -> Result<ExistenceMap, QcError> {
    validate_outcomes(outcomes, field)?;
    apply_outcomes(doc, outcomes, field, Some(cell))
}

fn apply_outcomes(
    doc: &mut Document,
    outcomes: &OutcomeMap,
    field: OutcomeField,
    cell: Option<CellClass>,
) -> Result<ExistenceMap, QcError> {
    let mut found = ExistenceMap::new();
    for (key, record) in outcomes {
        let Some(value) = record.outcome_value(field) else {
            return Err(ModelError::MalformedData(key.clone()).into());
        };
        let cell = cell.unwrap_or_else(|| CellClass::for_key(key));
        let matching = match (field, cell) {
            (OutcomeField::Mqc, CellClass::Lane) => Matching::Fuzzy,
            _ => Matching::Exact,
        };
        let cells = find_cells(doc, key, cell, matching)?;
        match field {
            OutcomeField::Mqc => display_elements_as(doc, &cells, value)?,
            OutcomeField::Uqc => {
                for node in &cells {
                    utility_display_switch(doc, *node, value)?;
                }
            }
        }
        if cells.is_empty() {
            tracing::debug!("No cells for rpt key {}", key);
        }
        found.insert(key.clone(), cells.len());
    }
    Ok(found)
}

/// Paint a fetched payload: libraries, then lanes, then utility outcomes
///
/// The whole payload is validated first, so a malformed record leaves the
/// page untouched.
///
/// # Errors
/// See [`process_outcomes`].
pub fn update_display_with_qc_outcomes(
    doc: &mut Document,
    payload: &OutcomesPayload,
) -> Result<DisplayReport, QcError> {
    validate_outcomes(&payload.lib, Category::Lib.outcome_field())?;
    validate_outcomes(&payload.seq, Category::Seq.outcome_field())?;
    validate_outcomes(&payload.uqc, Category::Uqc.outcome_field())?;

    Ok(DisplayReport {
        lib: apply_outcomes(doc, &payload.lib, OutcomeField::Mqc, Some(CellClass::TagInfo))?,
        seq: apply_outcomes(doc, &payload.seq, OutcomeField::Mqc, Some(CellClass::Lane))?,
        uqc: apply_outcomes(doc, &payload.uqc, OutcomeField::Uqc, None)?,
    })
}

/// Fetch/render pipeline bound to one page
pub struct OutcomesView {
    document: SharedDocument,
    service: Arc<dyn OutcomesService>,
    table_id: String,
    status: StatusRegion,
}

impl OutcomesView {
    /// Pipeline for the configured summary table
    pub fn new(document: SharedDocument, service: Arc<dyn OutcomesService>, config: &QcConfig) -> Self {
        Self {
            document,
            service,
            table_id: config.summary_table_id.clone(),
            status: StatusRegion::new(config.status_region_id.clone()),
        }
    }

    /// Rpt keys currently rendered in the summary table
    #[must_use]
    pub fn rpt_keys(&self) -> Vec<String> {
        parse_rpt_keys(&self.document.lock(), &self.table_id)
    }

    /// Fetch and paint outcomes, propagating errors
    ///
    /// Returns `None` without any request when the table has no keys.
    ///
    /// # Errors
    /// Transport errors, undecodable payloads and display errors.
    pub async fn try_fetch_and_process(&self) -> Result<Option<OutcomesPayload>, QcError> {
        let keys = self.rpt_keys();
        if keys.is_empty() {
            tracing::debug!("No rpt keys in '{}', nothing to fetch", self.table_id);
            return Ok(None);
        }
        tracing::info!("Fetching QC outcomes for {} rpt keys", keys.len());
        let reply = self.service.post_json(&build_query(&keys)).await?;
        let payload = OutcomesPayload::from_value(reply)?;

        let report = {
            let mut doc = self.document.lock();
            update_display_with_qc_outcomes(&mut doc, &payload)?
        };
        tracing::debug!(
            lib = report.lib.len(),
            seq = report.seq.len(),
            uqc = report.uqc.len(),
            "QC outcomes displayed"
        );
        Ok(Some(payload))
    }

    /// Fetch and paint outcomes, then hand the payload to `on_success`
    ///
    /// Failures are shown in the status region and `on_success` is not
    /// called.
    pub async fn fetch_and_process_qc<F>(&self, on_success: F) -> Option<OutcomesPayload>
    where
        F: FnOnce(&OutcomesPayload),
    {
        match self.try_fetch_and_process().await {
            Ok(Some(payload)) => {
                on_success(&payload);
                Some(payload)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("Fetching QC outcomes failed: {}", e);
                self.status.display_error(&mut self.document.lock(), &e.user_message());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::MockOutcomesService;
    use pretty_assertions::assert_eq;
    use seqqc_dom::{displayed_outcome, shared};
    use seqqc_model::Outcome;
    use serde_json::json;

    fn page(keys: &[&str]) -> Document {
        let mut doc = Document::new();
        let table = doc.append_element(doc.root(), "table");
        doc.set_id(table, "results_summary");
        for key in keys {
            let row = doc.append_element(table, "tr");
            doc.set_id(row, format!("rpt_key:{key}"));
            let lane = doc.append_element(row, "td");
            doc.add_class(lane, "lane");
            let tag = doc.append_element(row, "td");
            doc.add_class(tag, "tag_info");
        }
        doc
    }

    #[test]
    fn keys_are_unique_and_ordered() {
        let mut doc = page(&["2:1", "1:1", "2:1", "1:1:3"]);
        let stray = doc.append_element(doc.root(), "tr");
        doc.set_id(stray, "rpt_key:9:9");
        assert_eq!(parse_rpt_keys(&doc, "results_summary"), vec!["2:1", "1:1", "1:1:3"]);
        assert!(parse_rpt_keys(&doc, "missing").is_empty());
    }

    #[test]
    fn selectors() {
        assert_eq!(
            cell_selector("18245:1", CellClass::Lane, Matching::Fuzzy),
            r#"tr[id^="rpt_key:18245:1"] td.lane"#
        );
        assert_eq!(
            cell_selector("18245:1:1", CellClass::TagInfo, Matching::Exact),
            r"#rpt_key\3A 18245\3A 1\3A 1 td.tag_info"
        );
    }

    #[test]
    fn fuzzy_match_stops_at_segment_boundary() {
        let doc = page(&["1:1", "1:1:1", "1:10", "1:10:1", "11:1"]);
        let rows: Vec<&str> = find_cells(&doc, "1:1", CellClass::Lane, Matching::Fuzzy)
            .unwrap()
            .into_iter()
            .filter_map(|c| doc.closest(c, "tr").and_then(|r| doc.id(r)))
            .collect();
        assert_eq!(rows, vec!["rpt_key:1:1", "rpt_key:1:1:1"]);
        assert_eq!(
            find_cells(&doc, "1:10", CellClass::Lane, Matching::Fuzzy).unwrap().len(),
            2
        );
    }

    #[test]
    fn missing_field_is_malformed_and_nothing_changes() {
        let mut doc = page(&["1:1", "1:1:1"]);
        let payload = OutcomesPayload::from_value(json!({
            "seq": { "1:1": { "mqc_outcome": "Accepted final" } },
            "uqc": { "1:1:1": {} }
        }))
        .unwrap();
        let err = update_display_with_qc_outcomes(&mut doc, &payload).unwrap_err();
        assert_eq!(err.to_string(), "Malformed QC outcomes data for 1:1:1");
        let lanes = doc.find_by_class(doc.root(), "lane");
        assert!(lanes.iter().all(|l| displayed_outcome(&doc, *l).is_none()));
    }

    #[test]
    fn library_outcomes_match_exactly() {
        let mut doc = page(&["1:1", "1:1:1", "1:1:10"]);
        let payload = OutcomesPayload::from_value(json!({
            "lib": { "1:1:1": { "mqc_outcome": "Rejected preliminary" }, "5:1:1": { "mqc_outcome": "Undecided" } }
        }))
        .unwrap();
        let report = update_display_with_qc_outcomes(&mut doc, &payload).unwrap();
        assert_eq!(report.lib["1:1:1"], 1);
        assert_eq!(report.lib["5:1:1"], 0);
        let tags = doc.find_by_class(doc.root(), "tag_info");
        assert_eq!(displayed_outcome(&doc, tags[1]), Some(Outcome::RejectedPreliminary));
        assert_eq!(displayed_outcome(&doc, tags[2]), None);
    }

    #[tokio::test]
    async fn no_keys_means_no_request() {
        let mut service = MockOutcomesService::new();
        service.expect_post_json().times(0);
        let view = OutcomesView::new(shared(page(&[])), Arc::new(service), &QcConfig::default());
        let mut called = false;
        assert!(view.fetch_and_process_qc(|_| called = true).await.is_none());
        assert!(!called);
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let mut service = MockOutcomesService::new();
        service
            .expect_post_json()
            .times(1)
            .returning(|_| Err(TransportError::status(500, "500 Internal Server Error")));
        let document = shared(page(&["1:1"]));
        let view = OutcomesView::new(document.clone(), Arc::new(service), &QcConfig::default());
        let mut called = false;
        assert!(view.fetch_and_process_qc(|_| called = true).await.is_none());
        assert!(!called);
        let lines = StatusRegion::default().error_lines(&document.lock());
        assert_eq!(lines, vec!["500 Internal Server Error".to_string()]);
    }
}
