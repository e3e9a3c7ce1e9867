//! Manual QC sessions: row transitions, response races and bulk updates

use pretty_assertions::assert_eq;
use seqqc_core::{
    BulkAction, ControlState, ManualQcSession, QcError, RowControl, RowController, Transition,
    TransportError, UiEvent,
};
use seqqc_dom::widgets::{radio_group_value, LANE_MQC_CONTROL};
use seqqc_dom::{displayed_outcome, StatusRegion};
use seqqc_model::{Outcome, OutcomesPayload, QcConfig};
use seqqc_test_utils::{cell, lane_page, payload, results_summary, ScriptedOutcomesService};
use serde_json::json;
use std::sync::Arc;

fn outcomes(seq: &[(&str, &str)], lib: &[(&str, &str)]) -> OutcomesPayload {
    OutcomesPayload::from_value(payload(seq, lib, &[])).unwrap()
}

fn launch(
    is_run_page: bool,
    document: &seqqc_dom::SharedDocument,
    service: &Arc<ScriptedOutcomesService>,
    payload: &OutcomesPayload,
) -> ManualQcSession {
    ManualQcSession::launch(
        is_run_page,
        payload,
        document.clone(),
        service.clone(),
        Arc::new(QcConfig::default()),
    )
    .unwrap()
    .unwrap()
}

fn control(session: &ManualQcSession, key: &str) -> Arc<RowControl> {
    session
        .registry()
        .get(&format!("rpt_key:{key}"))
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn run_page_controls_start_from_lane_outcomes() {
    let document = results_summary().with_rows(&["18245:1", "18245:2"]).shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(
        true,
        &document,
        &service,
        &outcomes(&[("18245:2", "Accepted preliminary")], &[]),
    );

    assert_eq!(session.registry().len(), 2);
    assert_eq!(control(&session, "18245:1").state(), ControlState::LinkedUndefined);
    assert_eq!(
        control(&session, "18245:2").state(),
        ControlState::Editable(Outcome::AcceptedPreliminary)
    );
    assert!(session.bulk().is_none());
    assert_eq!(service.request_count(), 0);
}

#[tokio::test]
async fn radio_change_then_save_as_final() {
    let document = results_summary().with_rows(&["18245:1"]).shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(true, &document, &service, &outcomes(&[], &[]));
    let lane = control(&session, "18245:1");

    let transition = session
        .dispatch(UiEvent::RadioChanged {
            group: lane.radio_group(),
            value: "Accepted preliminary".into(),
        })
        .await
        .unwrap();
    assert_eq!(transition, Transition::Applied(Outcome::AcceptedPreliminary));
    assert!(!document.lock().is_hidden(lane.save_button().unwrap()));

    let transition = session
        .dispatch(UiEvent::SaveClicked {
            row_id: "rpt_key:18245:1".into(),
        })
        .await
        .unwrap();
    assert_eq!(transition, Transition::Applied(Outcome::AcceptedFinal));
    assert_eq!(
        service.requests(),
        vec![
            json!({ "seq": { "18245:1": { "mqc_outcome": "Accepted preliminary" } }, "Action": "UPDATE" }),
            json!({ "seq": { "18245:1": { "mqc_outcome": "Accepted final" } }, "Action": "UPDATE" }),
        ]
    );

    let doc = document.lock();
    let lane_cell = cell(&doc, "18245:1", "lane");
    assert_eq!(displayed_outcome(&doc, lane_cell), Some(Outcome::AcceptedFinal));
    let placeholder = doc.children_with_class(lane_cell, LANE_MQC_CONTROL)[0];
    assert!(doc.children(placeholder).is_empty());
    assert_eq!(doc.style(lane_cell, "text-align"), Some("center"));
}

#[tokio::test]
async fn failed_update_restores_previous_outcome() {
    let document = results_summary().with_rows(&["18245:1"]).shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    service.fail(TransportError::status(400, "Cannot update outcome"));
    let session = launch(
        true,
        &document,
        &service,
        &outcomes(&[("18245:1", "Rejected preliminary")], &[]),
    );
    let lane = control(&session, "18245:1");

    let err = lane.on_radio_change("Undecided").await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(lane.outcome(), Some(Outcome::RejectedPreliminary));
    let doc = document.lock();
    assert_eq!(
        radio_group_value(&doc, &lane.radio_group()).as_deref(),
        Some("Rejected preliminary")
    );
    assert_eq!(
        displayed_outcome(&doc, cell(&doc, "18245:1", "lane")),
        Some(Outcome::RejectedPreliminary)
    );
    assert_eq!(
        StatusRegion::default().error_lines(&doc),
        vec!["Cannot update outcome".to_string()]
    );
}

#[tokio::test]
async fn stale_row_response_is_discarded() {
    let document = results_summary().with_rows(&["18245:1"]).shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(true, &document, &service, &outcomes(&[], &[]));
    let lane = control(&session, "18245:1");

    let first_reply = service.gate();
    let first = tokio::spawn({
        let lane = lane.clone();
        async move { lane.update_outcome(Outcome::AcceptedPreliminary).await }
    });
    service.wait_for_requests(1).await;
    assert!(lane.pending_generation().is_some());

    let second = lane.update_outcome(Outcome::RejectedPreliminary).await.unwrap();
    assert_eq!(second, Transition::Applied(Outcome::RejectedPreliminary));

    first_reply.send(Ok(json!({}))).unwrap();
    assert_eq!(first.await.unwrap().unwrap(), Transition::Superseded);
    assert_eq!(lane.outcome(), Some(Outcome::RejectedPreliminary));
    let doc = document.lock();
    assert_eq!(
        displayed_outcome(&doc, cell(&doc, "18245:1", "lane")),
        Some(Outcome::RejectedPreliminary)
    );
}

#[tokio::test]
async fn final_lane_blocks_library_qc() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = ManualQcSession::launch(
        false,
        &outcomes(&[("18245:1", "Rejected final")], &[]),
        document.clone(),
        service.clone(),
        Arc::new(QcConfig::default()),
    )
    .unwrap();
    assert!(session.is_none());
    let doc = document.lock();
    assert!(doc.find_by_class(doc.root(), "lane_mqc_accept_all").is_empty());
}

#[tokio::test]
async fn library_page_uses_library_outcomes_and_bulk() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(
        false,
        &document,
        &service,
        &outcomes(
            &[("18245:1", "Accepted preliminary")],
            &[("18245:1:1", "Rejected preliminary"), ("18245:1:2", "Rejected preliminary")],
        ),
    );

    assert_eq!(session.registry().len(), 2);
    assert!(session.registry().get("rpt_key:18245:1").is_none());
    let bulk = session.bulk().unwrap();
    assert_eq!(bulk.selected(), Some(BulkAction::RejectAll));
    let doc = document.lock();
    assert_eq!(displayed_outcome(&doc, cell(&doc, "18245:1", "lane")), None);
}

#[tokio::test]
async fn bulk_highlight_follows_row_changes() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(
        false,
        &document,
        &service,
        &outcomes(
            &[],
            &[("18245:1:1", "Accepted preliminary"), ("18245:1:2", "Accepted preliminary")],
        ),
    );
    let bulk = session.bulk().unwrap().clone();
    assert_eq!(bulk.selected(), Some(BulkAction::AcceptAll));

    let library = control(&session, "18245:1:2");
    library.update_outcome(Outcome::Undecided).await.unwrap();
    assert_eq!(bulk.selected(), None);
    assert!(BulkAction::ALL.iter().all(|a| bulk.is_clickable(*a)));

    library.update_outcome(Outcome::AcceptedPreliminary).await.unwrap();
    assert_eq!(bulk.selected(), Some(BulkAction::AcceptAll));
    assert_eq!(
        session
            .dispatch(UiEvent::BulkClicked(BulkAction::AcceptAll))
            .await
            .unwrap(),
        Transition::Unchanged
    );
    assert_eq!(service.request_count(), 2);
}

#[tokio::test]
async fn bulk_update_supersedes_in_flight_row_update() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(false, &document, &service, &outcomes(&[], &[]));
    let bulk = session.bulk().unwrap().clone();
    let library = control(&session, "18245:1:1");

    let row_reply = service.gate();
    let row_update = tokio::spawn({
        let library = library.clone();
        async move { library.update_outcome(Outcome::RejectedPreliminary).await }
    });
    service.wait_for_requests(1).await;

    let transition = bulk.click(BulkAction::AcceptAll).await.unwrap();
    assert_eq!(transition, Transition::Applied(Outcome::AcceptedPreliminary));
    assert_eq!(
        service.requests()[1],
        json!({
            "lib": {
                "18245:1:1": { "mqc_outcome": "Accepted preliminary" },
                "18245:1:2": { "mqc_outcome": "Accepted preliminary" }
            },
            "Action": "UPDATE"
        })
    );

    row_reply.send(Ok(json!({}))).unwrap();
    assert_eq!(row_update.await.unwrap().unwrap(), Transition::Superseded);
    for key in ["18245:1:1", "18245:1:2"] {
        assert_eq!(control(&session, key).outcome(), Some(Outcome::AcceptedPreliminary));
    }
    assert_eq!(bulk.selected(), Some(BulkAction::AcceptAll));
    let doc = document.lock();
    assert_eq!(
        radio_group_value(&doc, &library.radio_group()).as_deref(),
        Some("Accepted preliminary")
    );
}

#[tokio::test]
async fn row_update_during_pending_bulk_update_is_kept() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    let session = launch(false, &document, &service, &outcomes(&[], &[]));
    let bulk = session.bulk().unwrap().clone();
    let library = control(&session, "18245:1:1");

    let bulk_reply = service.gate();
    let bulk_update = tokio::spawn({
        let bulk = bulk.clone();
        async move { bulk.click(BulkAction::AcceptAll).await }
    });
    service.wait_for_requests(1).await;

    let transition = library.update_outcome(Outcome::RejectedPreliminary).await.unwrap();
    assert_eq!(transition, Transition::Applied(Outcome::RejectedPreliminary));

    bulk_reply.send(Ok(json!({}))).unwrap();
    assert_eq!(
        bulk_update.await.unwrap().unwrap(),
        Transition::Applied(Outcome::AcceptedPreliminary)
    );

    assert_eq!(library.outcome(), Some(Outcome::RejectedPreliminary));
    let other = control(&session, "18245:1:2");
    assert_eq!(other.outcome(), Some(Outcome::AcceptedPreliminary));
    assert_eq!(bulk.selected(), None);
    assert!(BulkAction::ALL.iter().all(|a| bulk.is_clickable(*a)));

    let doc = document.lock();
    assert_eq!(
        radio_group_value(&doc, &library.radio_group()).as_deref(),
        Some("Rejected preliminary")
    );
    assert_eq!(
        displayed_outcome(&doc, cell(&doc, "18245:1:1", "lane")),
        Some(Outcome::RejectedPreliminary)
    );
    assert_eq!(
        radio_group_value(&doc, &other.radio_group()).as_deref(),
        Some("Accepted preliminary")
    );
    assert_eq!(
        displayed_outcome(&doc, cell(&doc, "18245:1:2", "lane")),
        Some(Outcome::AcceptedPreliminary)
    );
}

#[tokio::test]
async fn failed_bulk_update_keeps_rows() {
    let document = lane_page().shared();
    let service = Arc::new(ScriptedOutcomesService::new());
    service.fail(TransportError::Network("connection reset".into()));
    let session = launch(
        false,
        &document,
        &service,
        &outcomes(&[], &[("18245:1:1", "Undecided")]),
    );

    let err = session
        .dispatch(UiEvent::BulkClicked(BulkAction::RejectAll))
        .await
        .unwrap_err();
    assert!(matches!(err, QcError::Transport(_)));
    assert_eq!(control(&session, "18245:1:1").outcome(), Some(Outcome::Undecided));
    assert_eq!(control(&session, "18245:1:2").outcome(), None);
    assert_eq!(
        StatusRegion::default().error_lines(&document.lock()),
        vec!["connection reset".to_string()]
    );
}
