//! Testing utilities for the SeqQC workspace
//!
//! Results page fixtures and a scripted outcomes service.

#![allow(missing_docs)]

use parking_lot::Mutex;
use seqqc_core::{OutcomesService, TransportError};
use seqqc_dom::widgets::{LANE_MQC_CONTROL, LIBRARY_OVERALL_PLACEHOLDER};
use seqqc_dom::{shared, Document, NodeId, SharedDocument};
use serde_json::{json, Value};
use std::collections::VecDeque;
use tokio::sync::{oneshot, Notify};

pub const REVIEWER: &str = "Logged in as aa11 (mqc)";
pub const VISITOR: &str = "Logged in as bb22";

pub const RUN_PAGE_TITLE: &str =
    "NPG SeqQC v0: Results for run 18245 (run 18245 status: qc in progress, taken by aa11)";
pub const LANE_PAGE_TITLE: &str =
    "NPG SeqQC v0: Results for runs 18245 lanes 1 (run 18245 status: qc in progress, taken by aa11)";
pub const ARCHIVED_RUN_TITLE: &str =
    "NPG SeqQC v0: Results for run 18245 (run 18245 status: run archived)";
pub const ARCHIVED_LANE_TITLE: &str =
    "NPG SeqQC v0: Results for runs 18245 lanes 1 (run 18245 status: run archived)";

/// Rows of the default summary table
pub const SIX_ROWS: [&str; 6] = [
    "18245:1",
    "18245:1:1",
    "18245:1:2",
    "19001:1",
    "19001:1:1",
    "19001:1:2",
];

/// Rows of a single-lane page
pub const LANE_ROWS: [&str; 3] = ["18245:1", "18245:1:1", "18245:1:2"];

/// Builder for a results page with a `results_summary` table
#[derive(Debug, Clone)]
pub struct PageFixture {
    title: String,
    user: Option<String>,
    rows: Vec<String>,
    library_placeholder: bool,
    menu_links: bool,
}

/// Six-row run page viewed by the reviewer who took the run
pub fn results_summary() -> PageFixture {
    PageFixture {
        title: RUN_PAGE_TITLE.to_string(),
        user: Some(REVIEWER.to_string()),
        rows: SIX_ROWS.iter().map(|k| k.to_string()).collect(),
        library_placeholder: false,
        menu_links: true,
    }
}

/// Single-lane library page with the bulk placeholder
pub fn lane_page() -> PageFixture {
    results_summary()
        .with_title(LANE_PAGE_TITLE)
        .with_rows(&LANE_ROWS)
        .with_library_placeholder()
}

impl PageFixture {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn without_user(mut self) -> Self {
        self.user = None;
        self
    }

    pub fn with_rows(mut self, rows: &[&str]) -> Self {
        self.rows = rows.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_library_placeholder(mut self) -> Self {
        self.library_placeholder = true;
        self
    }

    pub fn without_menu(mut self) -> Self {
        self.menu_links = false;
        self
    }

    pub fn build(&self) -> Document {
        let mut doc = Document::new();
        doc.set_title(self.title.clone());
        let root = doc.root();

        let header = doc.append_element(root, "div");
        doc.set_id(header, "header");
        let h1 = doc.append_element(header, "h1");
        if let Some(user) = &self.user {
            let rfloat = doc.append_element(h1, "span");
            doc.add_class(rfloat, "rfloat");
            doc.set_text(rfloat, user.clone());
        }
        if self.menu_links {
            let menu = doc.append_element(root, "div");
            doc.set_id(menu, "menu");
            let links = doc.append_element(menu, "div");
            doc.set_id(links, "links");
        }

        let table = doc.append_element(root, "table");
        doc.set_id(table, "results_summary");
        let mut placed = false;
        for key in &self.rows {
            let row = doc.append_element(table, "tr");
            doc.set_id(row, format!("rpt_key:{key}"));

            let lane = doc.append_element(row, "td");
            doc.add_class(lane, "lane");
            let link = doc.append_element(lane, "a");
            doc.set_text(link, key.split(':').take(2).collect::<Vec<_>>().join(":"));
            let control = doc.append_element(lane, "span");
            doc.add_class(control, LANE_MQC_CONTROL);
            if self.library_placeholder && !placed && key.split(':').count() == 2 {
                let overall = doc.append_element(lane, "span");
                doc.add_class(overall, LIBRARY_OVERALL_PLACEHOLDER);
                placed = true;
            }

            let tag = doc.append_element(row, "td");
            doc.add_class(tag, "tag_info");
            doc.set_text(tag, key.rsplit(':').next().unwrap_or_default().to_string());
            doc.append_element(tag, "br");
        }
        doc
    }

    pub fn shared(&self) -> SharedDocument {
        shared(self.build())
    }
}

/// Row element of `key`
pub fn row(doc: &Document, key: &str) -> NodeId {
    doc.get_element_by_id(&format!("rpt_key:{key}"))
        .unwrap_or_else(|| panic!("no row for {key}"))
}

/// Cell with `class` in the row of `key`
pub fn cell(doc: &Document, key: &str, class: &str) -> NodeId {
    let row = row(doc, key);
    doc.children(row)
        .iter()
        .copied()
        .find(|c| doc.has_class(*c, class))
        .unwrap_or_else(|| panic!("no .{class} cell for {key}"))
}

/// QC placeholder of the row of `key`
pub fn control_of(doc: &Document, key: &str) -> NodeId {
    let lane = cell(doc, key, "lane");
    doc.children_with_class(lane, LANE_MQC_CONTROL)[0]
}

/// Payload with records per category, e.g. `payload(&[("18245:1", "Accepted final")], &[], &[])`
pub fn payload(seq: &[(&str, &str)], lib: &[(&str, &str)], uqc: &[(&str, &str)]) -> Value {
    fn records(entries: &[(&str, &str)], field: &str) -> Value {
        let mut map = serde_json::Map::new();
        for (key, outcome) in entries {
            map.insert(key.to_string(), json!({ field: outcome }));
        }
        Value::Object(map)
    }
    json!({
        "seq": records(seq, "mqc_outcome"),
        "lib": records(lib, "mqc_outcome"),
        "uqc": records(uqc, "uqc_outcome"),
    })
}

enum Reply {
    Ready(Result<Value, TransportError>),
    Gated(oneshot::Receiver<Result<Value, TransportError>>),
}

/// Outcomes service replaying scripted replies
///
/// Every request body is recorded. Replies are consumed in order; when
/// none is scripted the service answers `{}`.
#[derive(Default)]
pub struct ScriptedOutcomesService {
    requests: Mutex<Vec<Value>>,
    replies: Mutex<VecDeque<Reply>>,
    received: Notify,
}

impl ScriptedOutcomesService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn reply(&self, value: Value) -> &Self {
        self.replies.lock().push_back(Reply::Ready(Ok(value)));
        self
    }

    /// Queue a failed reply
    pub fn fail(&self, error: TransportError) -> &Self {
        self.replies.lock().push_back(Reply::Ready(Err(error)));
        self
    }

    /// Queue a reply held until the returned sender fires
    pub fn gate(&self) -> oneshot::Sender<Result<Value, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Wait until at least `count` requests have been received
    pub async fn wait_for_requests(&self, count: usize) {
        loop {
            let received = self.received.notified();
            if self.request_count() >= count {
                return;
            }
            received.await;
        }
    }
}

#[async_trait::async_trait]
impl OutcomesService for ScriptedOutcomesService {
    async fn post_json(&self, body: &Value) -> Result<Value, TransportError> {
        self.requests.lock().push(body.clone());
        let reply = self.replies.lock().pop_front();
        self.received.notify_waiters();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Network("gate dropped".to_string()))),
            None => Ok(json!({})),
        }
    }
}
