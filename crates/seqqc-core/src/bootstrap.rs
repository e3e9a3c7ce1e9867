//! Page bootstrap
//!
//! Classifies the page, paints the stored outcomes and then starts manual
//! QC or offers utility QC annotation, depending on who is looking at which
//! run.

use crate::error::QcError;
use crate::launch::{add_uqc_annotation_link, launch_utility_qc, ManualQcSession};
use crate::transport::OutcomesService;
use crate::view::OutcomesView;
use seqqc_dom::{NodeId, SharedDocument, StatusRegion};
use seqqc_model::{classify_page, PageForQc, QcConfig};
use std::sync::Arc;

/// Selector of the "Logged in as" header text
pub const LOGGED_USER_SELECTOR: &str = "#header h1 span.rfloat";

/// QC layer of one results page
pub struct QcViewer {
    document: SharedDocument,
    service: Arc<dyn OutcomesService>,
    config: Arc<QcConfig>,
    status: StatusRegion,
    page: PageForQc,
    session: Option<ManualQcSession>,
    annotation_link: Option<NodeId>,
}

impl std::fmt::Debug for QcViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QcViewer")
            .field("page", &self.page)
            .field("session", &self.session)
            .field("annotation_link", &self.annotation_link)
            .finish_non_exhaustive()
    }
}

impl QcViewer {
    /// Start the QC layer on a loaded page
    ///
    /// Fetch failures and launcher failures are shown in the status region
    /// and leave the viewer without a session.
    ///
    /// # Errors
    /// `ModelError::Argument` when the page lacks the logged-in-user text,
    /// or a reviewer's page lacks a title.
    pub async fn start(
        document: SharedDocument,
        service: Arc<dyn OutcomesService>,
        config: Arc<QcConfig>,
    ) -> Result<Self, QcError> {
        let status = StatusRegion::new(config.status_region_id.clone());
        let page = {
            let mut doc = document.lock();
            status.ensure(&mut doc);
            let user = doc
                .query(LOGGED_USER_SELECTOR)?
                .first()
                .map(|node| doc.text_content(*node))
                .unwrap_or_default();
            classify_page(doc.title(), &user)?
        };
        tracing::info!(
            mqc = page.is_page_for_mqc,
            uqc = page.is_page_for_uqc,
            run_page = ?page.is_run_page,
            "Page classified"
        );

        let mut viewer = Self {
            document,
            service,
            config,
            status,
            page,
            session: None,
            annotation_link: None,
        };
        if page.is_page_for_uqc {
            viewer.annotation_link = add_uqc_annotation_link(&mut viewer.document.lock());
        }

        let view = OutcomesView::new(viewer.document.clone(), viewer.service.clone(), &viewer.config);
        let Some(payload) = view.fetch_and_process_qc(|_| {}).await else {
            return Ok(viewer);
        };

        if let (true, Some(is_run_page)) = (page.is_page_for_mqc, page.is_run_page) {
            match ManualQcSession::launch(
                is_run_page,
                &payload,
                viewer.document.clone(),
                viewer.service.clone(),
                viewer.config.clone(),
            ) {
                Ok(session) => viewer.session = session,
                Err(e) => {
                    tracing::error!("Manual QC launch failed: {}", e);
                    viewer.status.display_error(
                        &mut viewer.document.lock(),
                        &format!("Error while initiating manual QC interface. {}", e.user_message()),
                    );
                }
            }
        }
        Ok(viewer)
    }

    /// Page classification
    #[inline]
    #[must_use]
    pub fn page(&self) -> PageForQc {
        self.page
    }

    /// Manual QC session, when launched
    #[must_use]
    pub fn session(&self) -> Option<&ManualQcSession> {
        self.session.as_ref()
    }

    /// Utility QC annotation link, until clicked
    #[must_use]
    pub fn annotation_link(&self) -> Option<NodeId> {
        self.annotation_link
    }

    /// Handle a click on the annotation link
    ///
    /// Removes the link, fetches and paints outcomes again and marks every
    /// row with its utility outcome. Returns the number of marked rows.
    ///
    /// # Errors
    /// `InvalidState` when the link is not offered; launcher errors, which
    /// are also shown in the status region.
    pub async fn annotate_utility(&mut self) -> Result<usize, QcError> {
        let Some(link) = self.annotation_link.take() else {
            return Err(QcError::invalid_state("utility QC annotation is not offered on this page"));
        };
        self.document.lock().detach(link);

        let view = OutcomesView::new(self.document.clone(), self.service.clone(), &self.config);
        let Some(payload) = view.fetch_and_process_qc(|_| {}).await else {
            return Ok(0);
        };
        let is_run_page = self.page.is_run_page.unwrap_or(true);
        let mut doc = self.document.lock();
        launch_utility_qc(&mut doc, &payload, is_run_page, &self.config).map_err(|e| {
            tracing::error!("Utility QC launch failed: {}", e);
            self.status.display_error(
                &mut doc,
                &format!("Error while initiating utility QC interface. {}", e.user_message()),
            );
            e
        })
    }
}
