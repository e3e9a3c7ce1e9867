//! Page classification for manual and utility QC
//!
//! Decides from the page title and the "Logged in as" header text whether
//! the reviewer may edit outcomes on this page, and at which granularity.
//! Only single-run pages and single-lane pages qualify.

use crate::error::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RUN_LANE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:(?:for (run) ([0-9]+))|(?:for (runs) ([0-9]+) lanes ([0-9]+))) \(run")
        .expect("valid regex")
});

static RUN_STATUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(run [0-9]+ status: ((?:\S+)(?:\s\S+){1,2})(?:, taken by (\S+))?\)$")
        .expect("valid regex")
});

static LOGGED_USER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^Logged in as ([a-zA-Z0-9]+)(?:\s\((mqc)\))?$").expect("valid regex")
});

/// Run statuses in which the owner may do manual QC
const MQC_STATUSES: [&str; 2] = ["qc in progress", "qc on hold"];

/// Run statuses in which utility QC may be annotated
const UQC_STATUSES: [&str; 2] = ["qc complete", "run archived"];

/// Role granting QC rights
const MQC_ROLE: &str = "mqc";

/// What the title says about run/lane scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLaneInfo {
    /// `Some(true)` for a run page, `Some(false)` for a lane page
    pub is_run_page: Option<bool>,
    /// Title names exactly one run or exactly one lane
    pub is_single_run_or_lane_page: bool,
}

/// Run status and owner from the title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatus {
    /// e.g. `qc in progress`
    pub run_status: Option<String>,
    /// Login of the reviewer who took the run
    pub taken_by: Option<String>,
}

/// Logged-in user from the page header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggedUser {
    /// Login name
    pub username: Option<String>,
    /// Role, `mqc` for reviewers
    pub role: Option<String>,
}

/// Page eligibility for QC editing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageForQc {
    /// Manual QC may be done on this page
    pub is_page_for_mqc: bool,
    /// `Some(true)` run page, `Some(false)` lane page, `None` neither
    pub is_run_page: Option<bool>,
    /// Utility QC may be annotated on this page
    pub is_page_for_uqc: bool,
}

/// Parse run/lane scope from a page title
#[must_use]
pub fn parse_run_lane(title: &str) -> RunLaneInfo {
    match RUN_LANE.captures(title) {
        Some(caps) if caps.get(1).is_some() => RunLaneInfo {
            is_run_page: Some(true),
            is_single_run_or_lane_page: true,
        },
        Some(caps) if caps.get(3).is_some() => RunLaneInfo {
            is_run_page: Some(false),
            is_single_run_or_lane_page: true,
        },
        _ => RunLaneInfo::default(),
    }
}

/// Parse run status and owner from a page title
#[must_use]
pub fn parse_run_status(title: &str) -> RunStatus {
    RUN_STATUS
        .captures(title)
        .map(|caps| RunStatus {
            run_status: caps.get(1).map(|m| m.as_str().trim_start().to_string()),
            taken_by: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .unwrap_or_default()
}

/// Parse the "Logged in as" header text
#[must_use]
pub fn parse_logged_user(text: &str) -> LoggedUser {
    LOGGED_USER
        .captures(text)
        .map(|caps| LoggedUser {
            username: caps.get(1).map(|m| m.as_str().to_string()),
            role: caps.get(2).map(|m| m.as_str().to_lowercase()),
        })
        .unwrap_or_default()
}

/// Classify a page from its title and logged-in-user header
///
/// # Errors
/// `ModelError::Argument` when the header text is empty, or when the title
/// is empty for a reviewer.
pub fn classify_page(title: &str, logged_user: &str) -> Result<PageForQc, ModelError> {
    let logged_user = logged_user.trim();
    if logged_user.is_empty() {
        return Err(ModelError::argument(
            "authentication data is expected but not available in page",
        ));
    }

    let mut page = PageForQc::default();
    let user = parse_logged_user(logged_user);
    let Some(username) = user.username else {
        return Ok(page);
    };
    if user.role.as_deref() != Some(MQC_ROLE) {
        return Ok(page);
    }

    let title = title.trim();
    if title.is_empty() {
        return Err(ModelError::argument(
            "page title is expected but not available in page",
        ));
    }

    let status = parse_run_status(title);
    let Some(run_status) = status.run_status.as_deref() else {
        return Ok(page);
    };
    let run_lane = parse_run_lane(title);
    if MQC_STATUSES.contains(&run_status) && status.taken_by.as_deref() == Some(username.as_str())
    {
        page.is_page_for_mqc = run_lane.is_single_run_or_lane_page;
        page.is_run_page = run_lane.is_run_page;
    } else if UQC_STATUSES.contains(&run_status) {
        page.is_page_for_uqc = run_lane.is_single_run_or_lane_page;
        page.is_run_page = run_lane.is_run_page;
    }
    Ok(page)
}
