//! Outcome service payloads
//!
//! Fetch responses group records by category (`seq`, `lib`, `uqc`), each a
//! map from rpt key to an outcome record. Update requests carry one
//! category and the `Action` marker.

use crate::error::ModelError;
use crate::outcome::Outcome;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// `Action` value of every update request
pub const UPDATE_ACTION: &str = "UPDATE";

/// Outcome category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Lane (sequencing) level manual QC
    Seq,
    /// Library (plex) level manual QC
    Lib,
    /// Utility QC
    Uqc,
}

impl Category {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Seq => "seq",
            Category::Lib => "lib",
            Category::Uqc => "uqc",
        }
    }

    /// Record field holding the outcome for this category
    #[must_use]
    pub fn outcome_field(&self) -> OutcomeField {
        match self {
            Category::Seq | Category::Lib => OutcomeField::Mqc,
            Category::Uqc => OutcomeField::Uqc,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seq" => Ok(Category::Seq),
            "lib" => Ok(Category::Lib),
            "uqc" => Ok(Category::Uqc),
            other => Err(ModelError::argument(format!("unknown category '{other}'"))),
        }
    }
}

/// Which outcome field of a record is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeField {
    /// `mqc_outcome`
    Mqc,
    /// `uqc_outcome`
    Uqc,
}

impl OutcomeField {
    /// Field name on the wire
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OutcomeField::Mqc => "mqc_outcome",
            OutcomeField::Uqc => "uqc_outcome",
        }
    }
}

/// Number or numeric string; the service is not consistent about which
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// JSON number
    Int(u64),
    /// JSON string
    Text(String),
}

/// One outcome record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Manual QC outcome (`seq` and `lib`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mqc_outcome: Option<String>,
    /// Utility QC outcome (`uqc`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uqc_outcome: Option<String>,
    /// Lane position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Numeric>,
    /// Run id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_run: Option<Numeric>,
    /// Tag index, libraries only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_index: Option<Numeric>,
}

impl OutcomeRecord {
    /// Record carrying a manual QC outcome only
    #[must_use]
    pub fn mqc(outcome: Outcome) -> Self {
        Self {
            mqc_outcome: Some(outcome.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Record carrying a utility QC outcome only
    #[must_use]
    pub fn uqc(outcome: &str) -> Self {
        Self {
            uqc_outcome: Some(outcome.to_string()),
            ..Self::default()
        }
    }

    /// Raw value of the requested outcome field
    #[must_use]
    pub fn outcome_value(&self, field: OutcomeField) -> Option<&str> {
        match field {
            OutcomeField::Mqc => self.mqc_outcome.as_deref(),
            OutcomeField::Uqc => self.uqc_outcome.as_deref(),
        }
    }

    /// Manual QC outcome parsed into the vocabulary
    ///
    /// # Errors
    /// `ModelError::UnknownOutcome` for values outside the vocabulary.
    pub fn manual_outcome(&self) -> Result<Option<Outcome>, ModelError> {
        self.mqc_outcome.as_deref().map(str::parse).transpose()
    }
}

/// Outcome records keyed by rpt key, in server order
pub type OutcomeMap = IndexMap<String, OutcomeRecord>;

/// Fetch response of the outcome service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomesPayload {
    /// Lane-level manual QC outcomes
    #[serde(default)]
    pub seq: OutcomeMap,
    /// Library-level manual QC outcomes
    #[serde(default)]
    pub lib: OutcomeMap,
    /// Utility QC outcomes
    #[serde(default)]
    pub uqc: OutcomeMap,
}

impl OutcomesPayload {
    /// Decode a service response
    ///
    /// # Errors
    /// `ModelError::MalformedData` if the response is not an object of
    /// category maps.
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value)
            .map_err(|e| ModelError::MalformedData(format!("response ({e})")))
    }

    /// Records of one category
    #[must_use]
    pub fn category(&self, category: Category) -> &OutcomeMap {
        match category {
            Category::Seq => &self.seq,
            Category::Lib => &self.lib,
            Category::Uqc => &self.uqc,
        }
    }

    /// Mutable records of one category
    pub fn category_mut(&mut self, category: Category) -> &mut OutcomeMap {
        match category {
            Category::Seq => &mut self.seq,
            Category::Lib => &mut self.lib,
            Category::Uqc => &mut self.uqc,
        }
    }

    /// Check if any lane already has a final manual QC outcome
    #[must_use]
    pub fn any_lane_final(&self) -> bool {
        self.seq.values().any(|r| {
            r.mqc_outcome
                .as_deref()
                .is_some_and(|o| o.contains("final"))
        })
    }

    /// Check if the payload holds no records at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty() && self.lib.is_empty() && self.uqc.is_empty()
    }
}

/// One requested outcome change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeChange {
    /// Target rpt key
    pub rpt_key: String,
    /// New manual QC outcome
    pub mqc_outcome: Outcome,
}

impl OutcomeChange {
    /// Create a change
    #[inline]
    pub fn new(rpt_key: impl Into<String>, mqc_outcome: Outcome) -> Self {
        Self {
            rpt_key: rpt_key.into(),
            mqc_outcome,
        }
    }
}

/// Build the body of an update request
///
/// `{ "<category>": { "<rptKey>": { "mqc_outcome": "<Outcome>" } }, "Action": "UPDATE" }`
#[must_use]
pub fn build_update_query(category: Category, changes: &[OutcomeChange]) -> Value {
    let mut records = Map::new();
    for change in changes {
        records.insert(
            change.rpt_key.clone(),
            json!({ "mqc_outcome": change.mqc_outcome.as_str() }),
        );
    }
    let mut query = Map::new();
    query.insert(category.as_str().to_string(), Value::Object(records));
    query.insert("Action".to_string(), Value::String(UPDATE_ACTION.to_string()));
    Value::Object(query)
}

/// Build the body of a fetch request: every key mapped to `{}`
#[must_use]
pub fn build_query<S: AsRef<str>>(rpt_keys: &[S]) -> Value {
    let data: Map<String, Value> = rpt_keys
        .iter()
        .map(|k| (k.as_ref().to_string(), Value::Object(Map::new())))
        .collect();
    Value::Object(data)
}
