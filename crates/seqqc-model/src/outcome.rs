//! QC outcome vocabulary
//!
//! Manual QC outcomes are either preliminary (still editable by the
//! reviewer) or final (locked). Utility QC uses a separate three-valued
//! vocabulary.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Manual QC outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Provisional pass
    #[serde(rename = "Accepted preliminary")]
    AcceptedPreliminary,
    /// Provisional fail
    #[serde(rename = "Rejected preliminary")]
    RejectedPreliminary,
    /// No decision yet
    #[serde(rename = "Undecided")]
    Undecided,
    /// Locked pass
    #[serde(rename = "Accepted final")]
    AcceptedFinal,
    /// Locked fail
    #[serde(rename = "Rejected final")]
    RejectedFinal,
    /// Locked without decision
    #[serde(rename = "Undecided final")]
    UndecidedFinal,
}

impl Outcome {
    /// Every outcome, in display order
    pub const ALL: [Outcome; 6] = [
        Outcome::AcceptedPreliminary,
        Outcome::RejectedPreliminary,
        Outcome::Undecided,
        Outcome::AcceptedFinal,
        Outcome::RejectedFinal,
        Outcome::UndecidedFinal,
    ];

    /// Outcomes a reviewer can pick from the per-row radio group
    pub const EDITABLE: [Outcome; 3] = [
        Outcome::AcceptedPreliminary,
        Outcome::Undecided,
        Outcome::RejectedPreliminary,
    ];

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::AcceptedPreliminary => "Accepted preliminary",
            Outcome::RejectedPreliminary => "Rejected preliminary",
            Outcome::Undecided => "Undecided",
            Outcome::AcceptedFinal => "Accepted final",
            Outcome::RejectedFinal => "Rejected final",
            Outcome::UndecidedFinal => "Undecided final",
        }
    }

    /// Check if the outcome is locked
    #[inline]
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Outcome::AcceptedFinal | Outcome::RejectedFinal | Outcome::UndecidedFinal
        )
    }

    /// Check if the outcome can still be changed from the UI
    #[inline]
    #[must_use]
    pub fn is_editable(&self) -> bool {
        !self.is_final()
    }

    /// Final counterpart of a preliminary outcome
    ///
    /// # Errors
    /// `ModelError::InvalidState` for `Undecided` and for outcomes that are
    /// already final.
    pub fn to_final(&self) -> Result<Outcome, ModelError> {
        match self {
            Outcome::AcceptedPreliminary => Ok(Outcome::AcceptedFinal),
            Outcome::RejectedPreliminary => Ok(Outcome::RejectedFinal),
            Outcome::Undecided => Err(ModelError::invalid_state(
                "an undecided outcome cannot be saved as final",
            )),
            other => Err(ModelError::invalid_state(format!(
                "outcome '{other}' is already final"
            ))),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| ModelError::UnknownOutcome(s.to_string()))
    }
}

/// Utility QC outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityOutcome {
    /// Flagged as usable
    Accepted,
    /// Flagged as unusable
    Rejected,
    /// No flag
    Undecided,
}

impl UtilityOutcome {
    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            UtilityOutcome::Accepted => "Accepted",
            UtilityOutcome::Rejected => "Rejected",
            UtilityOutcome::Undecided => "Undecided",
        }
    }

    /// Background colour used to mark a row open for utility QC
    #[must_use]
    pub fn mark_colour(outcome: Option<UtilityOutcome>) -> &'static str {
        match outcome {
            Some(UtilityOutcome::Accepted) => "green",
            Some(UtilityOutcome::Rejected) => "red",
            _ => "grey",
        }
    }
}

impl fmt::Display for UtilityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtilityOutcome {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Accepted" => Ok(UtilityOutcome::Accepted),
            "Rejected" => Ok(UtilityOutcome::Rejected),
            "Undecided" => Ok(UtilityOutcome::Undecided),
            other => Err(ModelError::argument(format!(
                "Invalid value '{other}' for utility outcome"
            ))),
        }
    }
}
