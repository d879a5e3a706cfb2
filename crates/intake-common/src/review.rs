//! Types that cross the review-gate suspension boundary.
//!
//! `ReviewPayload` travels outward to whatever renders the checkpoint for
//! a human; `ReviewDecision` travels back in. Both are serde
//! round-trippable so they can cross a process boundary unchanged.

use serde::{Deserialize, Serialize};

use crate::field::{FieldSpec, FieldValues};

/// Result of validating a candidate field map against a section spec.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Hard failures: missing required fields, coercion failures, hard
    /// rule violations
    pub errors: Vec<String>,
    /// Soft findings that do not block acceptance
    pub warnings: Vec<String>,
    /// 100 x non-empty declared fields / declared fields (0 when the
    /// section declares no fields)
    pub completion_score: f64,
}

impl ValidationReport {
    /// Whether the candidate passed with no errors (warnings allowed).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings, errors and warnings combined.
    pub fn issue_count(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// Everything the human reviewer needs to judge a drafted section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    /// Suspension ticket the resuming decision must echo
    pub ticket: u64,
    /// Section name
    pub section: String,
    /// Section display title
    pub section_title: String,
    /// Field specifications, in declaration order
    pub fields: Vec<FieldSpec>,
    /// The drafted candidate values under review
    pub candidate: FieldValues,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub completion_score: f64,
    /// Correction attempts already spent on this section
    pub retry_count: u32,
}

/// A human decision resuming a suspended review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the candidate as-is, outstanding errors included
    Approve,
    /// Reject with corrections; corrections win on key collision
    Retry {
        #[serde(default)]
        corrections: FieldValues,
        #[serde(default)]
        feedback: Vec<String>,
    },
    /// Mark the section complete with the dirty candidate retained
    Skip,
    /// Clear the section and start drafting from a blank slate
    Reset,
}

impl ReviewDecision {
    /// Stable name of the decision kind, for logs and audit events.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Retry { .. } => "retry",
            ReviewDecision::Skip => "skip",
            ReviewDecision::Reset => "reset",
        }
    }
}

/// Context handed to the drafting service for the active section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DraftContext {
    /// Values already on record for this section (from a retry merge or a
    /// reopened section)
    pub existing: FieldValues,
    /// Reviewer feedback from the previous round, if any
    pub feedback: Vec<String>,
    /// Correction attempts already spent on this section
    pub retry_count: u32,
}
