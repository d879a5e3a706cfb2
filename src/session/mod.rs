//! Session state: the aggregate the orchestrator owns and persists.
//!
//! One `SessionState` exists per active conversation. It is mutated only
//! by the orchestrator applying drafted data and human decisions, and it
//! is written to the session store after every committed transition so a
//! crash or restart resumes from the last committed state.

use chrono::{DateTime, Utc};
use intake_common::{FieldValues, FormSpec, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a session in the orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Session created, no section drafted yet
    #[default]
    Idle,
    /// A candidate is being (or needs to be) drafted for the current section
    Drafting,
    /// Suspended at the review gate, waiting for a human decision
    AwaitingReview,
    /// All sections complete; no further field mutation is permitted
    Complete,
}

impl SessionPhase {
    /// Check if the session is in its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Check if the session is suspended at the review gate.
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::AwaitingReview)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Drafting => write!(f, "drafting"),
            SessionPhase::AwaitingReview => write!(f, "awaiting_review"),
            SessionPhase::Complete => write!(f, "complete"),
        }
    }
}

/// Mutable per-section record: committed (or in-flight) values plus retry
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Field values on record for this section
    #[serde(default)]
    pub values: FieldValues,
    /// Correction attempts spent on this section so far
    #[serde(default)]
    pub retry_count: u32,
    /// Reviewer feedback from the last retry, handed to the next draft
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<String>,
    /// Set when the section was skipped past outstanding validation issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// When the section entered the completed set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SectionRecord {
    /// Clear the record back to a blank slate (reset semantics).
    pub fn clear(&mut self) {
        self.values.clear();
        self.retry_count = 0;
        self.feedback.clear();
        self.annotation = None;
        self.completed_at = None;
    }
}

/// The persisted suspension: a drafted candidate waiting on a human
/// decision.
///
/// `ticket` is the session's transition sequence number at the moment of
/// suspension; a resuming decision must echo it, which is how a decision
/// issued against a stale, already-resolved suspension is detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReview {
    pub ticket: u64,
    pub section: String,
    pub candidate: FieldValues,
    pub report: ValidationReport,
}

/// The aggregate root for one form-filling conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Opaque session id (the session-store key)
    pub id: String,
    /// The immutable form definition this session fills
    pub form: FormSpec,
    /// State-machine position
    pub phase: SessionPhase,
    /// One record per section, keyed by section name
    pub records: BTreeMap<String, SectionRecord>,
    /// The section currently being worked, if any
    pub current_section: Option<String>,
    /// Completed section names, in completion order
    pub completed: Vec<String>,
    /// The active suspension, if the session is awaiting review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingReview>,
    /// Monotonic transition sequence number
    pub seq: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    /// Create a fresh session for `form`: every record empty, the first
    /// section current, phase `Idle`.
    pub fn new(id: impl Into<String>, form: FormSpec) -> Self {
        let now = Utc::now();
        let records = form
            .sections
            .iter()
            .map(|s| (s.name.clone(), SectionRecord::default()))
            .collect();
        let current_section = form.sections.first().map(|s| s.name.clone());

        Self {
            id: id.into(),
            form,
            phase: SessionPhase::Idle,
            records,
            current_section,
            completed: Vec::new(),
            pending: None,
            seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the session is in its terminal state.
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Record for a section, if the section exists.
    pub fn record(&self, section: &str) -> Option<&SectionRecord> {
        self.records.get(section)
    }

    /// Mutable record for a section, if the section exists.
    pub fn record_mut(&mut self, section: &str) -> Option<&mut SectionRecord> {
        self.records.get_mut(section)
    }

    /// Check if a section is in the completed set.
    pub fn is_completed(&self, section: &str) -> bool {
        self.completed.iter().any(|s| s == section)
    }

    /// Stamp a committed transition: bump the sequence number and the
    /// update time.
    pub fn touch(&mut self) {
        self.seq += 1;
        self.updated_at = Utc::now();
    }

    /// Assert the structural invariants that must hold for every
    /// reachable state. Used by tests and by the store before writing a
    /// snapshot.
    pub fn check_invariants(&self) -> Result<(), String> {
        let names = self.form.section_names();

        let mut seen = std::collections::HashSet::new();
        for section in &self.completed {
            if !names.contains(&section.as_str()) {
                return Err(format!(
                    "completed section '{}' is not part of the form",
                    section
                ));
            }
            if !seen.insert(section.as_str()) {
                return Err(format!("section '{}' completed twice", section));
            }
        }

        if let Some(current) = &self.current_section {
            if !names.contains(&current.as_str()) {
                return Err(format!(
                    "current section '{}' is not part of the form",
                    current
                ));
            }
            if self.is_completed(current) {
                return Err(format!(
                    "current section '{}' is already completed",
                    current
                ));
            }
        }

        if self.phase.is_suspended() != self.pending.is_some() {
            return Err("pending review and awaiting_review phase out of sync".to_string());
        }

        if self.phase.is_terminal() && self.completed.len() != names.len() {
            return Err("terminal session with incomplete sections".to_string());
        }

        Ok(())
    }
}

/// Lightweight session descriptor for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub form: String,
    pub phase: SessionPhase,
    pub completed_sections: usize,
    pub total_sections: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&SessionState> for SessionMeta {
    fn from(state: &SessionState) -> Self {
        Self {
            id: state.id.clone(),
            form: state.form.name.clone(),
            phase: state.phase,
            completed_sections: state.completed.len(),
            total_sections: state.form.sections.len(),
            updated_at: state.updated_at,
        }
    }
}
