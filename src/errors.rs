//! Typed error hierarchy for the intake orchestrator.
//!
//! Two top-level enums cover the two subsystems:
//! - `SessionError` — orchestrator transition rejections and lifecycle failures
//! - `StoreError` — session-store persistence failures
//!
//! Validation findings are data (`ValidationReport`), never errors, and a
//! retry budget running out is a forced-reset outcome, not an error. Every
//! rejection here names the invariant it protects, and none of them
//! mutate persisted state.

use intake_common::DraftError;
use thiserror::Error;

/// Errors from the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize session '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse session file at {path}: {source}")]
    Deserialize {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the orchestrator.
///
/// The protocol-violation family (`SessionComplete`, `StaleTicket`,
/// `NoPendingReview`, `ReviewPending`, `UnknownSection`,
/// `SectionNotCompleted`) is fatal to the single request only: the
/// persisted session remains valid and a later, well-formed request can
/// proceed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session found with id '{id}'")]
    NotFound { id: String },

    #[error("Session '{id}' is already complete; it accepts no further decisions")]
    SessionComplete { id: String },

    #[error(
        "Decision carries review ticket {got} but the active suspension is ticket {expected}; \
         stale decisions are rejected, not re-applied"
    )]
    StaleTicket { expected: u64, got: u64 },

    #[error("Session '{id}' has no pending review to resume")]
    NoPendingReview { id: String },

    #[error("A review is already pending for section '{section}'; resolve it before drafting")]
    ReviewPending { section: String },

    #[error("Form '{form}' has no section named '{section}'")]
    UnknownSection { form: String, section: String },

    #[error("Section '{section}' is not completed; only completed sections can be reopened")]
    SectionNotCompleted { section: String },

    #[error("Form is not complete: {completed}/{total} sections done")]
    FormIncomplete { completed: usize, total: usize },

    #[error("Invalid form spec: {0}")]
    InvalidForm(#[from] intake_common::FormSpecError),

    #[error("Drafting failed for section '{section}': {source}")]
    Drafting {
        section: String,
        #[source]
        source: DraftError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Whether this error is a protocol violation: the request was
    /// malformed for the session's current state, and the persisted state
    /// was left untouched.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::SessionComplete { .. }
                | Self::StaleTicket { .. }
                | Self::NoPendingReview { .. }
                | Self::ReviewPending { .. }
                | Self::UnknownSection { .. }
                | Self::SectionNotCompleted { .. }
        )
    }

    /// Whether the condition is retryable without changing the request
    /// (drafting-service outages are; protocol violations are not).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Drafting { .. } | Self::Store(_))
    }
}
