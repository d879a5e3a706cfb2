//! The resumable form-filling state machine.
//!
//! The orchestrator composes the validator, the review gate, the section
//! scheduler and the session store into one engine driven by exactly two
//! inputs: drafted field data (from a `DraftingService`) and human
//! decisions (through the review gate). Every committed transition is
//! persisted as a full snapshot before control returns to the caller, so
//! a session can be suspended indefinitely and resumed from the last
//! committed state — by the same process or a later one.

use intake_common::{
    DraftContext, DraftingService, FormSpec, ReviewDecision, ReviewPayload,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::SessionError;
use crate::gate::{GateOutcome, ReviewGate};
use crate::progress::{self, FormProgress, FormSummary};
use crate::scheduler::{self, NextAction};
use crate::session::{PendingReview, SessionPhase, SessionState};
use crate::store::SessionStore;
use crate::validator;

/// Outcome of resuming a suspended session with a human decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Resumption {
    /// Section approved and committed; `next` is the section now current
    /// (`None` means the whole form just completed)
    SectionCommitted {
        section: String,
        next: Option<String>,
    },
    /// Section skipped past its validation issues and committed dirty
    SectionSkipped {
        section: String,
        next: Option<String>,
    },
    /// Corrections recorded; the same section drafts again
    RetryScheduled { section: String, retry_count: u32 },
    /// Section cleared; `forced` marks a retry-budget exhaustion
    SectionReset { section: String, forced: bool },
}

impl Resumption {
    /// `Some(next)` when the session advanced to another section,
    /// `None` otherwise.
    pub fn advanced_to(&self) -> Option<&str> {
        match self {
            Resumption::SectionCommitted { next, .. }
            | Resumption::SectionSkipped { next, .. } => next.as_deref(),
            _ => None,
        }
    }
}

/// The section-sequenced form-filling orchestrator.
pub struct Orchestrator<S: SessionStore> {
    store: S,
    gate: ReviewGate,
}

impl<S: SessionStore> Orchestrator<S> {
    /// Create an orchestrator over `store` with the given retry budget.
    pub fn new(store: S, max_retries: u32) -> Self {
        Self {
            store,
            gate: ReviewGate::new(max_retries),
        }
    }

    /// The per-section retry budget.
    pub fn max_retries(&self) -> u32 {
        self.gate.max_retries()
    }

    /// Validate `form` and create a fresh persisted session for it.
    pub fn create_session(&self, form: FormSpec) -> Result<SessionState, SessionError> {
        form.validate()?;

        let state = SessionState::new(Uuid::new_v4().to_string(), form);
        self.store.save(&state)?;
        info!(session = %state.id, form = %state.form.name, "session created");
        Ok(state)
    }

    /// Load the last committed snapshot for a session.
    pub fn load_session(&self, id: &str) -> Result<SessionState, SessionError> {
        self.store
            .load(id)?
            .ok_or_else(|| SessionError::NotFound { id: id.to_string() })
    }

    /// Delete a session on explicit request from the presentation layer.
    /// The core never self-deletes state.
    pub fn delete_session(&self, id: &str) -> Result<(), SessionError> {
        self.store.delete(id)?;
        info!(session = %id, "session deleted");
        Ok(())
    }

    /// Draft a candidate for the active section and suspend at the review
    /// gate.
    ///
    /// Entering `Drafting` is persisted before the drafting service runs:
    /// if the service fails (or the process dies mid-call) the session
    /// resumes in `Drafting` and the call can simply be repeated — the
    /// failure is surfaced as a retryable `SessionError::Drafting`, never
    /// papered over with invented values.
    pub async fn draft(
        &self,
        state: &mut SessionState,
        drafter: &dyn DraftingService,
    ) -> Result<ReviewPayload, SessionError> {
        if state.is_terminal() {
            return Err(SessionError::SessionComplete {
                id: state.id.clone(),
            });
        }

        let section = match scheduler::next_action(state) {
            NextAction::DraftSection(section) => section,
            NextAction::AwaitReview => {
                let pending = state.pending.as_ref().expect("suspended without pending");
                return Err(SessionError::ReviewPending {
                    section: pending.section.clone(),
                });
            }
            NextAction::Finish => {
                return Err(SessionError::SessionComplete {
                    id: state.id.clone(),
                });
            }
        };

        // Commit the entry into Drafting before calling out, so a crash
        // or service failure leaves a resumable snapshot behind.
        if state.phase != SessionPhase::Drafting
            || state.current_section.as_deref() != Some(section.as_str())
        {
            state.current_section = Some(section.clone());
            state.phase = SessionPhase::Drafting;
            state.touch();
            self.store.save(state)?;
        }

        let spec = state
            .form
            .section(&section)
            .cloned()
            .expect("current section missing from form");
        let record = state.record(&section).cloned().unwrap_or_default();
        let ctx = DraftContext {
            existing: record.values.clone(),
            feedback: record.feedback.clone(),
            retry_count: record.retry_count,
        };

        let candidate = match drafter.draft(&spec, &ctx).await {
            Ok(candidate) => candidate,
            Err(source) => {
                warn!(session = %state.id, section = %section, error = %source,
                      "drafting service failed; session stays in drafting");
                return Err(SessionError::Drafting { section, source });
            }
        };

        let report = validator::validate(&spec, &candidate);

        state.touch();
        let pending = PendingReview {
            ticket: state.seq,
            section: section.clone(),
            candidate,
            report,
        };
        let payload = self.gate.payload(&spec, &pending, record.retry_count);
        state.pending = Some(pending);
        state.phase = SessionPhase::AwaitingReview;
        self.store.save(state)?;

        info!(session = %state.id, section = %section, ticket = state.seq,
              errors = payload.errors.len(), "suspended for review");
        Ok(payload)
    }

    /// Re-assemble the review payload for the active suspension, if any.
    ///
    /// Lets a presentation layer re-present the checkpoint after a
    /// restart without re-drafting.
    pub fn pending_payload(&self, state: &SessionState) -> Option<ReviewPayload> {
        let pending = state.pending.as_ref()?;
        let spec = state.form.section(&pending.section)?;
        let retry_count = state
            .record(&pending.section)
            .map(|r| r.retry_count)
            .unwrap_or(0);
        Some(self.gate.payload(spec, pending, retry_count))
    }

    /// Resume a suspended session with a human decision.
    ///
    /// The decision must echo the ticket of the suspension it answers; a
    /// decision against a stale or already-resolved suspension is
    /// rejected with the persisted state left unchanged.
    pub fn resume(
        &self,
        state: &mut SessionState,
        ticket: u64,
        decision: ReviewDecision,
    ) -> Result<Resumption, SessionError> {
        if state.is_terminal() {
            return Err(SessionError::SessionComplete {
                id: state.id.clone(),
            });
        }

        let pending = state.pending.as_ref().ok_or(SessionError::NoPendingReview {
            id: state.id.clone(),
        })?;
        if pending.ticket != ticket {
            return Err(SessionError::StaleTicket {
                expected: pending.ticket,
                got: ticket,
            });
        }

        let record = state
            .record(&pending.section)
            .cloned()
            .expect("pending review for unknown section");
        let outcome = self.gate.apply(&record, pending, decision);

        // Validated: consume the suspension and apply the outcome.
        let pending = state.pending.take().expect("pending vanished mid-resume");
        let section = pending.section;

        let resumption = match outcome {
            GateOutcome::Approved { committed } => {
                let record = state.record_mut(&section).expect("record vanished");
                record.values = committed;
                record.feedback.clear();
                record.annotation = None;
                scheduler::commit_section(state, &section);
                info!(session = %state.id, section = %section, "section committed");
                Resumption::SectionCommitted {
                    section,
                    next: state.current_section.clone(),
                }
            }

            GateOutcome::Skipped {
                retained,
                annotation,
            } => {
                let record = state.record_mut(&section).expect("record vanished");
                record.values = retained;
                record.feedback.clear();
                record.annotation = Some(annotation);
                scheduler::commit_section(state, &section);
                info!(session = %state.id, section = %section, "section skipped");
                Resumption::SectionSkipped {
                    section,
                    next: state.current_section.clone(),
                }
            }

            GateOutcome::RetryScheduled {
                merged,
                feedback,
                retry_count,
            } => {
                let record = state.record_mut(&section).expect("record vanished");
                record.values = merged;
                record.feedback = feedback;
                record.retry_count = retry_count;
                state.phase = SessionPhase::Drafting;
                info!(session = %state.id, section = %section, retry_count,
                      "retry scheduled");
                Resumption::RetryScheduled {
                    section,
                    retry_count,
                }
            }

            GateOutcome::ResetSection { forced } => {
                let record = state.record_mut(&section).expect("record vanished");
                record.clear();
                state.phase = SessionPhase::Drafting;
                if forced {
                    warn!(session = %state.id, section = %section,
                          max_retries = self.gate.max_retries(),
                          "retry budget exhausted; forced reset");
                } else {
                    info!(session = %state.id, section = %section, "section reset");
                }
                Resumption::SectionReset { section, forced }
            }
        };

        state.touch();
        self.store.save(state)?;

        if state.is_terminal() {
            info!(session = %state.id, "form complete");
        }
        Ok(resumption)
    }

    /// Explicitly reopen a completed section for correction.
    pub fn reopen(&self, state: &mut SessionState, section: &str) -> Result<(), SessionError> {
        scheduler::reopen_section(state, section)?;
        state.touch();
        self.store.save(state)?;
        info!(session = %state.id, section = %section, "section reopened");
        Ok(())
    }

    /// Whole-form progress.
    pub fn progress(&self, state: &SessionState) -> FormProgress {
        progress::progress_of(state)
    }

    /// The final summary; only valid once the session is terminal.
    pub fn summary(&self, state: &SessionState) -> Result<FormSummary, SessionError> {
        progress::summary_of(state)
    }
}
