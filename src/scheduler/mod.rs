//! Section scheduling: ordering, advancement and explicit revisits.
//!
//! Sections form a fixed pipeline in form-spec order — not a DAG, and not
//! reorderable by the user. The scheduler decides what the orchestrator
//! should do next and performs the commit/advance bookkeeping; it never
//! advances past a section that has not been committed by a human
//! decision.

use chrono::Utc;
use intake_common::FormSpec;

use crate::errors::SessionError;
use crate::session::{SessionPhase, SessionState};

/// What the orchestrator should do next for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Draft a candidate for the named section
    DraftSection(String),
    /// Suspended: a review is pending and only a human decision moves on
    AwaitReview,
    /// Every section is complete
    Finish,
}

/// Decide the next action for a session.
pub fn next_action(state: &SessionState) -> NextAction {
    if state.pending.is_some() {
        return NextAction::AwaitReview;
    }
    if state.is_terminal() || state.completed.len() == state.form.sections.len() {
        return NextAction::Finish;
    }
    match &state.current_section {
        Some(section) => NextAction::DraftSection(section.clone()),
        None => match next_section(&state.form, &state.completed) {
            Some(section) => NextAction::DraftSection(section),
            None => NextAction::Finish,
        },
    }
}

/// First section in spec order that is not yet completed.
pub fn next_section(form: &FormSpec, completed: &[String]) -> Option<String> {
    form.sections
        .iter()
        .map(|s| s.name.as_str())
        .find(|name| !completed.iter().any(|c| c == name))
        .map(str::to_string)
}

/// Commit a section: add it to the completed set (exactly once), stamp
/// its record, and advance `current_section` to the next incomplete
/// section — or flip the session to `Complete` when none remain.
pub fn commit_section(state: &mut SessionState, section: &str) {
    if !state.is_completed(section) {
        state.completed.push(section.to_string());
    }
    if let Some(record) = state.record_mut(section) {
        record.completed_at = Some(Utc::now());
    }

    match next_section(&state.form, &state.completed) {
        Some(next) => {
            state.current_section = Some(next);
            state.phase = SessionPhase::Drafting;
        }
        None => {
            state.current_section = None;
            state.phase = SessionPhase::Complete;
        }
    }
}

/// Explicitly reopen a completed section for correction.
///
/// This is the only path by which the completed set shrinks, and it is
/// human-triggered, never inferred. Rejected while a review is pending
/// (resolve the suspension first) and on terminal sessions (a finished
/// form is read-only).
pub fn reopen_section(state: &mut SessionState, section: &str) -> Result<(), SessionError> {
    if state.is_terminal() {
        return Err(SessionError::SessionComplete {
            id: state.id.clone(),
        });
    }
    if let Some(pending) = &state.pending {
        return Err(SessionError::ReviewPending {
            section: pending.section.clone(),
        });
    }
    if state.form.section(section).is_none() {
        return Err(SessionError::UnknownSection {
            form: state.form.name.clone(),
            section: section.to_string(),
        });
    }
    if !state.is_completed(section) {
        return Err(SessionError::SectionNotCompleted {
            section: section.to_string(),
        });
    }

    state.completed.retain(|s| s != section);
    if let Some(record) = state.record_mut(section) {
        record.completed_at = None;
        record.annotation = None;
    }
    state.current_section = Some(section.to_string());
    state.phase = SessionPhase::Drafting;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_common::{FieldSpec, FieldType, SectionSpec, ValidationReport};

    use crate::session::PendingReview;

    fn form() -> FormSpec {
        FormSpec::new(
            "registration",
            vec![
                SectionSpec::new(
                    "personal_information",
                    vec![FieldSpec::new("first_name", FieldType::Text, true, "First name")],
                ),
                SectionSpec::new(
                    "contact_details",
                    vec![FieldSpec::new("email", FieldType::Text, true, "Email")],
                ),
                SectionSpec::new(
                    "preferences",
                    vec![FieldSpec::new("newsletter", FieldType::Boolean, false, "Subscribe")],
                ),
            ],
        )
    }

    #[test]
    fn test_fresh_session_drafts_first_section() {
        let state = SessionState::new("s1", form());
        assert_eq!(
            next_action(&state),
            NextAction::DraftSection("personal_information".to_string())
        );
    }

    #[test]
    fn test_pending_review_always_awaits() {
        let mut state = SessionState::new("s1", form());
        state.phase = SessionPhase::AwaitingReview;
        state.pending = Some(PendingReview {
            ticket: 1,
            section: "personal_information".to_string(),
            candidate: Default::default(),
            report: ValidationReport::default(),
        });
        assert_eq!(next_action(&state), NextAction::AwaitReview);
    }

    #[test]
    fn test_commit_advances_in_spec_order() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");

        assert_eq!(state.completed, vec!["personal_information"]);
        assert_eq!(state.current_section.as_deref(), Some("contact_details"));
        assert_eq!(state.phase, SessionPhase::Drafting);
        assert!(
            state
                .record("personal_information")
                .unwrap()
                .completed_at
                .is_some()
        );
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_commit_is_idempotent_on_completed_set() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");
        commit_section(&mut state, "personal_information");
        assert_eq!(state.completed, vec!["personal_information"]);
    }

    #[test]
    fn test_last_commit_finishes_the_session() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");
        commit_section(&mut state, "contact_details");
        commit_section(&mut state, "preferences");

        assert_eq!(state.phase, SessionPhase::Complete);
        assert!(state.current_section.is_none());
        assert_eq!(next_action(&state), NextAction::Finish);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_next_section_skips_completed_out_of_order() {
        let spec = form();
        let completed = vec!["personal_information".to_string(), "preferences".to_string()];
        assert_eq!(
            next_section(&spec, &completed),
            Some("contact_details".to_string())
        );
    }

    #[test]
    fn test_reopen_moves_section_back_to_current() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");

        reopen_section(&mut state, "personal_information").unwrap();
        assert!(!state.is_completed("personal_information"));
        assert_eq!(
            state.current_section.as_deref(),
            Some("personal_information")
        );
        assert_eq!(state.phase, SessionPhase::Drafting);
        state.check_invariants().unwrap();
    }

    #[test]
    fn test_reopen_rejects_incomplete_section() {
        let mut state = SessionState::new("s1", form());
        let err = reopen_section(&mut state, "contact_details").unwrap_err();
        assert!(matches!(err, SessionError::SectionNotCompleted { .. }));
    }

    #[test]
    fn test_reopen_rejects_unknown_section() {
        let mut state = SessionState::new("s1", form());
        let err = reopen_section(&mut state, "no_such_section").unwrap_err();
        assert!(matches!(err, SessionError::UnknownSection { .. }));
    }

    #[test]
    fn test_reopen_rejects_terminal_session() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");
        commit_section(&mut state, "contact_details");
        commit_section(&mut state, "preferences");

        let err = reopen_section(&mut state, "personal_information").unwrap_err();
        assert!(matches!(err, SessionError::SessionComplete { .. }));
    }

    #[test]
    fn test_reopen_rejects_while_review_pending() {
        let mut state = SessionState::new("s1", form());
        commit_section(&mut state, "personal_information");
        state.phase = SessionPhase::AwaitingReview;
        state.pending = Some(PendingReview {
            ticket: 3,
            section: "contact_details".to_string(),
            candidate: Default::default(),
            report: ValidationReport::default(),
        });

        let err = reopen_section(&mut state, "personal_information").unwrap_err();
        assert!(matches!(err, SessionError::ReviewPending { .. }));
    }
}
