//! The review gate: the human checkpoint between a drafted candidate and
//! a committed section.
//!
//! `payload` packages everything a reviewer needs; `apply` turns their
//! decision into a `GateOutcome`. The retry budget is enforced here and
//! is load-bearing: a retry that would push the count past the budget is
//! converted to a forced reset, never silently allowed through.

use intake_common::{
    FieldValues, ReviewDecision, ReviewPayload, SectionSpec, is_bookkeeping_key,
};

use crate::session::{PendingReview, SectionRecord};

/// Default correction budget per section.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Result of applying a human decision to a pending review.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// Candidate accepted; bookkeeping keys already stripped
    Approved { committed: FieldValues },
    /// Corrections merged, another draft/review round follows
    RetryScheduled {
        merged: FieldValues,
        feedback: Vec<String>,
        retry_count: u32,
    },
    /// Section completed with the dirty candidate retained verbatim
    Skipped {
        retained: FieldValues,
        annotation: String,
    },
    /// Section cleared to a blank slate; `forced` marks a budget
    /// exhaustion rather than an explicit reset request
    ResetSection { forced: bool },
}

/// The review gate with its per-section retry budget.
#[derive(Debug, Clone, Copy)]
pub struct ReviewGate {
    max_retries: u32,
}

impl Default for ReviewGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl ReviewGate {
    /// Create a gate with the given retry budget.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// The configured retry budget.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Assemble the payload that crosses the suspension boundary outward.
    pub fn payload(
        &self,
        spec: &SectionSpec,
        pending: &PendingReview,
        retry_count: u32,
    ) -> ReviewPayload {
        ReviewPayload {
            ticket: pending.ticket,
            section: spec.name.clone(),
            section_title: spec.display_title(),
            fields: spec.fields.clone(),
            candidate: pending.candidate.clone(),
            errors: pending.report.errors.clone(),
            warnings: pending.report.warnings.clone(),
            completion_score: pending.report.completion_score,
            retry_count,
        }
    }

    /// Apply a decision to the pending review for `record`.
    ///
    /// Approval overrides outstanding validation errors by design — the
    /// human is the final authority. A retry that would exceed the budget
    /// comes back as `ResetSection { forced: true }` regardless of the
    /// caller's intent.
    pub fn apply(
        &self,
        record: &SectionRecord,
        pending: &PendingReview,
        decision: ReviewDecision,
    ) -> GateOutcome {
        match decision {
            ReviewDecision::Approve => GateOutcome::Approved {
                committed: strip_bookkeeping(&pending.candidate),
            },

            ReviewDecision::Retry {
                corrections,
                feedback,
            } => {
                let retry_count = record.retry_count + 1;
                if retry_count > self.max_retries {
                    return GateOutcome::ResetSection { forced: true };
                }

                // Corrections win on key collision.
                let mut merged = pending.candidate.clone();
                for (key, value) in corrections {
                    merged.insert(key, value);
                }

                GateOutcome::RetryScheduled {
                    merged,
                    feedback,
                    retry_count,
                }
            }

            ReviewDecision::Skip => GateOutcome::Skipped {
                retained: pending.candidate.clone(),
                annotation: format!(
                    "skipped with {} validation issues",
                    pending.report.errors.len()
                ),
            },

            ReviewDecision::Reset => GateOutcome::ResetSection { forced: false },
        }
    }
}

/// Drop internal bookkeeping keys before committing values.
fn strip_bookkeeping(values: &FieldValues) -> FieldValues {
    values
        .iter()
        .filter(|(k, _)| !is_bookkeeping_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_common::{FieldSpec, FieldType, FieldValue, ValidationReport};

    fn spec() -> SectionSpec {
        SectionSpec::new(
            "personal_information",
            vec![
                FieldSpec::new("first_name", FieldType::Text, true, "First name"),
                FieldSpec::new("last_name", FieldType::Text, true, "Last name"),
            ],
        )
    }

    fn pending(errors: Vec<&str>) -> PendingReview {
        let mut candidate = FieldValues::new();
        candidate.insert("first_name".to_string(), FieldValue::text(""));
        candidate.insert("last_name".to_string(), FieldValue::text("Doe"));
        candidate.insert("_draft_round".to_string(), FieldValue::Integer(1));

        PendingReview {
            ticket: 1,
            section: "personal_information".to_string(),
            candidate,
            report: ValidationReport {
                errors: errors.into_iter().map(str::to_string).collect(),
                warnings: vec![],
                completion_score: 50.0,
            },
        }
    }

    #[test]
    fn test_payload_carries_field_descriptions_and_findings() {
        let gate = ReviewGate::default();
        let payload = gate.payload(&spec(), &pending(vec!["Missing required field: first_name"]), 2);

        assert_eq!(payload.ticket, 1);
        assert_eq!(payload.section, "personal_information");
        assert_eq!(payload.section_title, "Personal Information");
        assert_eq!(payload.fields.len(), 2);
        assert_eq!(payload.errors.len(), 1);
        assert_eq!(payload.retry_count, 2);
    }

    #[test]
    fn test_approve_strips_bookkeeping_keys() {
        let gate = ReviewGate::default();
        let record = SectionRecord::default();

        match gate.apply(&record, &pending(vec![]), ReviewDecision::Approve) {
            GateOutcome::Approved { committed } => {
                assert!(committed.contains_key("first_name"));
                assert!(committed.contains_key("last_name"));
                assert!(!committed.contains_key("_draft_round"));
            }
            other => panic!("expected Approved, got {:?}", other),
        }
    }

    #[test]
    fn test_approve_overrides_outstanding_errors() {
        let gate = ReviewGate::default();
        let record = SectionRecord::default();
        let outcome = gate.apply(
            &record,
            &pending(vec!["Missing required field: first_name"]),
            ReviewDecision::Approve,
        );
        assert!(matches!(outcome, GateOutcome::Approved { .. }));
    }

    #[test]
    fn test_retry_merges_corrections_over_candidate() {
        let gate = ReviewGate::default();
        let record = SectionRecord::default();

        let mut corrections = FieldValues::new();
        corrections.insert("first_name".to_string(), FieldValue::text("Jane"));

        match gate.apply(
            &record,
            &pending(vec!["Missing required field: first_name"]),
            ReviewDecision::Retry {
                corrections,
                feedback: vec!["first name was blank".to_string()],
            },
        ) {
            GateOutcome::RetryScheduled {
                merged,
                feedback,
                retry_count,
            } => {
                assert_eq!(merged.get("first_name"), Some(&FieldValue::text("Jane")));
                assert_eq!(merged.get("last_name"), Some(&FieldValue::text("Doe")));
                assert_eq!(retry_count, 1);
                assert_eq!(feedback, vec!["first name was blank".to_string()]);
            }
            other => panic!("expected RetryScheduled, got {:?}", other),
        }
    }

    #[test]
    fn test_retry_past_budget_forces_reset() {
        let gate = ReviewGate::new(3);
        let record = SectionRecord {
            retry_count: 3,
            ..Default::default()
        };

        let outcome = gate.apply(
            &record,
            &pending(vec!["still broken"]),
            ReviewDecision::Retry {
                corrections: FieldValues::new(),
                feedback: vec![],
            },
        );
        assert_eq!(outcome, GateOutcome::ResetSection { forced: true });
    }

    #[test]
    fn test_retry_at_budget_is_still_allowed() {
        let gate = ReviewGate::new(3);
        let record = SectionRecord {
            retry_count: 2,
            ..Default::default()
        };

        match gate.apply(
            &record,
            &pending(vec![]),
            ReviewDecision::Retry {
                corrections: FieldValues::new(),
                feedback: vec![],
            },
        ) {
            GateOutcome::RetryScheduled { retry_count, .. } => assert_eq!(retry_count, 3),
            other => panic!("expected RetryScheduled, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_retains_candidate_verbatim_with_annotation() {
        let gate = ReviewGate::default();
        let record = SectionRecord::default();
        let p = pending(vec!["error one", "error two"]);

        match gate.apply(&record, &p, ReviewDecision::Skip) {
            GateOutcome::Skipped {
                retained,
                annotation,
            } => {
                assert_eq!(retained, p.candidate, "skip must retain values verbatim");
                assert_eq!(annotation, "skipped with 2 validation issues");
            }
            other => panic!("expected Skipped, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_reset_is_not_forced() {
        let gate = ReviewGate::default();
        let record = SectionRecord::default();
        let outcome = gate.apply(&record, &pending(vec![]), ReviewDecision::Reset);
        assert_eq!(outcome, GateOutcome::ResetSection { forced: false });
    }
}
