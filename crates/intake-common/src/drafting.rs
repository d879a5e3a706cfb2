//! The drafting-service boundary.
//!
//! The orchestrator never parses free text; it hands the active section
//! spec plus context to a `DraftingService` and gets back a shaped field
//! map or a typed failure. Implementations range from a language model to
//! an interactive prompt loop to a scripted test double.

use async_trait::async_trait;
use thiserror::Error;

use crate::field::FieldValues;
use crate::review::DraftContext;
use crate::section::SectionSpec;

/// Failure of the drafting service. Always retryable from the
/// orchestrator's point of view; the session stays in its drafting state.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Drafting service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Drafting service returned an unusable candidate: {reason}")]
    Malformed { reason: String },

    #[error("Drafting was interrupted before a candidate was produced")]
    Interrupted,
}

/// Proposes candidate field values for the active section.
#[async_trait]
pub trait DraftingService: Send + Sync {
    /// Produce a candidate field map for `section`.
    ///
    /// `ctx` carries values already on record, reviewer feedback from the
    /// previous round and the retry count, so a service can refine rather
    /// than start over.
    async fn draft(
        &self,
        section: &SectionSpec,
        ctx: &DraftContext,
    ) -> Result<FieldValues, DraftError>;
}

/// A scripted drafting service that replays queued candidates in order.
///
/// Intended for tests and demos; a `draft` call past the end of the
/// script fails as `Unavailable`.
pub struct ScriptedDrafter {
    script: std::sync::Mutex<std::collections::VecDeque<Result<FieldValues, DraftError>>>,
}

impl ScriptedDrafter {
    /// Create a drafter that replays `candidates` in order.
    pub fn new(candidates: Vec<FieldValues>) -> Self {
        Self {
            script: std::sync::Mutex::new(candidates.into_iter().map(Ok).collect()),
        }
    }

    /// Create a drafter from explicit results, failures included.
    pub fn from_results(results: Vec<Result<FieldValues, DraftError>>) -> Self {
        Self {
            script: std::sync::Mutex::new(results.into_iter().collect()),
        }
    }
}

#[async_trait]
impl DraftingService for ScriptedDrafter {
    async fn draft(
        &self,
        _section: &SectionSpec,
        _ctx: &DraftContext,
    ) -> Result<FieldValues, DraftError> {
        self.script
            .lock()
            .expect("scripted drafter mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(DraftError::Unavailable {
                    reason: "script exhausted".to_string(),
                })
            })
    }
}

/// Drafter that returns the context's existing values verbatim.
pub struct EchoDrafter;

#[async_trait]
impl DraftingService for EchoDrafter {
    async fn draft(
        &self,
        _section: &SectionSpec,
        ctx: &DraftContext,
    ) -> Result<FieldValues, DraftError> {
        Ok(ctx.existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    fn section() -> SectionSpec {
        SectionSpec::new("personal_information", vec![])
    }

    #[tokio::test]
    async fn test_scripted_drafter_replays_in_order() {
        let mut first = FieldValues::new();
        first.insert("first_name".into(), FieldValue::text("Jane"));
        let second = FieldValues::new();

        let drafter = ScriptedDrafter::new(vec![first.clone(), second.clone()]);
        let ctx = DraftContext::default();

        assert_eq!(drafter.draft(&section(), &ctx).await.unwrap(), first);
        assert_eq!(drafter.draft(&section(), &ctx).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_scripted_drafter_fails_when_exhausted() {
        let drafter = ScriptedDrafter::new(vec![]);
        let ctx = DraftContext::default();
        let err = drafter.draft(&section(), &ctx).await.unwrap_err();
        assert!(matches!(err, DraftError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_echo_drafter_returns_existing_values() {
        let mut existing = FieldValues::new();
        existing.insert("first_name".into(), FieldValue::text("Jane"));
        let ctx = DraftContext {
            existing: existing.clone(),
            ..Default::default()
        };

        let drafter = EchoDrafter;
        assert_eq!(drafter.draft(&section(), &ctx).await.unwrap(), existing);
    }
}
