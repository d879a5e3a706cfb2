//! Shared domain types for the intake form orchestrator.
//!
//! This crate defines the vocabulary the orchestrator and its
//! collaborators speak: field and section specifications, typed field
//! values and refinement rules, the payload/decision pair that crosses
//! the review-gate suspension boundary, and the drafting-service
//! contract. It contains no orchestration logic.

pub mod drafting;
pub mod field;
pub mod review;
pub mod section;

pub use drafting::{DraftError, DraftingService, EchoDrafter, ScriptedDrafter};
pub use field::{
    BOOKKEEPING_PREFIX, FieldRule, FieldSpec, FieldType, FieldValue, FieldValues,
    is_bookkeeping_key,
};
pub use review::{DraftContext, ReviewDecision, ReviewPayload, ValidationReport};
pub use section::{FormSpec, FormSpecError, SectionSpec};
