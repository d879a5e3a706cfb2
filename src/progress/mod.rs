//! Completion accounting: whole-form progress and the final summary.

use chrono::{DateTime, Utc};
use intake_common::{FieldValues, is_bookkeeping_key};
use serde::{Deserialize, Serialize};

use crate::errors::SessionError;
use crate::session::SessionState;

/// Whole-form progress, queryable at any point in the session lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormProgress {
    pub completed_count: usize,
    pub total_count: usize,
    pub percentage: f64,
}

/// Compute progress for a session. A zero-section form counts as fully
/// complete.
pub fn progress_of(state: &SessionState) -> FormProgress {
    let total_count = state.form.sections.len();
    let completed_count = state.completed.len();
    let percentage = if total_count == 0 {
        100.0
    } else {
        (completed_count as f64 / total_count as f64) * 100.0
    };
    FormProgress {
        completed_count,
        total_count,
        percentage,
    }
}

/// One section's slice of the final summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub name: String,
    pub title: String,
    pub values: FieldValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// The final per-section field dump plus field-level statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    pub form: String,
    /// Sections in completion order
    pub sections: Vec<SectionSummary>,
    pub completed_sections: usize,
    pub total_fields: usize,
    pub completed_fields: usize,
    /// 100 x completed_fields / total_fields
    pub completion_rate: f64,
    pub complete: bool,
}

/// Build the final summary. Only valid once the session is terminal;
/// anything earlier is rejected so a partial form can never masquerade as
/// a finished one.
pub fn summary_of(state: &SessionState) -> Result<FormSummary, SessionError> {
    if !state.is_terminal() {
        return Err(SessionError::FormIncomplete {
            completed: state.completed.len(),
            total: state.form.sections.len(),
        });
    }

    let mut sections = Vec::new();
    let mut completed_fields = 0usize;

    for name in &state.completed {
        let record = state.record(name).cloned().unwrap_or_default();
        let values: FieldValues = record
            .values
            .iter()
            .filter(|(k, _)| !is_bookkeeping_key(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        completed_fields += values.values().filter(|v| !v.is_empty()).count();

        let title = state
            .form
            .section(name)
            .map(|s| s.display_title())
            .unwrap_or_else(|| name.clone());

        sections.push(SectionSummary {
            name: name.clone(),
            title,
            values,
            annotation: record.annotation,
            completed_at: record.completed_at,
        });
    }

    let total_fields = state.form.total_fields();
    let completion_rate = if total_fields == 0 {
        100.0
    } else {
        (completed_fields as f64 / total_fields as f64) * 100.0
    };

    Ok(FormSummary {
        form: state.form.name.clone(),
        sections,
        completed_sections: state.completed.len(),
        total_fields,
        completed_fields,
        completion_rate,
        complete: true,
    })
}
