//! Persistent transition audit log.
//!
//! One JSON line per committed transition, appended to
//! `.intake/audit/<session>.jsonl`. A forced reset (retry budget
//! exhausted) is recorded as its own event kind so "user correcting" and
//! "system forced restart" stay distinguishable in the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// A single audited transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
    SessionCreated {
        form: String,
    },
    DraftRequested {
        section: String,
    },
    DraftFailed {
        section: String,
        reason: String,
    },
    ReviewSuspended {
        section: String,
        ticket: u64,
        errors: usize,
        warnings: usize,
    },
    SectionCommitted {
        section: String,
    },
    SectionSkipped {
        section: String,
        issues: usize,
    },
    RetryScheduled {
        section: String,
        retry_count: u32,
    },
    /// An explicit reset requested at the gate
    SectionReset {
        section: String,
    },
    /// Retry budget exhausted; the reset was forced, not requested
    ForcedReset {
        section: String,
        max_retries: u32,
    },
    SectionReopened {
        section: String,
    },
    SessionCompleted,
    SessionDeleted,
}

/// An audit line: the event plus session id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub session: String,
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: TransitionEvent,
}

/// Append-only JSONL transition log, one file per session.
pub struct TransitionLog {
    audit_dir: PathBuf,
}

impl TransitionLog {
    /// Create a log rooted at `audit_dir`, creating the directory if
    /// needed.
    pub fn new(audit_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let audit_dir = audit_dir.as_ref().to_path_buf();
        fs::create_dir_all(&audit_dir).map_err(|source| StoreError::Io {
            path: audit_dir.clone(),
            source,
        })?;
        Ok(Self { audit_dir })
    }

    fn log_file(&self, session: &str) -> PathBuf {
        self.audit_dir.join(format!("{}.jsonl", session))
    }

    /// Append one event for a session.
    pub fn append(&self, session: &str, event: TransitionEvent) -> Result<(), StoreError> {
        let record = AuditRecord {
            session: session.to_string(),
            at: Utc::now(),
            event,
        };
        let line = serde_json::to_string(&record).map_err(|source| StoreError::Serialize {
            id: session.to_string(),
            source,
        })?;

        let path = self.log_file(session);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        writeln!(file, "{}", line).map_err(|source| StoreError::Io { path, source })
    }

    /// Read every recorded event for a session, in append order.
    pub fn read(&self, session: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let path = self.log_file(session);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read_in_order() {
        let dir = tempdir().unwrap();
        let log = TransitionLog::new(dir.path()).unwrap();

        log.append(
            "s1",
            TransitionEvent::SessionCreated {
                form: "registration".to_string(),
            },
        )
        .unwrap();
        log.append(
            "s1",
            TransitionEvent::DraftRequested {
                section: "personal_information".to_string(),
            },
        )
        .unwrap();

        let records = log.read("s1").unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[0].event,
            TransitionEvent::SessionCreated { .. }
        ));
        assert!(matches!(
            records[1].event,
            TransitionEvent::DraftRequested { .. }
        ));
    }

    #[test]
    fn test_forced_reset_is_a_distinct_event_kind() {
        let dir = tempdir().unwrap();
        let log = TransitionLog::new(dir.path()).unwrap();

        log.append(
            "s1",
            TransitionEvent::SectionReset {
                section: "preferences".to_string(),
            },
        )
        .unwrap();
        log.append(
            "s1",
            TransitionEvent::ForcedReset {
                section: "preferences".to_string(),
                max_retries: 3,
            },
        )
        .unwrap();

        let content =
            std::fs::read_to_string(dir.path().join("s1.jsonl")).unwrap();
        assert!(content.contains("\"event\":\"section_reset\""));
        assert!(content.contains("\"event\":\"forced_reset\""));
    }

    #[test]
    fn test_read_unknown_session_is_empty() {
        let dir = tempdir().unwrap();
        let log = TransitionLog::new(dir.path()).unwrap();
        assert!(log.read("nope").unwrap().is_empty());
    }

    #[test]
    fn test_sessions_log_independently() {
        let dir = tempdir().unwrap();
        let log = TransitionLog::new(dir.path()).unwrap();

        log.append("s1", TransitionEvent::SessionCompleted).unwrap();
        log.append("s2", TransitionEvent::SessionDeleted).unwrap();

        assert_eq!(log.read("s1").unwrap().len(), 1);
        assert_eq!(log.read("s2").unwrap().len(), 1);
    }
}
