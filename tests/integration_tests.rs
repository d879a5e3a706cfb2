//! Integration tests for intake
//!
//! These tests drive the CLI end-to-end for everything non-interactive,
//! and use the library crate to seed sessions where the interactive loop
//! would otherwise be required.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

use intake::orchestrator::Orchestrator;
use intake::store::JsonSessionStore;
use intake_common::{
    FieldSpec, FieldType, FieldValue, FieldValues, FormSpec, ReviewDecision, ScriptedDrafter,
    SectionSpec,
};

/// Helper to create an intake Command
fn intake() -> Command {
    cargo_bin_cmd!("intake")
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Helper to initialize an intake project in a temp directory
fn init_intake_project(dir: &TempDir) {
    intake()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

fn two_section_form() -> FormSpec {
    FormSpec::new(
        "minimal",
        vec![
            SectionSpec::new(
                "personal_information",
                vec![
                    FieldSpec::new("first_name", FieldType::Text, true, "First name"),
                    FieldSpec::new("last_name", FieldType::Text, true, "Last name"),
                ],
            ),
            SectionSpec::new(
                "contact_details",
                vec![FieldSpec::new("email", FieldType::Text, true, "Email address")],
            ),
        ],
    )
}

fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::text(*v)))
        .collect()
}

fn orchestrator_for(project: &Path) -> Orchestrator<JsonSessionStore> {
    let store = JsonSessionStore::new(project.join(".intake/sessions")).unwrap();
    Orchestrator::new(store, 3)
}

/// Seed a session with one section committed, suspended on the second.
async fn seed_in_progress_session(project: &Path) -> String {
    let orch = orchestrator_for(project);
    let mut state = orch.create_session(two_section_form()).unwrap();

    let drafter = ScriptedDrafter::new(vec![
        values(&[("first_name", "Jane"), ("last_name", "Doe")]),
        values(&[("email", "jane@example.com")]),
    ]);

    let payload = orch.draft(&mut state, &drafter).await.unwrap();
    orch.resume(&mut state, payload.ticket, ReviewDecision::Approve)
        .unwrap();
    orch.draft(&mut state, &drafter).await.unwrap();
    state.id
}

/// Seed a fully completed two-section session.
async fn seed_completed_session(project: &Path) -> String {
    let orch = orchestrator_for(project);
    let mut state = orch.create_session(two_section_form()).unwrap();

    let drafter = ScriptedDrafter::new(vec![
        values(&[("first_name", "Jane"), ("last_name", "Doe")]),
        values(&[("email", "jane@example.com")]),
    ]);

    for _ in 0..2 {
        let payload = orch.draft(&mut state, &drafter).await.unwrap();
        orch.resume(&mut state, payload.ticket, ReviewDecision::Approve)
            .unwrap();
    }
    assert!(state.is_terminal());
    state.id
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_intake_help() {
        intake().arg("--help").assert().success();
    }

    #[test]
    fn test_intake_version() {
        intake().arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        intake().arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Init Tests
// =============================================================================

mod init {
    use super::*;

    #[test]
    fn test_init_creates_structure() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        let intake_dir = dir.path().join(".intake");
        for sub in ["forms", "sessions", "audit", "logs"] {
            assert!(intake_dir.join(sub).is_dir(), "{sub} must exist");
        }
        assert!(intake_dir.join("intake.toml").is_file());
        assert!(intake_dir.join("forms/registration.yaml").is_file());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        init_intake_project(&dir);
    }

    #[test]
    fn test_seeded_form_is_loadable() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        let form =
            FormSpec::load(&dir.path().join(".intake/forms/registration.yaml")).unwrap();
        assert_eq!(form.name, "registration");
        assert_eq!(form.sections.len(), 4);
    }
}

// =============================================================================
// Forms Tests
// =============================================================================

mod forms {
    use super::*;

    #[test]
    fn test_forms_requires_init() {
        let dir = create_temp_project();
        intake()
            .current_dir(dir.path())
            .arg("forms")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not initialized"));
    }

    #[test]
    fn test_forms_lists_seeded_form() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .arg("forms")
            .assert()
            .success()
            .stdout(predicate::str::contains("registration"));
    }
}

// =============================================================================
// Session Listing and Status Tests
// =============================================================================

mod sessions {
    use super::*;

    #[test]
    fn test_sessions_empty_message() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .arg("sessions")
            .assert()
            .success()
            .stdout(predicate::str::contains("No sessions yet"));
    }

    #[tokio::test]
    async fn test_sessions_lists_seeded_session() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_in_progress_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .arg("sessions")
            .assert()
            .success()
            .stdout(predicate::str::contains(id))
            .stdout(predicate::str::contains("minimal"));
    }

    #[tokio::test]
    async fn test_status_shows_section_states() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_in_progress_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .args(["status", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("personal_information"))
            .stdout(predicate::str::contains("done"))
            .stdout(predicate::str::contains("awaiting review"));
    }

    #[test]
    fn test_status_unknown_session_fails() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .args(["status", "no-such-session"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No session found"));
    }
}

// =============================================================================
// Summary Tests
// =============================================================================

mod summary {
    use super::*;

    #[tokio::test]
    async fn test_summary_rejects_incomplete_session() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_in_progress_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .args(["summary", &id])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not complete"));
    }

    #[tokio::test]
    async fn test_summary_dumps_completed_session() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_completed_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .args(["summary", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("Form complete"))
            .stdout(predicate::str::contains("jane@example.com"))
            .stdout(predicate::str::contains("Jane"));
    }
}

// =============================================================================
// Delete Tests
// =============================================================================

mod delete {
    use super::*;

    #[tokio::test]
    async fn test_delete_force_removes_session() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_completed_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .args(["delete", &id, "--force"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted session"));

        intake()
            .current_dir(dir.path())
            .args(["status", &id])
            .assert()
            .failure();
    }

    #[test]
    fn test_delete_unknown_session_fails() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .args(["delete", "ghost", "--force"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No session found"));
    }
}

// =============================================================================
// Start/Resume Guard Tests
// =============================================================================

mod run_guards {
    use super::*;

    #[test]
    fn test_start_requires_init() {
        let dir = create_temp_project();
        intake()
            .current_dir(dir.path())
            .args(["start", "registration"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not initialized"));
    }

    #[test]
    fn test_start_unknown_form_fails() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .args(["start", "no-such-form"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No form spec found"));
    }

    #[test]
    fn test_resume_unknown_session_fails() {
        let dir = create_temp_project();
        init_intake_project(&dir);

        intake()
            .current_dir(dir.path())
            .args(["resume", "no-such-session"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No session found"));
    }

    #[tokio::test]
    async fn test_resume_completed_session_points_at_summary() {
        let dir = create_temp_project();
        init_intake_project(&dir);
        let id = seed_completed_session(dir.path()).await;

        intake()
            .current_dir(dir.path())
            .args(["resume", &id])
            .assert()
            .success()
            .stdout(predicate::str::contains("already complete"));
    }
}
