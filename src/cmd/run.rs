//! Interactive session loop — `intake start` and `intake resume`.
//!
//! Drives the orchestrator round by round: draft at the terminal, review
//! at the gate, apply the decision, loop. "Save and exit" (or an
//! interrupted prompt) leaves the persisted suspension behind for a later
//! `intake resume`.

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

use intake::audit::{TransitionEvent, TransitionLog};
use intake::config::Config;
use intake::errors::SessionError;
use intake::init::is_initialized;
use intake::orchestrator::{Orchestrator, Resumption};
use intake::session::SessionState;
use intake::store::{JsonSessionStore, SessionStore};
use intake::ui::{IntakeUi, InteractiveDrafter, PromptResult};
use intake_common::FormSpec;

use crate::Cli;

pub async fn cmd_start(cli: &Cli, form_ref: &str, project_dir: PathBuf) -> Result<()> {
    let (config, orch, audit) = setup(cli, project_dir)?;

    let form_path = config.resolve_form(form_ref)?;
    let form = FormSpec::load(&form_path)
        .with_context(|| format!("Failed to load form spec: {}", form_path.display()))?;

    let mut state = orch.create_session(form)?;
    audit.append(
        &state.id,
        TransitionEvent::SessionCreated {
            form: state.form.name.clone(),
        },
    )?;

    println!(
        "Started session {} for form '{}'",
        style(&state.id).bold(),
        state.form.name
    );
    println!(
        "{}",
        style(format!("Resume any time with: intake resume {}", state.id)).dim()
    );

    drive_session(&orch, &audit, &mut state, cli.verbose).await
}

pub async fn cmd_resume(cli: &Cli, session_id: &str, project_dir: PathBuf) -> Result<()> {
    let (_config, orch, audit) = setup(cli, project_dir)?;

    let mut state = orch.load_session(session_id)?;
    if state.is_terminal() {
        println!(
            "Session {} is already complete. See 'intake summary {}'.",
            style(session_id).bold(),
            session_id
        );
        return Ok(());
    }

    println!(
        "Resuming session {} for form '{}' ({} of {} sections done)",
        style(&state.id).bold(),
        state.form.name,
        state.completed.len(),
        state.form.sections.len()
    );

    drive_session(&orch, &audit, &mut state, cli.verbose).await
}

fn setup(
    cli: &Cli,
    project_dir: PathBuf,
) -> Result<(Config, Orchestrator<JsonSessionStore>, TransitionLog)> {
    if !is_initialized(&project_dir) {
        anyhow::bail!("Project not initialized. Run 'intake init' first.");
    }
    let config = Config::new(project_dir, cli.verbose, cli.max_retries)?;
    config.ensure_directories()?;

    let store = JsonSessionStore::new(&config.sessions_dir)?;
    let orch = Orchestrator::new(store, config.max_retries);
    let audit = TransitionLog::new(&config.audit_dir)?;
    Ok((config, orch, audit))
}

async fn drive_session<S: SessionStore>(
    orch: &Orchestrator<S>,
    audit: &TransitionLog,
    state: &mut SessionState,
    verbose: bool,
) -> Result<()> {
    let ui = IntakeUi::new(state.form.sections.len() as u64, verbose);
    let drafter = InteractiveDrafter::new();

    loop {
        ui.set_completed(state.completed.len() as u64, state.current_section.as_deref());

        if state.is_terminal() {
            let summary = orch.summary(state)?;
            ui.print_summary(&summary);
            audit.append(&state.id, TransitionEvent::SessionCompleted)?;
            ui.finish();
            return Ok(());
        }

        // Re-present a persisted suspension, or draft a fresh candidate.
        let payload = match orch.pending_payload(state) {
            Some(payload) => payload,
            None => {
                let section = state.current_section.clone().unwrap_or_default();
                audit.append(
                    &state.id,
                    TransitionEvent::DraftRequested {
                        section: section.clone(),
                    },
                )?;

                match orch.draft(state, &drafter).await {
                    Ok(payload) => {
                        audit.append(
                            &state.id,
                            TransitionEvent::ReviewSuspended {
                                section: payload.section.clone(),
                                ticket: payload.ticket,
                                errors: payload.errors.len(),
                                warnings: payload.warnings.len(),
                            },
                        )?;
                        payload
                    }
                    Err(SessionError::Drafting { section, source }) => {
                        audit.append(
                            &state.id,
                            TransitionEvent::DraftFailed {
                                section,
                                reason: source.to_string(),
                            },
                        )?;
                        ui.finish();
                        println!();
                        println!(
                            "Session saved. Resume with: intake resume {}",
                            style(&state.id).bold()
                        );
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        ui.print_review(&payload);

        let decision = match ui.prompt_decision(&payload)? {
            PromptResult::Decision(decision) => decision,
            PromptResult::Suspend => {
                ui.finish();
                println!(
                    "Session saved awaiting review. Resume with: intake resume {}",
                    style(&state.id).bold()
                );
                return Ok(());
            }
        };

        let issues = payload.errors.len();
        match orch.resume(state, payload.ticket, decision)? {
            Resumption::SectionCommitted { section, .. } => {
                audit.append(
                    &state.id,
                    TransitionEvent::SectionCommitted {
                        section: section.clone(),
                    },
                )?;
                ui.section_done(&section_title(state, &section), false);
            }
            Resumption::SectionSkipped { section, .. } => {
                audit.append(
                    &state.id,
                    TransitionEvent::SectionSkipped {
                        section: section.clone(),
                        issues,
                    },
                )?;
                ui.section_done(&section_title(state, &section), true);
            }
            Resumption::RetryScheduled {
                section,
                retry_count,
            } => {
                audit.append(
                    &state.id,
                    TransitionEvent::RetryScheduled {
                        section,
                        retry_count,
                    },
                )?;
                ui.println(
                    style(format!(
                        "Corrections recorded (attempt {} of {}); drafting again",
                        retry_count,
                        orch.max_retries()
                    ))
                    .dim()
                    .to_string(),
                );
            }
            Resumption::SectionReset { section, forced } => {
                if forced {
                    audit.append(
                        &state.id,
                        TransitionEvent::ForcedReset {
                            section: section.clone(),
                            max_retries: orch.max_retries(),
                        },
                    )?;
                    ui.println(
                        style("Retry budget exhausted — section cleared, starting over")
                            .red()
                            .to_string(),
                    );
                } else {
                    audit.append(
                        &state.id,
                        TransitionEvent::SectionReset {
                            section: section.clone(),
                        },
                    )?;
                    ui.println(style("Section cleared, starting over").yellow().to_string());
                }
            }
        }
    }
}

fn section_title(state: &SessionState, section: &str) -> String {
    state
        .form
        .section(section)
        .map(|s| s.display_title())
        .unwrap_or_else(|| section.to_string())
}
