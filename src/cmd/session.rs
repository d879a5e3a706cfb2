//! Session inspection and lifecycle commands — `intake sessions`,
//! `intake status`, `intake summary`, `intake delete`.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::path::PathBuf;

use intake::audit::{TransitionEvent, TransitionLog};
use intake::config::Config;
use intake::init::is_initialized;
use intake::progress::{progress_of, summary_of};
use intake::session::{SessionPhase, SessionState};
use intake::store::{JsonSessionStore, SessionStore};

use crate::Cli;

fn open_store(cli: &Cli, project_dir: PathBuf) -> Result<(Config, JsonSessionStore)> {
    if !is_initialized(&project_dir) {
        anyhow::bail!("Project not initialized. Run 'intake init' first.");
    }
    let config = Config::new(project_dir, cli.verbose, cli.max_retries)?;
    let store = JsonSessionStore::new(&config.sessions_dir)?;
    Ok((config, store))
}

fn load_session(store: &JsonSessionStore, session_id: &str) -> Result<SessionState> {
    store
        .load(session_id)?
        .ok_or_else(|| anyhow::anyhow!("No session found with id '{}'", session_id))
}

pub fn cmd_sessions(cli: &Cli, project_dir: PathBuf) -> Result<()> {
    let (_config, store) = open_store(cli, project_dir)?;

    let sessions = store.list()?;
    if sessions.is_empty() {
        println!("No sessions yet. Start one with 'intake start <form>'.");
        return Ok(());
    }

    println!(
        "{:<38} {:<16} {:<16} {:>10}  {}",
        style("SESSION").bold().dim(),
        style("FORM").bold().dim(),
        style("PHASE").bold().dim(),
        style("PROGRESS").bold().dim(),
        style("UPDATED").bold().dim()
    );
    for meta in sessions {
        println!(
            "{:<38} {:<16} {:<16} {:>7}/{:<2}  {}",
            meta.id,
            meta.form,
            meta.phase.to_string(),
            meta.completed_sections,
            meta.total_sections,
            meta.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub fn cmd_status(cli: &Cli, session_id: &str, project_dir: PathBuf) -> Result<()> {
    let (config, store) = open_store(cli, project_dir)?;
    let state = load_session(&store, session_id)?;

    let progress = progress_of(&state);
    println!(
        "Session {} — form '{}', {}",
        style(&state.id).bold(),
        state.form.name,
        style(state.phase.to_string()).cyan()
    );
    println!(
        "Progress: {}/{} sections ({:.1}%)",
        progress.completed_count, progress.total_count, progress.percentage
    );

    for section in &state.form.sections {
        let record = state.record(&section.name);
        let marker = if state.is_completed(&section.name) {
            style("done".to_string()).green()
        } else if state.current_section.as_deref() == Some(section.name.as_str()) {
            match state.phase {
                SessionPhase::AwaitingReview => style("awaiting review".to_string()).yellow(),
                _ => style("in progress".to_string()).yellow(),
            }
        } else {
            style("pending".to_string()).dim()
        };

        let mut notes = Vec::new();
        if let Some(record) = record {
            if record.retry_count > 0 {
                notes.push(format!("{} retries", record.retry_count));
            }
            if let Some(annotation) = &record.annotation {
                notes.push(annotation.clone());
            }
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!("  ({})", notes.join(", "))
        };

        println!("  {:<28} {}{}", section.name, marker, notes);
    }

    if cli.verbose {
        let audit = TransitionLog::new(&config.audit_dir)?;
        let records = audit.read(session_id)?;
        if !records.is_empty() {
            println!("\nRecent transitions:");
            for record in records.iter().rev().take(10).rev() {
                println!(
                    "  {}  {:?}",
                    record.at.format("%Y-%m-%d %H:%M:%S"),
                    record.event
                );
            }
        }
    }
    Ok(())
}

pub fn cmd_summary(cli: &Cli, session_id: &str, project_dir: PathBuf) -> Result<()> {
    let (_config, store) = open_store(cli, project_dir)?;
    let state = load_session(&store, session_id)?;

    let summary = summary_of(&state)?;
    println!(
        "{} '{}' — {} sections complete",
        style("Form complete:").green().bold(),
        summary.form,
        summary.completed_sections
    );
    for section in &summary.sections {
        println!("  {}", style(&section.title).bold().cyan());
        for (name, value) in &section.values {
            if value.is_empty() {
                println!("    {:<24} {}", name, style("<empty>").dim());
            } else {
                println!("    {:<24} {}", name, value);
            }
        }
        if let Some(annotation) = &section.annotation {
            println!("    {}", style(annotation).yellow());
        }
    }
    println!(
        "Fields: {}/{} filled ({:.1}%)",
        summary.completed_fields, summary.total_fields, summary.completion_rate
    );
    Ok(())
}

pub fn cmd_delete(cli: &Cli, session_id: &str, force: bool, project_dir: PathBuf) -> Result<()> {
    let (config, store) = open_store(cli, project_dir)?;
    // Verify it exists before prompting.
    let state = load_session(&store, session_id)?;

    if !force {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete session {} ({}, {}/{} sections)?",
                state.id,
                state.form.name,
                state.completed.len(),
                state.form.sections.len()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    store.delete(session_id)?;
    let audit = TransitionLog::new(&config.audit_dir)?;
    audit.append(session_id, TransitionEvent::SessionDeleted)?;
    println!("Deleted session {}", style(session_id).bold());
    Ok(())
}
