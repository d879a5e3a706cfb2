//! Project-level commands — `intake init` and `intake forms`.

use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;

use intake::config::Config;
use intake::init::{init_project, is_initialized};
use intake_common::FormSpec;

use crate::Cli;

pub fn cmd_init(project_dir: PathBuf) -> Result<()> {
    let result = init_project(&project_dir)?;

    if result.created {
        println!(
            "{} intake project in {}",
            style("Initialized").green().bold(),
            result.intake_dir.display()
        );
    } else {
        println!(
            "{} existing project in {}",
            style("Completed").green(),
            result.intake_dir.display()
        );
    }
    println!("  forms/       form specs (seeded with registration.yaml)");
    println!("  sessions/    session snapshots");
    println!("  audit/       transition logs");
    println!();
    println!("Start a session with: intake start registration");
    Ok(())
}

pub fn cmd_forms(cli: &Cli, project_dir: PathBuf) -> Result<()> {
    if !is_initialized(&project_dir) {
        anyhow::bail!("Project not initialized. Run 'intake init' first.");
    }
    let config = Config::new(project_dir, cli.verbose, cli.max_retries)?;

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&config.forms_dir)
        .with_context(|| format!("Failed to read forms dir: {}", config.forms_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml") | Some("json")
            )
        })
        .collect();
    entries.sort();

    if entries.is_empty() {
        println!("No form specs in {}", config.forms_dir.display());
        return Ok(());
    }

    for path in entries {
        match FormSpec::load(&path) {
            Ok(form) => {
                println!(
                    "{:<24} {} sections, {} fields  ({})",
                    style(&form.name).bold(),
                    form.sections.len(),
                    form.total_fields(),
                    path.file_name().and_then(|n| n.to_str()).unwrap_or("?")
                );
                if cli.verbose {
                    for section in &form.sections {
                        println!("    {} ({} fields)", section.name, section.fields.len());
                    }
                }
            }
            Err(e) => {
                println!(
                    "{:<24} {} {}",
                    path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                    style("invalid:").red(),
                    e
                );
            }
        }
    }
    Ok(())
}
