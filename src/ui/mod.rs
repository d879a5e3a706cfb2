//! Terminal presentation for the intake CLI.
//!
//! Renders the review checkpoint, prompts for decisions and keeps a
//! section progress bar via `indicatif`. The library core never touches a
//! terminal; everything interactive lives here.

pub mod drafter;

pub use drafter::InteractiveDrafter;

use anyhow::Result;
use console::style;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use indicatif::{ProgressBar, ProgressStyle};
use intake_common::{FieldType, FieldValue, FieldValues, ReviewDecision, ReviewPayload};

use crate::progress::FormSummary;

/// What the reviewer chose at the gate prompt.
pub enum PromptResult {
    /// A decision to feed back into the orchestrator
    Decision(ReviewDecision),
    /// Save the suspension and exit; the session resumes later
    Suspend,
}

/// Terminal UI for one interactive session run.
pub struct IntakeUi {
    section_bar: ProgressBar,
    verbose: bool,
}

impl IntakeUi {
    /// Create the UI with a progress bar sized to the form.
    pub fn new(total_sections: u64, verbose: bool) -> Self {
        let bar_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");

        let section_bar = ProgressBar::new(total_sections);
        section_bar.set_style(bar_style);
        section_bar.set_prefix("Sections");

        Self {
            section_bar,
            verbose,
        }
    }

    /// Print a line above the progress bar.
    pub fn println(&self, msg: impl AsRef<str>) {
        self.section_bar.println(msg.as_ref());
    }

    /// Update the bar to the number of completed sections.
    pub fn set_completed(&self, completed: u64, current: Option<&str>) {
        self.section_bar.set_position(completed);
        match current {
            Some(section) => self
                .section_bar
                .set_message(format!("working on {}", style(section).yellow())),
            None => self.section_bar.set_message(""),
        }
    }

    /// Render the review payload: fields, drafted values, findings and
    /// the completion score.
    pub fn print_review(&self, payload: &ReviewPayload) {
        let width = terminal_width();

        self.println("");
        self.println(format!(
            "{} {}",
            style("Review:").bold(),
            style(&payload.section_title).bold().cyan()
        ));

        for field in &payload.fields {
            let marker = if field.required { "required" } else { "optional" };
            let value = match payload.candidate.get(&field.name) {
                Some(v) if !v.is_empty() => style(v.to_string()).green(),
                _ => style("<empty>".to_string()).dim(),
            };
            self.println(format!(
                "  {:<24} {}",
                style(&field.name).bold(),
                value
            ));
            if self.verbose && !field.description.is_empty() {
                let wrapped = textwrap::fill(
                    &format!("{} ({}, {})", field.description, field.value_type, marker),
                    width.saturating_sub(8),
                );
                for line in wrapped.lines() {
                    self.println(format!("      {}", style(line).dim()));
                }
            }
        }

        if !payload.errors.is_empty() {
            self.println(format!("  {}", style("Errors:").red().bold()));
            for error in &payload.errors {
                self.println(format!("    {} {}", style("✗").red(), error));
            }
        }
        if !payload.warnings.is_empty() {
            self.println(format!("  {}", style("Warnings:").yellow().bold()));
            for warning in &payload.warnings {
                self.println(format!("    {} {}", style("!").yellow(), warning));
            }
        }

        let mut status_line = format!("  Completion: {:.0}%", payload.completion_score);
        if payload.retry_count > 0 {
            status_line.push_str(&format!(" · correction attempt {}", payload.retry_count));
        }
        self.println(style(status_line).dim().to_string());
    }

    /// Prompt for the gate decision.
    pub fn prompt_decision(&self, payload: &ReviewPayload) -> Result<PromptResult> {
        let options = &[
            "Approve this section",
            "Retry with corrections",
            "Skip section (keep data as-is)",
            "Reset section and start over",
            "Save and exit",
        ];

        let selection = self.section_bar.suspend(|| {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Accept the {} section?", payload.section_title))
                .items(options)
                .default(0)
                .interact()
        })?;

        let result = match selection {
            0 => PromptResult::Decision(ReviewDecision::Approve),
            1 => {
                let (corrections, feedback) = self.prompt_corrections(payload)?;
                PromptResult::Decision(ReviewDecision::Retry {
                    corrections,
                    feedback,
                })
            }
            2 => PromptResult::Decision(ReviewDecision::Skip),
            3 => PromptResult::Decision(ReviewDecision::Reset),
            4 => PromptResult::Suspend,
            _ => unreachable!(),
        };
        Ok(result)
    }

    fn prompt_corrections(
        &self,
        payload: &ReviewPayload,
    ) -> Result<(FieldValues, Vec<String>)> {
        let mut corrections = FieldValues::new();

        loop {
            let mut items: Vec<String> = payload
                .fields
                .iter()
                .map(|f| {
                    let current = corrections
                        .get(&f.name)
                        .or_else(|| payload.candidate.get(&f.name))
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    format!("{} = {}", f.name, current)
                })
                .collect();
            items.push("Done correcting".to_string());

            let selection = self.section_bar.suspend(|| {
                Select::with_theme(&ColorfulTheme::default())
                    .with_prompt("Which field should change?")
                    .items(&items)
                    .default(items.len() - 1)
                    .interact()
            })?;

            if selection == items.len() - 1 {
                break;
            }

            let field = &payload.fields[selection];
            let raw = self.section_bar.suspend(|| {
                Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("New value for {}", field.name))
                    .allow_empty(true)
                    .interact_text()
            })?;
            corrections.insert(field.name.clone(), parse_value(&raw, field.value_type));
        }

        let note = self.section_bar.suspend(|| {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt("Feedback for the next draft (optional)")
                .allow_empty(true)
                .interact_text()
        })?;
        let feedback = if note.trim().is_empty() {
            Vec::new()
        } else {
            vec![note]
        };

        Ok((corrections, feedback))
    }

    /// Announce a committed or skipped section and advance the bar.
    pub fn section_done(&self, section_title: &str, skipped: bool) {
        self.section_bar.inc(1);
        if skipped {
            self.println(format!(
                "{} {} (skipped with outstanding issues)",
                style("~").yellow(),
                section_title
            ));
        } else {
            self.println(format!("{} {}", style("✓").green(), section_title));
        }
    }

    /// Print the final summary dump.
    pub fn print_summary(&self, summary: &FormSummary) {
        self.println("");
        self.println(format!(
            "{} {} — all {} sections complete",
            style("Form complete:").bold().green(),
            style(&summary.form).bold(),
            summary.completed_sections
        ));

        for section in &summary.sections {
            self.println(format!("  {}", style(&section.title).bold().cyan()));
            for (name, value) in &section.values {
                let shown = if value.is_empty() {
                    style("<empty>".to_string()).dim()
                } else {
                    style(value.to_string()).green()
                };
                self.println(format!("    {:<24} {}", name, shown));
            }
            if let Some(annotation) = &section.annotation {
                self.println(format!("    {}", style(annotation).yellow()));
            }
        }

        self.println(format!(
            "  {} {}/{} fields filled ({:.1}%)",
            style("Fields:").dim(),
            summary.completed_fields,
            summary.total_fields,
            summary.completion_rate
        ));
    }

    /// Drop the progress bar cleanly.
    pub fn finish(&self) {
        self.section_bar.finish_and_clear();
    }
}

/// Parse raw terminal input into the declared value type, falling back to
/// text so the validator can name the problem instead of the prompt
/// swallowing it.
pub(crate) fn parse_value(raw: &str, value_type: FieldType) -> FieldValue {
    let trimmed = raw.trim();
    match value_type {
        FieldType::Text => FieldValue::text(trimmed),
        FieldType::Integer => match trimmed.parse::<i64>() {
            Ok(n) => FieldValue::Integer(n),
            Err(_) => FieldValue::text(trimmed),
        },
        FieldType::Boolean => match FieldValue::text(trimmed).coerce_to(FieldType::Boolean) {
            Some(v) => v,
            None => FieldValue::text(trimmed),
        },
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}
