//! Interactive drafting: field values collected at the terminal.
//!
//! This is the CLI's built-in `DraftingService`. The orchestrator treats
//! it exactly like any model-backed drafter: it hands over the section
//! spec and context, and gets back a shaped candidate map. Prompt-level
//! niceties (defaults from existing values, feedback from the last
//! review round) live entirely on this side of the boundary.

use async_trait::async_trait;
use console::style;
use dialoguer::{Input, theme::ColorfulTheme};
use intake_common::{
    DraftContext, DraftError, DraftingService, FieldValues, SectionSpec,
};

use super::parse_value;

/// Drafts a candidate by prompting the user for each field in order.
#[derive(Default)]
pub struct InteractiveDrafter;

impl InteractiveDrafter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DraftingService for InteractiveDrafter {
    async fn draft(
        &self,
        section: &SectionSpec,
        ctx: &DraftContext,
    ) -> Result<FieldValues, DraftError> {
        println!();
        println!(
            "{} {}",
            style("Filling in:").bold(),
            style(section.display_title()).bold().cyan()
        );
        for note in &ctx.feedback {
            println!("  {} {}", style("note:").yellow(), note);
        }

        let mut candidate = FieldValues::new();
        let theme = ColorfulTheme::default();
        for field in &section.fields {
            let marker = if field.required { "" } else { " (optional)" };
            let prompt = format!("{}{}", field.description, marker);

            let mut input = Input::<String>::with_theme(&theme)
                .with_prompt(prompt)
                .allow_empty(true);
            if let Some(existing) = ctx.existing.get(&field.name)
                && !existing.is_empty()
            {
                input = input.default(existing.to_string());
            }

            let raw = input.interact_text().map_err(|_| DraftError::Interrupted)?;
            candidate.insert(field.name.clone(), parse_value(&raw, field.value_type));
        }

        Ok(candidate)
    }
}
