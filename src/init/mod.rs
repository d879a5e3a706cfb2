//! Initialization of an intake project.
//!
//! `intake init` creates the `.intake/` directory structure:
//!
//! ```text
//! .intake/
//! ├── intake.toml      # Project configuration
//! ├── forms/           # Form specs (seeded with registration.yaml)
//! ├── sessions/        # One JSON snapshot per session
//! ├── audit/           # One JSONL transition log per session
//! └── logs/            # Tracing output
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use intake_common::{FieldRule, FieldSpec, FieldType, FormSpec, SectionSpec};

use crate::config::IntakeToml;

/// The name of the intake configuration directory.
pub const INTAKE_DIR: &str = ".intake";

/// Result of initializing an intake project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created .intake directory
    pub intake_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
}

/// Path of the `.intake/` directory for a project.
pub fn get_intake_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(INTAKE_DIR)
}

/// Check whether a project has been initialized.
pub fn is_initialized(project_dir: &Path) -> bool {
    get_intake_dir(project_dir).is_dir()
}

/// Initialize an intake project in the given directory.
///
/// Idempotent: re-running completes any missing pieces without touching
/// existing files.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let intake_dir = get_intake_dir(project_dir);
    let created = !intake_dir.exists();

    for sub in ["forms", "sessions", "audit", "logs"] {
        let dir = intake_dir.join(sub);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let config_file = intake_dir.join("intake.toml");
    if !config_file.exists() {
        let content = IntakeToml::default().to_toml_string()?;
        std::fs::write(&config_file, content)
            .with_context(|| format!("Failed to create {}", config_file.display()))?;
    }

    let sample_form = intake_dir.join("forms").join("registration.yaml");
    if !sample_form.exists() {
        sample_registration_form()
            .save(&sample_form)
            .with_context(|| format!("Failed to write sample form: {}", sample_form.display()))?;
    }

    Ok(InitResult {
        intake_dir,
        created,
    })
}

/// The seeded demonstration form: a four-section registration intake.
pub fn sample_registration_form() -> FormSpec {
    FormSpec::new(
        "registration",
        vec![
            SectionSpec::new(
                "personal_information",
                vec![
                    FieldSpec::new("first_name", FieldType::Text, true, "First name"),
                    FieldSpec::new("last_name", FieldType::Text, true, "Last name"),
                    FieldSpec::new(
                        "date_of_birth",
                        FieldType::Text,
                        true,
                        "Date of birth (YYYY-MM-DD)",
                    )
                    .with_rule(FieldRule::Pattern {
                        regex: r"^\d{4}-\d{2}-\d{2}$".to_string(),
                        soft: false,
                        message: Some("Date of birth must look like YYYY-MM-DD".to_string()),
                    }),
                    FieldSpec::new("gender", FieldType::Text, false, "Gender (optional)"),
                ],
            ),
            SectionSpec::new(
                "contact_details",
                vec![
                    FieldSpec::new("email", FieldType::Text, true, "Email address").with_rule(
                        FieldRule::Pattern {
                            regex: r"^[^@\s]+@[^@\s]+$".to_string(),
                            soft: false,
                            message: None,
                        },
                    ),
                    FieldSpec::new("phone", FieldType::Text, true, "Phone number").with_rule(
                        FieldRule::Pattern {
                            regex: r"^[\d\s()+.-]{10,}$".to_string(),
                            soft: false,
                            message: Some("Phone number appears too short".to_string()),
                        },
                    ),
                    FieldSpec::new("address", FieldType::Text, true, "Street address"),
                    FieldSpec::new("city", FieldType::Text, true, "City"),
                    FieldSpec::new("postal_code", FieldType::Text, true, "Postal/ZIP code")
                        .with_rule(FieldRule::Pattern {
                            regex: r"^.{5,}$".to_string(),
                            soft: false,
                            message: Some("Postal code appears invalid".to_string()),
                        }),
                ],
            ),
            SectionSpec::new(
                "employment_information",
                vec![
                    FieldSpec::new("company", FieldType::Text, true, "Company name"),
                    FieldSpec::new("position", FieldType::Text, true, "Job title/position"),
                    FieldSpec::new(
                        "years_experience",
                        FieldType::Integer,
                        true,
                        "Years of experience",
                    )
                    .with_rule(FieldRule::Bounded {
                        min: Some(0),
                        max: None,
                        soft: false,
                        message: Some("Years of experience cannot be negative".to_string()),
                    })
                    .with_rule(FieldRule::Bounded {
                        min: None,
                        max: Some(100),
                        soft: true,
                        message: None,
                    }),
                    FieldSpec::new(
                        "salary_range",
                        FieldType::Text,
                        false,
                        "Salary range (optional)",
                    ),
                ],
            ),
            SectionSpec::new(
                "preferences",
                vec![
                    FieldSpec::new(
                        "communication_method",
                        FieldType::Text,
                        true,
                        "Preferred communication method (email/phone/mail)",
                    ),
                    FieldSpec::new(
                        "newsletter",
                        FieldType::Boolean,
                        false,
                        "Subscribe to newsletter (yes/no)",
                    ),
                    FieldSpec::new(
                        "special_requirements",
                        FieldType::Text,
                        false,
                        "Any special requirements (optional)",
                    ),
                ],
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_structure() {
        let dir = tempdir().unwrap();
        let result = init_project(dir.path()).unwrap();

        assert!(result.created);
        assert!(is_initialized(dir.path()));
        for sub in ["forms", "sessions", "audit", "logs"] {
            assert!(result.intake_dir.join(sub).is_dir(), "{sub} must exist");
        }
        assert!(result.intake_dir.join("intake.toml").is_file());
        assert!(result.intake_dir.join("forms/registration.yaml").is_file());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempdir().unwrap();
        init_project(dir.path()).unwrap();

        // Customize the config, then re-init.
        let config_file = dir.path().join(".intake/intake.toml");
        std::fs::write(&config_file, "[defaults]\nmax_retries = 7\n").unwrap();

        let result = init_project(dir.path()).unwrap();
        assert!(!result.created);
        let content = std::fs::read_to_string(&config_file).unwrap();
        assert!(content.contains("max_retries = 7"), "re-init must not clobber");
    }

    #[test]
    fn test_sample_form_is_valid_and_loadable() {
        let dir = tempdir().unwrap();
        init_project(dir.path()).unwrap();

        let loaded = FormSpec::load(&dir.path().join(".intake/forms/registration.yaml")).unwrap();
        assert_eq!(loaded, sample_registration_form());
        assert_eq!(loaded.sections.len(), 4);
        assert_eq!(loaded.sections[0].name, "personal_information");
    }
}
