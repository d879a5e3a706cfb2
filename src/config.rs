//! Runtime configuration for intake.
//!
//! Settings layer file → CLI: `.intake/intake.toml` provides project
//! defaults, CLI flags override them. The `Config` struct is the resolved
//! runtime view handed to commands.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `.intake/intake.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeToml {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub forms: FormsConfig,
}

/// Default settings for all sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Correction attempts allowed per section before a forced reset
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

/// Form-spec discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Directory with form specs, relative to the project dir
    /// (default: `.intake/forms`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl IntakeToml {
    /// Load `.intake/intake.toml`, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(intake_dir: &Path) -> Result<Self> {
        let path = intake_dir.join("intake.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Serialize back to TOML (used by `init` to seed the file).
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize intake.toml")
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub intake_dir: PathBuf,
    pub forms_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub audit_dir: PathBuf,
    pub log_dir: PathBuf,
    pub max_retries: u32,
    pub verbose: bool,
}

impl Config {
    /// Build the runtime config for a project directory.
    ///
    /// `max_retries_override` is the CLI flag; it wins over the file
    /// default.
    pub fn new(
        project_dir: PathBuf,
        verbose: bool,
        max_retries_override: Option<u32>,
    ) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let intake_dir = project_dir.join(crate::init::INTAKE_DIR);

        let toml = IntakeToml::load_or_default(&intake_dir)?;
        let max_retries = max_retries_override.unwrap_or(toml.defaults.max_retries);

        let forms_dir = match &toml.forms.dir {
            Some(dir) => project_dir.join(dir),
            None => intake_dir.join("forms"),
        };

        Ok(Self {
            sessions_dir: intake_dir.join("sessions"),
            audit_dir: intake_dir.join("audit"),
            log_dir: intake_dir.join("logs"),
            forms_dir,
            project_dir,
            intake_dir,
            max_retries,
            verbose,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.forms_dir).context("Failed to create forms directory")?;
        std::fs::create_dir_all(&self.sessions_dir)
            .context("Failed to create sessions directory")?;
        std::fs::create_dir_all(&self.audit_dir).context("Failed to create audit directory")?;
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        Ok(())
    }

    /// Resolve a form reference: an explicit path, a file in the project
    /// forms directory, or a file in the user-wide `~/.intake/forms`
    /// library. Bare names may omit the extension.
    pub fn resolve_form(&self, reference: &str) -> Result<PathBuf> {
        let direct = PathBuf::from(reference);
        if direct.exists() {
            return Ok(direct);
        }

        let mut search_dirs = vec![self.forms_dir.clone()];
        if let Some(home) = dirs::home_dir() {
            search_dirs.push(home.join(crate::init::INTAKE_DIR).join("forms"));
        }

        for dir in &search_dirs {
            for ext in ["", ".yaml", ".yml", ".json"] {
                let candidate = dir.join(format!("{}{}", reference, ext));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(anyhow!(
            "No form spec found for '{}'. Looked in {} — pass a path or add the form there",
            reference,
            search_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }
}
