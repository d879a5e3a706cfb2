//! Section and form specifications.
//!
//! A `FormSpec` is the immutable ordered definition of the sections and
//! fields for one session. Specs are authored as YAML or JSON files and
//! validated on load; section order in the file is the pipeline order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::field::{FieldRule, FieldSpec, FieldType};

/// Errors raised while loading or validating a form spec.
#[derive(Debug, Error)]
pub enum FormSpecError {
    #[error("Failed to read form spec at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse form spec at {path}: {message}")]
    Parse {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Unsupported form spec format: {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: std::path::PathBuf },

    #[error("Invalid form spec: {0}")]
    Invalid(String),
}

/// One named, ordered unit of the form with its own field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    /// Section name (snake_case identifier, unique within the form)
    pub name: String,
    /// Optional display title; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Ordered field specifications
    pub fields: Vec<FieldSpec>,
}

impl SectionSpec {
    /// Create a section spec from a name and its fields.
    pub fn new(name: &str, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            fields,
        }
    }

    /// Display title: the explicit title, or the name with underscores
    /// spaced and each word capitalized ("contact_details" -> "Contact
    /// Details").
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(t) => t.clone(),
            None => self
                .name
                .split('_')
                .filter(|w| !w.is_empty())
                .map(|w| {
                    let mut chars = w.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Look up a field spec by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of all required fields, in declaration order.
    pub fn required_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// Immutable ordered definition of sections and their fields for one
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSpec {
    /// Form name (used for display and session metadata)
    pub name: String,
    /// Ordered sections; vector order is the pipeline order
    pub sections: Vec<SectionSpec>,
}

impl FormSpec {
    /// Create a form spec from a name and its sections.
    pub fn new(name: &str, sections: Vec<SectionSpec>) -> Self {
        Self {
            name: name.to_string(),
            sections,
        }
    }

    /// Load a form spec from a YAML or JSON file, then validate it.
    pub fn load(path: &Path) -> Result<Self, FormSpecError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormSpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let spec: FormSpec = match ext.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| FormSpecError::Parse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            "json" => serde_json::from_str(&content).map_err(|e| FormSpecError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(FormSpecError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        spec.validate()?;
        Ok(spec)
    }

    /// Save the form spec as YAML.
    pub fn save(&self, path: &Path) -> Result<(), FormSpecError> {
        let content = serde_yaml::to_string(self).map_err(|e| FormSpecError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| FormSpecError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check structural soundness: at least one section, unique section
    /// and field names, and rules that fit their field's declared type.
    pub fn validate(&self) -> Result<(), FormSpecError> {
        if self.sections.is_empty() {
            return Err(FormSpecError::Invalid(format!(
                "form '{}' has no sections",
                self.name
            )));
        }

        let mut seen_sections = HashSet::new();
        for section in &self.sections {
            if !seen_sections.insert(section.name.as_str()) {
                return Err(FormSpecError::Invalid(format!(
                    "duplicate section name '{}'",
                    section.name
                )));
            }

            let mut seen_fields = HashSet::new();
            for field in &section.fields {
                if !seen_fields.insert(field.name.as_str()) {
                    return Err(FormSpecError::Invalid(format!(
                        "duplicate field name '{}' in section '{}'",
                        field.name, section.name
                    )));
                }
                Self::validate_rules(section, field)?;
            }
        }

        Ok(())
    }

    fn validate_rules(section: &SectionSpec, field: &FieldSpec) -> Result<(), FormSpecError> {
        for rule in &field.rules {
            match rule {
                FieldRule::Bounded { min, max, .. } => {
                    if field.value_type != FieldType::Integer {
                        return Err(FormSpecError::Invalid(format!(
                            "bounded rule on non-integer field '{}.{}'",
                            section.name, field.name
                        )));
                    }
                    if min.is_none() && max.is_none() {
                        return Err(FormSpecError::Invalid(format!(
                            "bounded rule on '{}.{}' has neither min nor max",
                            section.name, field.name
                        )));
                    }
                }
                FieldRule::Pattern { regex, .. } => {
                    if field.value_type != FieldType::Text {
                        return Err(FormSpecError::Invalid(format!(
                            "pattern rule on non-text field '{}.{}'",
                            section.name, field.name
                        )));
                    }
                    regex::Regex::new(regex).map_err(|e| {
                        FormSpecError::Invalid(format!(
                            "pattern rule on '{}.{}' does not compile: {}",
                            section.name, field.name, e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Look up a section spec by name.
    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Ordinal position of a section, if it exists.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    /// Section names in pipeline order.
    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    /// Total number of field specs across all sections.
    pub fn total_fields(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }
}
