//! Field-level domain types.
//!
//! This module provides:
//! - `FieldType` - the closed set of value types a field can declare
//! - `FieldValue` - a typed field value as drafted or committed
//! - `FieldRule` - declarative refinement rules attached to a field
//! - `FieldSpec` - the static specification of a single form field

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A candidate or committed field map, keyed by field name.
///
/// `BTreeMap` keeps snapshots deterministic: two equal sessions serialize
/// to byte-identical JSON regardless of insertion order.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// Prefix marking internal bookkeeping keys inside a field map.
///
/// Keys starting with this prefix are ignored by validation and stripped
/// before a section is committed.
pub const BOOKKEEPING_PREFIX: &str = "_";

/// The value type a field declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free-form text
    #[default]
    Text,
    /// Signed integer
    Integer,
    /// Boolean flag
    Boolean,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A single field value.
///
/// Serialized untagged so snapshots and review payloads read as plain JSON
/// values (`"Jane"`, `42`, `true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag
    Boolean(bool),
    /// Signed integer
    Integer(i64),
    /// Free-form text
    Text(String),
}

impl FieldValue {
    /// Build a text value.
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Check whether the value counts as empty (whitespace-only text).
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Attempt to coerce this value into the declared field type.
    ///
    /// Returns `None` when no sensible conversion exists; the caller turns
    /// that into a validation error rather than a silent default. Accepted
    /// boolean spellings are `true`/`false`/`yes`/`no`/`1`/`0`,
    /// case-insensitive.
    pub fn coerce_to(&self, target: FieldType) -> Option<FieldValue> {
        match (self, target) {
            (FieldValue::Text(s), FieldType::Text) => Some(FieldValue::Text(s.clone())),
            (other, FieldType::Text) => Some(FieldValue::Text(other.to_string())),

            (FieldValue::Integer(n), FieldType::Integer) => Some(FieldValue::Integer(*n)),
            (FieldValue::Text(s), FieldType::Integer) => {
                s.trim().parse::<i64>().ok().map(FieldValue::Integer)
            }
            (FieldValue::Boolean(_), FieldType::Integer) => None,

            (FieldValue::Boolean(b), FieldType::Boolean) => Some(FieldValue::Boolean(*b)),
            (FieldValue::Integer(0), FieldType::Boolean) => Some(FieldValue::Boolean(false)),
            (FieldValue::Integer(1), FieldType::Boolean) => Some(FieldValue::Boolean(true)),
            (FieldValue::Integer(_), FieldType::Boolean) => None,
            (FieldValue::Text(s), FieldType::Boolean) => {
                match s.trim().to_lowercase().as_str() {
                    "true" | "yes" | "1" => Some(FieldValue::Boolean(true)),
                    "false" | "no" | "0" => Some(FieldValue::Boolean(false)),
                    _ => None,
                }
            }
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Boolean(true) => write!(f, "yes"),
            FieldValue::Boolean(false) => write!(f, "no"),
        }
    }
}

/// A refinement rule attached to a field, evaluated by the validator after
/// the type check passes.
///
/// Hard rule violations are errors; `soft` rules demote to warnings and do
/// not block acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Numeric range check for integer fields.
    Bounded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
        #[serde(default)]
        soft: bool,
        /// Override for the generated violation message
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Regex match against the textual form of the value.
    Pattern {
        regex: String,
        #[serde(default)]
        soft: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl FieldRule {
    /// Whether a violation of this rule is a warning rather than an error.
    pub fn is_soft(&self) -> bool {
        match self {
            FieldRule::Bounded { soft, .. } | FieldRule::Pattern { soft, .. } => *soft,
        }
    }
}

/// Static specification of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name (snake_case identifier, unique within its section)
    pub name: String,
    /// Declared value type
    #[serde(default)]
    pub value_type: FieldType,
    /// Whether the field must be present and non-empty for a clean section
    #[serde(default)]
    pub required: bool,
    /// Human-readable description shown at the review gate
    #[serde(default)]
    pub description: String,
    /// Refinement rules evaluated after the type check
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    /// Create a rule-free field spec.
    pub fn new(
        name: &str,
        value_type: FieldType,
        required: bool,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            required,
            description: description.to_string(),
            rules: Vec::new(),
        }
    }

    /// Attach a refinement rule, builder-style.
    pub fn with_rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Check whether a field-map key is internal bookkeeping.
pub fn is_bookkeeping_key(key: &str) -> bool {
    key.starts_with(BOOKKEEPING_PREFIX)
}
