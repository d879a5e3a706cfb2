//! Field validation for drafted section candidates.
//!
//! `validate` checks a candidate field map against a `SectionSpec` and
//! produces a `ValidationReport`: hard errors (missing required fields,
//! type coercion failures, hard rule violations), soft warnings, and a
//! completion score. It is a pure function — deterministic, no I/O — so
//! the same candidate always reviews the same way.

use intake_common::{
    FieldRule, FieldSpec, FieldValue, FieldValues, SectionSpec, ValidationReport,
    is_bookkeeping_key,
};
use regex::Regex;

/// Validate a candidate field map against a section specification.
pub fn validate(section: &SectionSpec, candidate: &FieldValues) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Required fields must be present and non-empty.
    for field in &section.fields {
        if field.required {
            let missing = candidate
                .get(&field.name)
                .map(|v| v.is_empty())
                .unwrap_or(true);
            if missing {
                errors.push(format!(
                    "Missing required field: {} ({})",
                    field.name, field.description
                ));
            }
        }
    }

    // Type coercion and refinement rules for every present value.
    for (name, value) in candidate {
        if is_bookkeeping_key(name) {
            continue;
        }

        let Some(field) = section.field(name) else {
            warnings.push(format!(
                "Unknown field '{}' is not declared in section '{}' and was ignored",
                name, section.name
            ));
            continue;
        };

        if value.is_empty() {
            continue;
        }

        match value.coerce_to(field.value_type) {
            Some(coerced) => {
                check_rules(field, &coerced, &mut errors, &mut warnings);
            }
            None => {
                errors.push(format!(
                    "Field '{}' must be a valid {}, got: {}",
                    field.name, field.value_type, value
                ));
            }
        }
    }

    ValidationReport {
        errors,
        warnings,
        completion_score: completion_score(section, candidate),
    }
}

/// 100 x non-empty declared fields / declared fields; 0 for a field-less
/// section.
fn completion_score(section: &SectionSpec, candidate: &FieldValues) -> f64 {
    let declared = section.fields.len();
    if declared == 0 {
        return 0.0;
    }
    let filled = section
        .fields
        .iter()
        .filter(|f| {
            candidate
                .get(&f.name)
                .map(|v| !v.is_empty())
                .unwrap_or(false)
        })
        .count();
    (filled as f64 / declared as f64) * 100.0
}

fn check_rules(
    field: &FieldSpec,
    value: &FieldValue,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    for rule in &field.rules {
        let violation = match rule {
            FieldRule::Bounded {
                min, max, message, ..
            } => bounded_violation(field, value, *min, *max, message.as_deref()),
            FieldRule::Pattern { regex, message, .. } => {
                pattern_violation(field, value, regex, message.as_deref())
            }
        };

        if let Some(text) = violation {
            if rule.is_soft() {
                warnings.push(text);
            } else {
                errors.push(text);
            }
        }
    }
}

fn bounded_violation(
    field: &FieldSpec,
    value: &FieldValue,
    min: Option<i64>,
    max: Option<i64>,
    message: Option<&str>,
) -> Option<String> {
    let FieldValue::Integer(n) = value else {
        return None;
    };

    if let Some(min) = min
        && *n < min
    {
        return Some(message.map(str::to_string).unwrap_or_else(|| {
            format!("Field '{}' must be at least {}, got: {}", field.name, min, n)
        }));
    }
    if let Some(max) = max
        && *n > max
    {
        return Some(message.map(str::to_string).unwrap_or_else(|| {
            format!("Value for '{}' is unusually large: {}", field.name, n)
        }));
    }
    None
}

fn pattern_violation(
    field: &FieldSpec,
    value: &FieldValue,
    pattern: &str,
    message: Option<&str>,
) -> Option<String> {
    let FieldValue::Text(s) = value else {
        return None;
    };

    // Specs are validated at load time, so a compile failure here means
    // the spec bypassed validation; surface it as a finding rather than
    // panicking.
    let Ok(re) = Regex::new(pattern) else {
        return Some(format!("Field '{}' has an invalid pattern rule", field.name));
    };

    if re.is_match(s) {
        None
    } else {
        Some(
            message
                .map(str::to_string)
                .unwrap_or_else(|| format!("Field '{}' appears invalid: {}", field.name, s)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_common::FieldType;

    fn personal_information() -> SectionSpec {
        SectionSpec::new(
            "personal_information",
            vec![
                FieldSpec::new("first_name", FieldType::Text, true, "First name"),
                FieldSpec::new("last_name", FieldType::Text, true, "Last name"),
                FieldSpec::new("gender", FieldType::Text, false, "Gender (optional)"),
            ],
        )
    }

    fn employment_information() -> SectionSpec {
        SectionSpec::new(
            "employment_information",
            vec![
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
                FieldSpec::new("newsletter", FieldType::Boolean, false, "Subscribe"),
            ],
        )
    }

    fn contact_details() -> SectionSpec {
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
            ],
        )
    }

    fn values(pairs: &[(&str, FieldValue)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_missing_required_field_names_field_and_description() {
        let candidate = values(&[
            ("first_name", FieldValue::text("")),
            ("last_name", FieldValue::text("Doe")),
        ]);
        let report = validate(&personal_information(), &candidate);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(
            report.errors[0],
            "Missing required field: first_name (First name)"
        );
    }

    #[test]
    fn test_clean_candidate_has_no_errors() {
        let candidate = values(&[
            ("first_name", FieldValue::text("Jane")),
            ("last_name", FieldValue::text("Doe")),
        ]);
        let report = validate(&personal_information(), &candidate);
        assert!(report.is_clean());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_coercion_failure_is_an_error_not_a_default() {
        let candidate = values(&[("years_experience", FieldValue::text("a few"))]);
        let report = validate(&employment_information(), &candidate);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("must be a valid integer"))
        );
    }

    #[test]
    fn test_textual_integer_coerces() {
        let candidate = values(&[("years_experience", FieldValue::text("12"))]);
        let report = validate(&employment_information(), &candidate);
        assert!(report.is_clean());
    }

    #[test]
    fn test_boolean_spellings_coerce() {
        let candidate = values(&[
            ("years_experience", FieldValue::Integer(3)),
            ("newsletter", FieldValue::text("yes")),
        ]);
        let report = validate(&employment_information(), &candidate);
        assert!(report.is_clean());
    }

    #[test]
    fn test_hard_bound_violation_uses_custom_message() {
        let candidate = values(&[("years_experience", FieldValue::Integer(-2))]);
        let report = validate(&employment_information(), &candidate);
        assert!(
            report
                .errors
                .contains(&"Years of experience cannot be negative".to_string())
        );
    }

    #[test]
    fn test_soft_bound_violation_is_a_warning() {
        let candidate = values(&[("years_experience", FieldValue::Integer(120))]);
        let report = validate(&employment_information(), &candidate);
        assert!(report.is_clean(), "soft violations must not block");
        assert!(
            report
                .warnings
                .iter()
                .any(|w| w.contains("unusually large"))
        );
    }

    #[test]
    fn test_pattern_rule_flags_address_without_at_sign() {
        let candidate = values(&[("email", FieldValue::text("not-an-address"))]);
        let report = validate(&contact_details(), &candidate);
        assert!(report.errors.iter().any(|e| e.contains("appears invalid")));

        let candidate = values(&[("email", FieldValue::text("jane@example.com"))]);
        assert!(validate(&contact_details(), &candidate).is_clean());
    }

    #[test]
    fn test_unknown_field_is_warned_and_ignored() {
        let candidate = values(&[
            ("first_name", FieldValue::text("Jane")),
            ("last_name", FieldValue::text("Doe")),
            ("favorite_color", FieldValue::text("green")),
        ]);
        let report = validate(&personal_information(), &candidate);
        assert!(report.is_clean());
        assert!(report.warnings.iter().any(|w| w.contains("favorite_color")));
        // Undeclared keys must not inflate the score.
        assert!((report.completion_score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bookkeeping_keys_are_invisible() {
        let candidate = values(&[
            ("first_name", FieldValue::text("Jane")),
            ("last_name", FieldValue::text("Doe")),
            ("_retry_count", FieldValue::Integer(2)),
        ]);
        let report = validate(&personal_information(), &candidate);
        assert!(report.is_clean());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_completion_score_counts_non_empty_declared_fields() {
        let candidate = values(&[
            ("first_name", FieldValue::text("Jane")),
            ("last_name", FieldValue::text("")),
        ]);
        let report = validate(&personal_information(), &candidate);
        assert!((report.completion_score - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_section_scores_zero() {
        let section = SectionSpec::new("empty", vec![]);
        let report = validate(&section, &FieldValues::new());
        assert_eq!(report.completion_score, 0.0);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let candidate = values(&[
            ("first_name", FieldValue::text("Jane")),
            ("mystery", FieldValue::text("?")),
        ]);
        let section = personal_information();
        assert_eq!(validate(&section, &candidate), validate(&section, &candidate));
    }
}
