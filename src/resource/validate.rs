//! Static field constraints
//!
//! Pure checks run on Create and Update before any request is built. Read and
//! Delete carry no user payload and never validate.

use std::fmt;
use thiserror::Error;

/// Allowed `comparison_delta` values, in minutes
pub const COMPARISON_DELTAS: &[f64] = &[5.0, 15.0, 60.0, 1440.0, 10080.0, 43200.0];

/// 0 = above, 1 = below
pub const THRESHOLD_TYPES: &[f64] = &[0.0, 1.0];

pub const TRIGGER_LABELS: &[&str] = &["critical", "warning"];

pub const ACTION_MATCHES: &[&str] = &["any", "all", "none"];

/// Rule frequency bounds, in minutes (5 minutes to 30 days)
pub const FREQUENCY_RANGE: Constraint = Constraint::Range {
    min: 5.0,
    max: 43200.0,
};

/// Digest delay bounds, in seconds
pub const DIGEST_DELAY_RANGE: Constraint = Constraint::Range {
    min: 60.0,
    max: 3600.0,
};

/// Key rate limit window bounds, in seconds
pub const RATE_LIMIT_WINDOW_RANGE: Constraint = Constraint::Range {
    min: 0.0,
    max: 86400.0,
};

pub const LEGACY_BROWSERS: &[&str] = &[
    "ie_pre_9",
    "ie9",
    "ie10",
    "ie11",
    "safari_pre_6",
    "opera_pre_15",
    "opera_mini_pre_8",
    "android_pre_4",
    "edge_pre_79",
];

/// A static constraint on one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Closed set of numbers
    OneOf(&'static [f64]),
    /// Closed set of strings
    OneOfStr(&'static [&'static str]),
    /// Inclusive numeric range
    Range { min: f64, max: f64 },
    /// Inclusive lower bound
    AtLeast(f64),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::OneOf(values) => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "one of the following valid choices: {}", values.join(", "))
            }
            Constraint::OneOfStr(values) => {
                write!(f, "one of the following valid choices: {}", values.join(", "))
            }
            Constraint::Range { min, max } => write!(f, "within the range [{min}, {max}]"),
            Constraint::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

/// A candidate value handed to [`validate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Candidate<'a> {
    Number(f64),
    Text(&'a str),
}

impl fmt::Display for Candidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Number(n) => write!(f, "{n}"),
            Candidate::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Candidate<'_> {
    fn from(value: f64) -> Self {
        Candidate::Number(value)
    }
}

impl From<i64> for Candidate<'_> {
    fn from(value: i64) -> Self {
        Candidate::Number(value as f64)
    }
}

impl<'a> From<&'a str> for Candidate<'a> {
    fn from(value: &'a str) -> Self {
        Candidate::Text(value)
    }
}

/// A violated constraint: which field, which value, and what was allowed
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Provided `{field}` of \"{value}\" is not {allowed}")]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    pub allowed: String,
}

/// Check one value against one constraint.
pub fn validate<'a>(
    field: &str,
    value: impl Into<Candidate<'a>>,
    constraint: &Constraint,
) -> Result<(), ValidationError> {
    let value = value.into();
    let ok = match (constraint, value) {
        (Constraint::OneOf(allowed), Candidate::Number(n)) => allowed.iter().any(|a| *a == n),
        (Constraint::OneOfStr(allowed), Candidate::Text(s)) => allowed.contains(&s),
        (Constraint::Range { min, max }, Candidate::Number(n)) => n >= *min && n <= *max,
        (Constraint::AtLeast(min), Candidate::Number(n)) => n >= *min,
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            allowed: constraint.to_string(),
        })
    }
}

/// Check an optional value; absent values always pass.
pub fn validate_opt<'a, T>(
    field: &str,
    value: Option<T>,
    constraint: &Constraint,
) -> Result<(), ValidationError>
where
    T: Into<Candidate<'a>>,
{
    match value {
        Some(value) => validate(field, value, constraint),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_delta_accepts_valid_choices() {
        for delta in [5.0, 15.0, 60.0, 1440.0, 10080.0, 43200.0] {
            assert!(validate("comparison_delta", delta, &Constraint::OneOf(COMPARISON_DELTAS)).is_ok());
        }
    }

    #[test]
    fn test_comparison_delta_rejects_other_values() {
        let err = validate("comparison_delta", 100.0, &Constraint::OneOf(COMPARISON_DELTAS)).unwrap_err();
        assert_eq!(err.field, "comparison_delta");
        assert_eq!(err.value, "100");
        assert_eq!(
            err.to_string(),
            "Provided `comparison_delta` of \"100\" is not one of the following valid choices: 5, 15, 60, 1440, 10080, 43200"
        );
    }

    #[test]
    fn test_string_set() {
        assert!(validate("action_match", "all", &Constraint::OneOfStr(ACTION_MATCHES)).is_ok());
        let err = validate("action_match", "some", &Constraint::OneOfStr(ACTION_MATCHES)).unwrap_err();
        assert!(err.to_string().contains("any, all, none"));
    }

    #[test]
    fn test_range_is_inclusive() {
        assert!(validate("frequency", 5_i64, &FREQUENCY_RANGE).is_ok());
        assert!(validate("frequency", 43200_i64, &FREQUENCY_RANGE).is_ok());
        let err = validate("frequency", 4_i64, &FREQUENCY_RANGE).unwrap_err();
        assert!(err.to_string().contains("within the range [5, 43200]"));
    }

    #[test]
    fn test_type_mismatch_fails() {
        assert!(validate("threshold_type", "zero", &Constraint::OneOf(THRESHOLD_TYPES)).is_err());
    }

    #[test]
    fn test_absent_value_passes() {
        assert!(validate_opt("comparison_delta", None::<f64>, &Constraint::OneOf(COMPARISON_DELTAS)).is_ok());
        assert!(validate_opt("rate_limit_count", Some(-1_i64), &Constraint::AtLeast(0.0)).is_err());
    }
}
