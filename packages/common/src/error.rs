use thiserror::Error;

/// Returned when a status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{value}'. Valid values: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str, valid: &[&'static str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: valid.join(", "),
        }
    }
}
