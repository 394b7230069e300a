//! Settings error types.
//!
//! Invalid edits never reach the user as failures; the store reports them
//! with these errors so the caller can log and ignore them.

use thiserror::Error;

/// Errors produced when validating a settings value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// The input was not an integer.
    #[error("'{input}' is not a whole number for {field}")]
    NotANumber {
        /// Field being edited
        field: &'static str,
        /// Raw input
        input: String,
    },

    /// The value was outside the allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Field being edited
        field: &'static str,
        /// Rejected value
        value: i64,
        /// Smallest allowed value
        min: u32,
        /// Largest allowed value
        max: u32,
    },

    /// The field name was not recognised.
    #[error("unknown setting '{0}' (expected work, short, long or sessions)")]
    UnknownField(String),
}

impl SettingsError {
    /// Returns true if the value was numeric but out of range.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    /// Returns a short hint on how to fix the input.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NotANumber { .. } => "enter a positive whole number of minutes",
            Self::OutOfRange { .. } => "pick a value inside the allowed range",
            Self::UnknownField(_) => "use one of: work, short, long, sessions",
        }
    }
}
