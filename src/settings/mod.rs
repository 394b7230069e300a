//! Settings store for the Focus Timer.
//!
//! Holds the user-editable durations and the long-break threshold. Edits
//! arrive as raw text; anything that is not a positive integer inside the
//! allowed range is ignored and the previous value is kept.

mod error;

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::types::{TimerSettings, MAX_DURATION_MINUTES, MAX_SESSIONS_BEFORE_LONG_BREAK};

pub use error::SettingsError;

// ============================================================================
// SettingField
// ============================================================================

/// An editable settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    /// Work duration in minutes
    WorkMinutes,
    /// Short break duration in minutes
    ShortBreakMinutes,
    /// Long break duration in minutes
    LongBreakMinutes,
    /// Work sessions before a long break
    SessionsBeforeLongBreak,
}

impl SettingField {
    /// Returns the field name used in input and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingField::WorkMinutes => "work",
            SettingField::ShortBreakMinutes => "short",
            SettingField::LongBreakMinutes => "long",
            SettingField::SessionsBeforeLongBreak => "sessions",
        }
    }

    /// Returns the allowed inclusive range for this field.
    pub fn range(&self) -> (u32, u32) {
        match self {
            SettingField::SessionsBeforeLongBreak => (1, MAX_SESSIONS_BEFORE_LONG_BREAK),
            _ => (1, MAX_DURATION_MINUTES),
        }
    }

    /// All fields, durations first.
    pub const ALL: [SettingField; 4] = [
        SettingField::WorkMinutes,
        SettingField::ShortBreakMinutes,
        SettingField::LongBreakMinutes,
        SettingField::SessionsBeforeLongBreak,
    ];

    /// Returns true for the fields that set a session length.
    ///
    /// Only these feed the countdown; the long-break threshold is read when a
    /// session completes.
    pub fn is_duration(&self) -> bool {
        !matches!(self, SettingField::SessionsBeforeLongBreak)
    }

    fn get(&self, settings: &TimerSettings) -> u32 {
        match self {
            SettingField::WorkMinutes => settings.work_minutes,
            SettingField::ShortBreakMinutes => settings.short_break_minutes,
            SettingField::LongBreakMinutes => settings.long_break_minutes,
            SettingField::SessionsBeforeLongBreak => settings.sessions_before_long_break,
        }
    }

    fn set(&self, settings: &mut TimerSettings, value: u32) {
        match self {
            SettingField::WorkMinutes => settings.work_minutes = value,
            SettingField::ShortBreakMinutes => settings.short_break_minutes = value,
            SettingField::LongBreakMinutes => settings.long_break_minutes = value,
            SettingField::SessionsBeforeLongBreak => settings.sessions_before_long_break = value,
        }
    }

    /// Parses and range-checks a raw value for this field.
    ///
    /// # Errors
    ///
    /// Returns `NotANumber` for non-integer input and `OutOfRange` for
    /// zero, negative or too large values.
    pub fn parse_value(&self, raw: &str) -> Result<u32, SettingsError> {
        let trimmed = raw.trim();
        let value: i64 = trimmed.parse().map_err(|_| SettingsError::NotANumber {
            field: self.as_str(),
            input: trimmed.to_string(),
        })?;
        let (min, max) = self.range();
        if value < i64::from(min) || value > i64::from(max) {
            return Err(SettingsError::OutOfRange {
                field: self.as_str(),
                value,
                min,
                max,
            });
        }
        // In range, so the conversion cannot fail.
        u32::try_from(value).map_err(|_| SettingsError::OutOfRange {
            field: self.as_str(),
            value,
            min,
            max,
        })
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingField {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "w" => Ok(SettingField::WorkMinutes),
            "short" | "short-break" | "short_break" | "break" => {
                Ok(SettingField::ShortBreakMinutes)
            }
            "long" | "long-break" | "long_break" => Ok(SettingField::LongBreakMinutes),
            "sessions" | "session" | "cycle" => Ok(SettingField::SessionsBeforeLongBreak),
            other => Err(SettingsError::UnknownField(other.to_string())),
        }
    }
}

// ============================================================================
// EditOutcome
// ============================================================================

/// Result of applying a single edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// The value was stored
    Applied {
        /// Field that changed
        field: SettingField,
        /// New value
        value: u32,
    },
    /// The value equals the current one
    Unchanged,
    /// The input was rejected and the previous value kept
    Ignored(SettingsError),
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Owner of the timer settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: TimerSettings,
}

impl SettingsStore {
    /// Creates a store from `settings`.
    ///
    /// Fields outside their allowed range are replaced by the default value.
    pub fn new(settings: TimerSettings) -> Self {
        let defaults = TimerSettings::default();
        let mut sanitized = settings;
        for field in SettingField::ALL {
            let (min, max) = field.range();
            let value = field.get(&settings);
            if !(min..=max).contains(&value) {
                warn!(field = %field, value, "invalid setting replaced by default");
                field.set(&mut sanitized, field.get(&defaults));
            }
        }
        Self {
            settings: sanitized,
        }
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    /// Applies a raw text edit to one field.
    pub fn apply_edit(&mut self, field: SettingField, raw: &str) -> EditOutcome {
        match field.parse_value(raw) {
            Ok(value) if value == field.get(&self.settings) => EditOutcome::Unchanged,
            Ok(value) => {
                field.set(&mut self.settings, value);
                debug!(field = %field, value, "setting updated");
                EditOutcome::Applied { field, value }
            }
            Err(e) => {
                debug!(field = %field, error = %e, "setting edit ignored");
                EditOutcome::Ignored(e)
            }
        }
    }

    /// Replaces all settings at once and returns the fields that changed.
    ///
    /// # Errors
    ///
    /// Returns the validation error and keeps the previous settings if any
    /// field is invalid.
    pub fn replace(&mut self, settings: TimerSettings) -> Result<Vec<SettingField>, SettingsError> {
        settings.validate()?;
        let changed: Vec<SettingField> = SettingField::ALL
            .into_iter()
            .filter(|field| field.get(&settings) != field.get(&self.settings))
            .collect();
        if !changed.is_empty() {
            debug!(?changed, "settings replaced");
        }
        self.settings = settings;
        Ok(changed)
    }
}
