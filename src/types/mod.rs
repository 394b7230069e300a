//! Core data types for the Focus Timer.
//!
//! This module defines the data structures used for:
//! - Session modes and their labels
//! - Timer settings with validation
//! - Live timer state
//! - Snapshot serialization for rendering

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::SettingsError;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for any duration setting, in minutes (one day).
pub const MAX_DURATION_MINUTES: u32 = 1440;

/// Upper bound for the number of work sessions before a long break.
pub const MAX_SESSIONS_BEFORE_LONG_BREAK: u32 = 12;

// ============================================================================
// SessionMode
// ============================================================================

/// The phase of the Pomodoro cycle a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Focused work period
    #[default]
    Work,
    /// Short break between work periods
    ShortBreak,
    /// Long break after a full set of work periods
    LongBreak,
}

impl SessionMode {
    /// All modes in tab order.
    pub const ALL: [SessionMode; 3] = [
        SessionMode::Work,
        SessionMode::ShortBreak,
        SessionMode::LongBreak,
    ];

    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Work => "work",
            SessionMode::ShortBreak => "short_break",
            SessionMode::LongBreak => "long_break",
        }
    }

    /// Returns the label shown next to the countdown.
    pub fn label(&self) -> &'static str {
        match self {
            SessionMode::Work => "Work Time",
            SessionMode::ShortBreak => "Short Break",
            SessionMode::LongBreak => "Long Break",
        }
    }

    /// Returns the message shown when a session of this mode completes.
    pub fn completion_message(&self) -> &'static str {
        match self {
            SessionMode::Work => "Work session complete! Time for a break.",
            SessionMode::ShortBreak => "Short break is over. Back to work!",
            SessionMode::LongBreak => "Long break is over. Ready for a new cycle?",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" | "w" => Ok(SessionMode::Work),
            "short" | "short-break" | "short_break" | "s" => Ok(SessionMode::ShortBreak),
            "long" | "long-break" | "long_break" | "l" => Ok(SessionMode::LongBreak),
            other => Err(format!("unknown mode '{other}' (expected work, short or long)")),
        }
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// User-editable configuration for the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettings {
    /// Work duration in minutes
    pub work_minutes: u32,
    /// Short break duration in minutes
    pub short_break_minutes: u32,
    /// Long break duration in minutes
    pub long_break_minutes: u32,
    /// Completed work sessions that earn a long break
    pub sessions_before_long_break: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_before_long_break: 4,
        }
    }
}

impl TimerSettings {
    /// Returns a copy with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Returns a copy with the specified short break duration.
    pub fn with_short_break_minutes(mut self, minutes: u32) -> Self {
        self.short_break_minutes = minutes;
        self
    }

    /// Returns a copy with the specified long break duration.
    pub fn with_long_break_minutes(mut self, minutes: u32) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Returns a copy with the specified long-break threshold.
    pub fn with_sessions_before_long_break(mut self, sessions: u32) -> Self {
        self.sessions_before_long_break = sessions;
        self
    }

    /// Returns the configured duration of `mode` in minutes.
    pub fn duration_minutes(&self, mode: SessionMode) -> u32 {
        match mode {
            SessionMode::Work => self.work_minutes,
            SessionMode::ShortBreak => self.short_break_minutes,
            SessionMode::LongBreak => self.long_break_minutes,
        }
    }

    /// Returns the configured duration of `mode` in seconds.
    pub fn duration_seconds(&self, mode: SessionMode) -> u32 {
        self.duration_minutes(mode).saturating_mul(60)
    }

    /// Validates every field.
    ///
    /// # Errors
    ///
    /// Returns the first field that is outside its allowed range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for mode in SessionMode::ALL {
            let minutes = self.duration_minutes(mode);
            if !(1..=MAX_DURATION_MINUTES).contains(&minutes) {
                return Err(SettingsError::OutOfRange {
                    field: mode.as_str(),
                    value: i64::from(minutes),
                    min: 1,
                    max: MAX_DURATION_MINUTES,
                });
            }
        }
        if !(1..=MAX_SESSIONS_BEFORE_LONG_BREAK).contains(&self.sessions_before_long_break) {
            return Err(SettingsError::OutOfRange {
                field: "sessions",
                value: i64::from(self.sessions_before_long_break),
                min: 1,
                max: MAX_SESSIONS_BEFORE_LONG_BREAK,
            });
        }
        Ok(())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// The live, mutable state of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Current mode
    pub mode: SessionMode,
    /// Seconds left in the current session
    pub seconds_remaining: u32,
    /// Full length of the current session, captured when it was derived
    pub session_seconds: u32,
    /// Whether the countdown is ticking
    pub is_running: bool,
    /// Work sessions finished since the last full reset
    pub completed_work_sessions: u32,
}

impl TimerState {
    /// Creates the initial state: a fresh, paused work session.
    pub fn new(settings: &TimerSettings) -> Self {
        let seconds = settings.duration_seconds(SessionMode::Work);
        Self {
            mode: SessionMode::Work,
            seconds_remaining: seconds,
            session_seconds: seconds,
            is_running: false,
            completed_work_sessions: 0,
        }
    }

    /// Re-derives the countdown for `mode` from `settings`.
    pub(crate) fn derive(&mut self, mode: SessionMode, settings: &TimerSettings) {
        let seconds = settings.duration_seconds(mode);
        self.mode = mode;
        self.seconds_remaining = seconds;
        self.session_seconds = seconds;
    }

    /// Seconds already spent in the current session.
    pub fn elapsed_seconds(&self) -> u32 {
        self.session_seconds.saturating_sub(self.seconds_remaining)
    }

    /// Returns true when part of the session has already elapsed.
    pub fn is_partially_elapsed(&self) -> bool {
        self.seconds_remaining != self.session_seconds
    }

    /// Progress through the session as a percentage in `0.0..=100.0`.
    pub fn progress_percent(&self) -> f64 {
        if self.session_seconds == 0 {
            return 0.0;
        }
        let ratio = f64::from(self.elapsed_seconds()) / f64::from(self.session_seconds);
        (ratio * 100.0).clamp(0.0, 100.0)
    }

    /// Countdown formatted as `mm:ss`.
    pub fn display(&self) -> String {
        format_clock(self.seconds_remaining)
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Read-only view of the timer used for rendering and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Current mode
    pub mode: SessionMode,
    /// Label of the current mode
    pub mode_label: String,
    /// Seconds left in the current session
    pub seconds_remaining: u32,
    /// Countdown formatted as `mm:ss`
    pub display: String,
    /// Progress through the session (0-100)
    pub progress_percent: f64,
    /// Whether the countdown is ticking
    pub is_running: bool,
    /// Work sessions finished since the last full reset
    pub completed_work_sessions: u32,
    /// Whether the alarm is ringing
    pub is_ringing: bool,
    /// Mode that starts on acknowledgment, if a session just completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_mode: Option<SessionMode>,
}

impl TimerSnapshot {
    /// Builds a snapshot from the timer state and alarm status.
    pub fn new(state: &TimerState, is_ringing: bool, next_mode: Option<SessionMode>) -> Self {
        Self {
            mode: state.mode,
            mode_label: state.mode.label().to_string(),
            seconds_remaining: state.seconds_remaining,
            display: state.display(),
            progress_percent: state.progress_percent(),
            is_running: state.is_running,
            completed_work_sessions: state.completed_work_sessions,
            is_ringing,
            next_mode,
        }
    }

    /// Returns true while a completed session waits for acknowledgment.
    pub fn awaiting_acknowledgment(&self) -> bool {
        self.next_mode.is_some()
    }
}

/// Formats a number of seconds as zero-padded `mm:ss`.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// Tests
// ============================================================================
