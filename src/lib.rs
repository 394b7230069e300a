//! Focus Timer Library
//!
//! This library provides the core functionality for the Focus Timer CLI.
//! It includes:
//! - Session clock and Pomodoro mode state machine
//! - Timer engine owning the countdown and alarm schedules
//! - Synthesized alarm tone with lazy audio unlocking
//! - Settings store with validated edits
//! - Window title side channel
//! - CLI command parsing, input parsing and display utilities

pub mod alarm;
pub mod cli;
pub mod settings;
pub mod timer;
pub mod title;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{SessionMode, TimerSettings, TimerSnapshot, TimerState};

// Re-export timer types
pub use timer::{SessionMachine, TickOutcome, TimerCommand, TimerEngine, TimerEvent};

// Re-export alarm types
pub use alarm::{Alarm, AlarmError, AlarmState, MockToneGenerator, RodioToneGenerator, ToneGenerator};

// Re-export settings types
pub use settings::{EditOutcome, SettingField, SettingsError, SettingsStore};

// Re-export title types
pub use title::{MockTitleSink, TerminalTitleSink, TitleController, TitleSink};
