//! Display utilities for the Focus Timer CLI.
//!
//! This module provides formatted output for:
//! - The in-place status line
//! - Completion prompts
//! - Settings and help messages
//! - JSON snapshot lines
//! - Error messages
//!
//! Formatting functions return strings so they can be tested; the `show_*`
//! functions write them to the terminal.

use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;

use crate::types::{SessionMode, TimerSettings, TimerSnapshot};

/// Width of the progress bar in characters.
const PROGRESS_BAR_WIDTH: usize = 20;

const HELP_TEXT: &str = "\
Commands:
  t, toggle, <enter>     start or pause the clock
  start / pause          start or pause explicitly
  r, restart             restart the current session
  reset                  back to a fresh work cycle
  mode <work|short|long> switch mode (also: work, short, long)
  n, next, ok            acknowledge a finished session
  set <field> <minutes>  change a setting (work, short, long, sessions)
  defaults               restore the default settings
  status                 show the current status
  h, help, ?             show this help
  q, quit                quit";

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Renders a progress bar for a percentage in `0.0..=100.0`.
    pub fn progress_bar(percent: f64, width: usize) -> String {
        let ratio = (percent / 100.0).clamp(0.0, 1.0);
        let filled = ((ratio * width as f64).round() as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }

    /// Formats the one-line status, e.g.
    /// `[Work Time] 24:59 ░░░░░░░░░░░░░░░░░░░░ 0% · sessions 1 · running`.
    pub fn status_line(snapshot: &TimerSnapshot) -> String {
        let state = if snapshot.is_ringing || snapshot.awaiting_acknowledgment() {
            "ringing"
        } else if snapshot.is_running {
            "running"
        } else {
            "paused"
        };
        format!(
            "[{}] {} {} {:.0}% · sessions {} · {}",
            snapshot.mode_label,
            snapshot.display,
            Self::progress_bar(snapshot.progress_percent, PROGRESS_BAR_WIDTH),
            snapshot.progress_percent.floor(),
            snapshot.completed_work_sessions,
            state
        )
    }

    /// Formats the prompt shown when a session completes.
    pub fn completion_prompt(finished: SessionMode, next: SessionMode) -> String {
        format!(
            "{} Next: {}. Type 'n' and press Enter to continue.",
            finished.completion_message(),
            next.label()
        )
    }

    /// Formats a settings summary.
    pub fn settings_summary(settings: &TimerSettings) -> String {
        format!(
            "work {}m · short break {}m · long break {}m · long break every {} sessions",
            settings.work_minutes,
            settings.short_break_minutes,
            settings.long_break_minutes,
            settings.sessions_before_long_break
        )
    }

    /// Formats the message shown after a settings change.
    pub fn settings_changed(settings: &TimerSettings, rederived: bool) -> String {
        let mut message = format!("Settings updated: {}", Self::settings_summary(settings));
        if !rederived {
            message.push_str(" (applies from the next session)");
        }
        message
    }

    /// Serializes a snapshot as one JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json_line(snapshot: &TimerSnapshot) -> serde_json::Result<String> {
        serde_json::to_string(snapshot)
    }

    /// Returns the interactive help text.
    pub fn help_text() -> &'static str {
        HELP_TEXT
    }

    /// Shows the welcome banner.
    pub fn show_welcome(settings: &TimerSettings) {
        println!("Focus Timer ({})", Self::settings_summary(settings));
        println!("Press Enter to start, 'h' for help, 'q' to quit.");
    }

    /// Redraws the status line in place.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn show_status_line(snapshot: &TimerSnapshot) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(Self::status_line(snapshot)))?;
        stdout.flush()
    }

    /// Prints a message on its own line, above the status line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn show_message(message: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(message))?
            .queue(Print("\n"))?;
        stdout.flush()
    }

    /// Prints a snapshot as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn show_json(snapshot: &TimerSnapshot) -> anyhow::Result<()> {
        let line = Self::json_line(snapshot)?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }

    /// Moves the cursor past the status line before exiting.
    pub fn finish() {
        println!();
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }
}

// ============================================================================
// Tests
// ============================================================================
