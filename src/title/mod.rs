//! Window title side channel.
//!
//! This module handles:
//! - Generating the title text for the current countdown (e.g., "24:59 - Focus Timer")
//! - Restoring the default title when the clock is idle
//! - Skipping writes when the title did not change
//!
//! The text generation logic is platform-independent and fully testable;
//! the terminal write goes through the [`TitleSink`] capability.

use std::io::{self, Write};
use std::sync::Arc;

use crossterm::terminal::SetTitle;
use crossterm::QueueableCommand;
use tracing::{debug, warn};

use crate::types::{format_clock, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Title shown while the clock is idle and after teardown.
pub const DEFAULT_TITLE: &str = "Daily Task Tool";

/// Suffix appended to the countdown while a session is active.
const ACTIVE_SUFFIX: &str = "Focus Timer";

/// Formats the active title for a countdown value.
///
/// # Examples
///
/// ```
/// use focus_timer::title::format_title;
///
/// assert_eq!(format_title(1499), "24:59 - Focus Timer");
/// ```
pub fn format_title(seconds_remaining: u32) -> String {
    format!("{} - {}", format_clock(seconds_remaining), ACTIVE_SUFFIX)
}

// ============================================================================
// TitleSink
// ============================================================================

/// Capability for writing the window title.
pub trait TitleSink: Send + Sync {
    /// Replaces the current title.
    ///
    /// # Errors
    ///
    /// Returns an error if the title could not be written.
    fn set_title(&self, title: &str) -> io::Result<()>;
}

impl<T: TitleSink + ?Sized> TitleSink for Arc<T> {
    fn set_title(&self, title: &str) -> io::Result<()> {
        (**self).set_title(title)
    }
}

/// Writes the title of the hosting terminal via an OSC escape sequence.
#[derive(Debug, Clone, Copy)]
pub struct TerminalTitleSink {
    enabled: bool,
}

impl TerminalTitleSink {
    /// Creates a sink; a disabled sink accepts titles and writes nothing.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Returns true if titles are written to the terminal.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl TitleSink for TerminalTitleSink {
    fn set_title(&self, title: &str) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut stdout = io::stdout().lock();
        stdout.queue(SetTitle(title))?;
        stdout.flush()
    }
}

/// Mock title sink for testing.
#[derive(Debug, Default)]
pub struct MockTitleSink {
    titles: std::sync::Mutex<Vec<String>>,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockTitleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Returns every title written so far, oldest first.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    /// Returns the most recent title, if any.
    #[must_use]
    pub fn last_title(&self) -> Option<String> {
        self.titles.lock().unwrap().last().cloned()
    }

    #[must_use]
    pub fn write_count(&self) -> usize {
        self.titles.lock().unwrap().len()
    }
}

impl TitleSink for MockTitleSink {
    fn set_title(&self, title: &str) -> io::Result<()> {
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "Mock failure"));
        }
        self.titles.lock().unwrap().push(title.to_string());
        Ok(())
    }
}

// ============================================================================
// TitleController
// ============================================================================

/// Keeps the window title in sync with the timer.
#[derive(Debug)]
pub struct TitleController<S: TitleSink> {
    sink: S,
    /// Last title successfully written (for de-duplication)
    current: Option<String>,
}

impl<S: TitleSink> TitleController<S> {
    /// Creates a controller. Nothing is written until the first update.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            current: None,
        }
    }

    /// Returns the underlying sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the last title written.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Computes the title for `state`.
    ///
    /// `active` covers a running clock, a completion awaiting
    /// acknowledgment, and a session paused part-way through.
    pub fn title_for(state: &TimerState, active: bool) -> String {
        if active {
            format_title(state.seconds_remaining)
        } else {
            DEFAULT_TITLE.to_string()
        }
    }

    /// Updates the title for `state`. Returns true if a write happened.
    pub fn update(&mut self, state: &TimerState, active: bool) -> bool {
        let title = Self::title_for(state, active);
        self.write(title)
    }

    /// Restores [`DEFAULT_TITLE`]. Returns true if a write happened.
    pub fn restore_default(&mut self) -> bool {
        self.write(DEFAULT_TITLE.to_string())
    }

    fn write(&mut self, title: String) -> bool {
        if self.current.as_deref() == Some(title.as_str()) {
            return false;
        }
        match self.sink.set_title(&title) {
            Ok(()) => {
                debug!("Title set to {:?}", title);
                self.current = Some(title);
                true
            }
            Err(e) => {
                warn!("Failed to set title: {}", e);
                false
            }
        }
    }
}
