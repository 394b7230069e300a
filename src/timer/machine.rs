//! Session clock and mode state machine.
//!
//! This module is purely synchronous: it knows nothing about intervals or
//! audio. The engine feeds it ticks and user actions and reacts to the
//! returned outcomes.
//!
//! Mode transitions:
//!
//! | Current    | Condition                                   | Next       |
//! |------------|---------------------------------------------|------------|
//! | Work       | `(completed + 1) % sessions_before_long == 0` | LongBreak  |
//! | Work       | otherwise                                   | ShortBreak |
//! | ShortBreak | always                                      | Work       |
//! | LongBreak  | always                                      | Work       |

use tracing::debug;

use crate::types::{SessionMode, TimerSettings, TimerSnapshot, TimerState};

// ============================================================================
// TickOutcome
// ============================================================================

/// What a single tick did to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock was not running; nothing changed
    Idle,
    /// One second elapsed and the session continues
    Counting {
        /// Seconds left after this tick
        remaining: u32,
    },
    /// The session reached zero on this tick
    Completed {
        /// Mode of the session that just ended
        finished: SessionMode,
        /// Mode that acknowledgment will switch to
        next: SessionMode,
    },
}

// ============================================================================
// SessionMachine
// ============================================================================

/// Countdown plus Pomodoro cycle bookkeeping.
///
/// A completed session stays pending until it is acknowledged; while pending
/// the clock cannot be started and settings changes do not touch the
/// countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMachine {
    state: TimerState,
    /// Next mode of a completed session awaiting acknowledgment
    pending: Option<SessionMode>,
}

impl SessionMachine {
    /// Creates a paused work session.
    pub fn new(settings: &TimerSettings) -> Self {
        Self {
            state: TimerState::new(settings),
            pending: None,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns the next mode if a completed session awaits acknowledgment.
    pub fn pending_next(&self) -> Option<SessionMode> {
        self.pending
    }

    /// Returns true while a completed session awaits acknowledgment.
    pub fn is_awaiting_acknowledgment(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns true when the window title should show the countdown.
    pub fn is_active(&self) -> bool {
        self.state.is_running || self.pending.is_some() || self.state.is_partially_elapsed()
    }

    /// Computes the mode that follows `finished`.
    ///
    /// `completed_work_sessions` is the count before the finished session is
    /// recorded.
    pub fn next_mode_after(
        finished: SessionMode,
        completed_work_sessions: u32,
        settings: &TimerSettings,
    ) -> SessionMode {
        match finished {
            SessionMode::Work => {
                let sessions = settings.sessions_before_long_break.max(1);
                if (completed_work_sessions + 1) % sessions == 0 {
                    SessionMode::LongBreak
                } else {
                    SessionMode::ShortBreak
                }
            }
            SessionMode::ShortBreak | SessionMode::LongBreak => SessionMode::Work,
        }
    }

    /// Starts the clock. Returns true if it was not running before.
    ///
    /// Does nothing while a completion awaits acknowledgment or when no time
    /// is left.
    pub fn start(&mut self) -> bool {
        if self.state.is_running || self.pending.is_some() || self.state.seconds_remaining == 0 {
            return false;
        }
        self.state.is_running = true;
        debug!(mode = %self.state.mode, remaining = self.state.seconds_remaining, "clock started");
        true
    }

    /// Pauses the clock. Returns true if it was running.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.state.is_running = false;
        debug!(remaining = self.state.seconds_remaining, "clock paused");
        true
    }

    /// Advances the clock by one second.
    pub fn tick(&mut self, settings: &TimerSettings) -> TickOutcome {
        if !self.state.is_running {
            return TickOutcome::Idle;
        }

        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        if self.state.seconds_remaining > 0 {
            return TickOutcome::Counting {
                remaining: self.state.seconds_remaining,
            };
        }

        self.state.is_running = false;
        let finished = self.state.mode;
        let next = Self::next_mode_after(finished, self.state.completed_work_sessions, settings);
        self.pending = Some(next);
        debug!(%finished, %next, "session completed");
        TickOutcome::Completed { finished, next }
    }

    /// Applies a pending completion and resumes the clock in the next mode.
    ///
    /// Returns the new mode, or `None` if nothing was pending.
    pub fn acknowledge(&mut self, settings: &TimerSettings) -> Option<SessionMode> {
        let next = self.pending.take()?;
        if self.state.mode == SessionMode::Work {
            self.state.completed_work_sessions += 1;
        }
        self.state.derive(next, settings);
        self.state.is_running = true;
        debug!(
            mode = %next,
            completed = self.state.completed_work_sessions,
            "completion acknowledged"
        );
        Some(next)
    }

    /// Stops the clock and re-derives the countdown for `mode`.
    ///
    /// Clears any pending completion; the work session count is kept.
    pub fn reset_to(&mut self, mode: SessionMode, settings: &TimerSettings) {
        self.pending = None;
        self.state.is_running = false;
        self.state.derive(mode, settings);
    }

    /// Restarts the current session from its full duration.
    pub fn restart_session(&mut self, settings: &TimerSettings) {
        let mode = self.state.mode;
        self.reset_to(mode, settings);
    }

    /// Switches to `mode` manually.
    pub fn select_mode(&mut self, mode: SessionMode, settings: &TimerSettings) {
        self.reset_to(mode, settings);
    }

    /// Returns to a fresh cycle: work mode, zero completed sessions.
    pub fn reset(&mut self, settings: &TimerSettings) {
        self.reset_to(SessionMode::Work, settings);
        self.state.completed_work_sessions = 0;
    }

    /// Reacts to changed settings. Returns true if the countdown was re-derived.
    ///
    /// The countdown follows the settings only while the clock is stopped and
    /// no completion is pending; otherwise the change takes effect with the
    /// next session.
    pub fn settings_changed(&mut self, settings: &TimerSettings) -> bool {
        if self.state.is_running || self.pending.is_some() {
            return false;
        }
        let mode = self.state.mode;
        self.state.derive(mode, settings);
        true
    }

    /// Builds a render snapshot.
    pub fn snapshot(&self, is_ringing: bool) -> TimerSnapshot {
        TimerSnapshot::new(&self.state, is_ringing, self.pending)
    }
}
