//! Audible alarm for completed sessions.
//!
//! This module provides:
//!
//! - A synthesized alarm tone (four square-wave notes, A4/A5 alternating)
//! - Lazy audio unlocking on the first user interaction
//! - Repeat-until-acknowledged ringing driven by the timer engine
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │      Alarm       │ ← Ringing state, owned by the timer engine
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │  ToneGenerator   │────▶│ RodioToneGenerator│ (audio worker thread)
//! │                  │     ├──────────────────┤
//! │                  │────▶│ MockToneGenerator │ (tests)
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! The repeat schedule itself (one sequence per [`ALARM_REPEAT_INTERVAL`])
//! lives in the timer engine so that a single owner can cancel it.

mod error;
mod player;
mod tone;

use std::sync::Arc;

use tracing::{debug, warn};

pub use error::AlarmError;
pub use player::RodioToneGenerator;
pub use tone::{
    Note, SquareTone, ToneSequence, ALARM_FREQUENCY_A4, ALARM_FREQUENCY_A5, ALARM_GAIN_VALUE,
    ALARM_NOTE_COUNT, ALARM_NOTE_DURATION, ALARM_REPEAT_INTERVAL, ALARM_SEQUENCE_DURATION,
    SAMPLE_RATE,
};

/// Trait for tone output implementations.
///
/// Implementations must not open an audio device before [`unlock`] is
/// called, and must release every resource in [`close`].
///
/// [`unlock`]: ToneGenerator::unlock
/// [`close`]: ToneGenerator::close
pub trait ToneGenerator: Send + Sync {
    /// Makes the output usable. Called on every user interaction from the
    /// event loop, so it must not block; a device may finish opening after
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the output device could not be opened. A later call
    /// may succeed.
    fn unlock(&self) -> Result<(), AlarmError>;

    /// Returns true once the output is ready for playback.
    fn is_unlocked(&self) -> bool;

    /// Starts playing one sequence without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::Locked`] before unlocking, or a playback error.
    fn play(&self, sequence: &ToneSequence) -> Result<(), AlarmError>;

    /// Stops any sequence that is currently sounding.
    fn silence(&self);

    /// Releases the output device. Idempotent.
    fn close(&self);
}

impl<T: ToneGenerator + ?Sized> ToneGenerator for Arc<T> {
    fn unlock(&self) -> Result<(), AlarmError> {
        (**self).unlock()
    }

    fn is_unlocked(&self) -> bool {
        (**self).is_unlocked()
    }

    fn play(&self, sequence: &ToneSequence) -> Result<(), AlarmError> {
        (**self).play(sequence)
    }

    fn silence(&self) {
        (**self).silence();
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Mock tone generator for testing.
#[derive(Debug, Default)]
pub struct MockToneGenerator {
    play_calls: std::sync::Mutex<Vec<ToneSequence>>,
    unlocked: std::sync::atomic::AtomicBool,
    should_fail: std::sync::atomic::AtomicBool,
    closed: std::sync::atomic::AtomicBool,
    silence_calls: std::sync::atomic::AtomicUsize,
    unlock_calls: std::sync::atomic::AtomicUsize,
}

impl MockToneGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that is already unlocked.
    #[must_use]
    pub fn unlocked() -> Self {
        let mock = Self::new();
        mock.unlocked
            .store(true, std::sync::atomic::Ordering::SeqCst);
        mock
    }

    /// Makes `unlock` and `play` fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_calls.lock().unwrap().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<ToneSequence> {
        self.play_calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn silence_count(&self) -> usize {
        self.silence_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[must_use]
    pub fn unlock_count(&self) -> usize {
        self.unlock_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn clear_calls(&self) {
        self.play_calls.lock().unwrap().clear();
        self.silence_calls
            .store(0, std::sync::atomic::Ordering::SeqCst);
    }
}

impl ToneGenerator for MockToneGenerator {
    fn unlock(&self) -> Result<(), AlarmError> {
        self.unlock_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AlarmError::Closed);
        }
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AlarmError::DeviceNotAvailable("Mock failure".to_string()));
        }
        self.unlocked
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn is_unlocked(&self) -> bool {
        self.unlocked.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn play(&self, sequence: &ToneSequence) -> Result<(), AlarmError> {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AlarmError::Closed);
        }
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AlarmError::PlaybackError("Mock failure".to_string()));
        }
        if !self.is_unlocked() {
            return Err(AlarmError::Locked);
        }
        self.play_calls.lock().unwrap().push(sequence.clone());
        Ok(())
    }

    fn silence(&self) {
        self.silence_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

// ============================================================================
// Alarm
// ============================================================================

/// Observable alarm state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmState {
    /// True from session completion until acknowledgment or reset
    pub is_ringing: bool,
}

/// Session-complete alarm on top of a [`ToneGenerator`].
///
/// Playback failures are logged and swallowed; the ringing state stays
/// accurate even when no sound can be produced.
#[derive(Debug)]
pub struct Alarm<G: ToneGenerator> {
    generator: G,
    sequence: ToneSequence,
    state: AlarmState,
}

impl<G: ToneGenerator> Alarm<G> {
    /// Creates a silent alarm using the standard alarm tone.
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            sequence: ToneSequence::alarm(),
            state: AlarmState::default(),
        }
    }

    /// Returns the current alarm state.
    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Returns true while the alarm is ringing.
    pub fn is_ringing(&self) -> bool {
        self.state.is_ringing
    }

    /// Returns the underlying generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Unlocks audio output. Failures are logged and retried on the next call.
    pub fn unlock(&self) {
        if self.generator.is_unlocked() {
            return;
        }
        match self.generator.unlock() {
            Ok(()) => {}
            Err(e) if e.is_retryable() => {
                warn!("Alarm audio unavailable: {} ({})", e, e.suggestion());
            }
            Err(e) => debug!("Alarm audio not unlocked: {}", e),
        }
    }

    /// Starts ringing and plays the first sequence.
    ///
    /// Returns false if the alarm was already ringing; a completion rings at
    /// most once.
    pub fn trigger(&mut self) -> bool {
        if self.state.is_ringing {
            debug!("Alarm already ringing, ignoring trigger");
            return false;
        }
        self.state.is_ringing = true;
        self.ring_once();
        true
    }

    /// Plays one sequence if the alarm is ringing.
    pub fn ring_once(&self) {
        if !self.state.is_ringing {
            return;
        }
        match self.generator.play(&self.sequence) {
            Ok(()) => debug!("Alarm sequence played"),
            Err(AlarmError::Locked) => debug!("Alarm audio locked, ringing silently"),
            Err(e) => warn!("Failed to play alarm: {}", e),
        }
    }

    /// Stops ringing and silences any sounding sequence.
    ///
    /// Returns true if the alarm was ringing.
    pub fn stop(&mut self) -> bool {
        let was_ringing = self.state.is_ringing;
        self.state.is_ringing = false;
        if was_ringing {
            self.generator.silence();
        }
        was_ringing
    }

    /// Stops ringing and releases the output device.
    pub fn close(&mut self) {
        self.stop();
        self.generator.close();
    }
}
