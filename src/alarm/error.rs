//! Alarm error types.
//!
//! None of these errors stop the timer: the alarm logs them and the
//! acknowledgment flow keeps working without sound.

use thiserror::Error;

/// Errors that can occur while producing the alarm tone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlarmError {
    /// The output device has not been unlocked by a user interaction yet.
    #[error("audio output is locked until the first user interaction")]
    Locked,

    /// No audio output device could be opened.
    #[error("audio device is not available: {0}")]
    DeviceNotAvailable(String),

    /// Failed to create a playback sink on the opened device.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),

    /// The audio worker is gone or refused the command.
    #[error("alarm playback error: {0}")]
    PlaybackError(String),

    /// The generator was closed and cannot be used again.
    #[error("audio output has been closed")]
    Closed,
}

impl AlarmError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if a later user interaction may fix the error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Locked | Self::DeviceNotAvailable(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Locked => "press any timer control to enable sound",
            Self::DeviceNotAvailable(_) => "connect an audio device, then press any timer control",
            Self::StreamError(_) => "check the audio settings of your system",
            Self::PlaybackError(_) => "restart the timer to re-initialize audio",
            Self::Closed => "restart the timer to re-initialize audio",
        }
    }
}
