//! Alarm tone definition and square-wave synthesis.
//!
//! The alarm is four short notes alternating between A4 and A5. The gain
//! starts at [`ALARM_GAIN_VALUE`] and ramps down to silence over
//! [`ALARM_SEQUENCE_DURATION`], measured from the start of the sequence.

use std::time::Duration;

use rodio::Source;

/// Frequency of the low note (A4).
pub const ALARM_FREQUENCY_A4: f32 = 440.0;

/// Frequency of the high note (A5).
pub const ALARM_FREQUENCY_A5: f32 = 880.0;

/// Length of a single note.
pub const ALARM_NOTE_DURATION: Duration = Duration::from_millis(100);

/// Time it takes the gain to ramp down to silence.
pub const ALARM_SEQUENCE_DURATION: Duration = Duration::from_millis(500);

/// Initial gain of the sequence.
pub const ALARM_GAIN_VALUE: f32 = 0.1;

/// Number of notes in one sequence.
pub const ALARM_NOTE_COUNT: usize = 4;

/// Delay between two repetitions of the sequence while ringing.
pub const ALARM_REPEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Sample rate used for synthesis.
pub const SAMPLE_RATE: u32 = 44_100;

// ============================================================================
// ToneSequence
// ============================================================================

/// A single square-wave note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Pitch in hertz
    pub frequency_hz: f32,
    /// How long the note sounds
    pub duration: Duration,
}

/// A sequence of notes played back to back under one decaying gain envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneSequence {
    notes: Vec<Note>,
    gain: f32,
    decay: Duration,
}

impl ToneSequence {
    /// Creates a sequence from its parts.
    pub fn new(notes: Vec<Note>, gain: f32, decay: Duration) -> Self {
        Self { notes, gain, decay }
    }

    /// The session-complete alarm: A4, A5, A4, A5.
    pub fn alarm() -> Self {
        let notes = (0..ALARM_NOTE_COUNT)
            .map(|i| Note {
                frequency_hz: if i % 2 == 0 {
                    ALARM_FREQUENCY_A4
                } else {
                    ALARM_FREQUENCY_A5
                },
                duration: ALARM_NOTE_DURATION,
            })
            .collect();
        Self::new(notes, ALARM_GAIN_VALUE, ALARM_SEQUENCE_DURATION)
    }

    /// Returns the notes of the sequence.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns the initial gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Total playback length: the longer of the notes and the decay.
    pub fn duration(&self) -> Duration {
        let notes: Duration = self.notes.iter().map(|n| n.duration).sum();
        notes.max(self.decay)
    }

    /// Returns the pitch sounding at `at`, or `None` once all notes ended.
    pub fn frequency_at(&self, at: Duration) -> Option<f32> {
        let mut end = Duration::ZERO;
        for note in &self.notes {
            end += note.duration;
            if at < end {
                return Some(note.frequency_hz);
            }
        }
        None
    }

    /// Returns the envelope gain at `at`.
    pub fn gain_at(&self, at: Duration) -> f32 {
        if self.decay.is_zero() || at >= self.decay {
            return 0.0;
        }
        let remaining = 1.0 - at.as_secs_f32() / self.decay.as_secs_f32();
        self.gain * remaining.max(0.0)
    }

    /// Builds a playable rodio source for this sequence.
    pub fn to_source(&self) -> SquareTone {
        SquareTone::new(self.clone(), SAMPLE_RATE)
    }
}

// ============================================================================
// SquareTone
// ============================================================================

/// Mono square-wave rodio source rendering a [`ToneSequence`].
#[derive(Debug, Clone)]
pub struct SquareTone {
    sequence: ToneSequence,
    sample_rate: u32,
    index: u64,
    total_samples: u64,
}

impl SquareTone {
    /// Creates a source at the given sample rate.
    pub fn new(sequence: ToneSequence, sample_rate: u32) -> Self {
        let total_samples =
            (sequence.duration().as_secs_f64() * f64::from(sample_rate)).round() as u64;
        Self {
            sequence,
            sample_rate,
            index: 0,
            total_samples,
        }
    }

    fn remaining(&self) -> u64 {
        self.total_samples.saturating_sub(self.index)
    }
}

impl Iterator for SquareTone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total_samples {
            return None;
        }
        let t = self.index as f64 / f64::from(self.sample_rate);
        self.index += 1;

        let at = Duration::from_secs_f64(t);
        let sample = match self.sequence.frequency_at(at) {
            Some(freq) => {
                let level = if (t * f64::from(freq)).fract() < 0.5 {
                    1.0
                } else {
                    -1.0
                };
                level * self.sequence.gain_at(at)
            }
            None => 0.0,
        };
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl Source for SquareTone {
    fn current_frame_len(&self) -> Option<usize> {
        usize::try_from(self.remaining()).ok()
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.sequence.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Constant Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_alarm_constants() {
        assert_eq!(ALARM_FREQUENCY_A4, 440.0);
        assert_eq!(ALARM_FREQUENCY_A5, 880.0);
        assert_eq!(ALARM_NOTE_DURATION, Duration::from_millis(100));
        assert_eq!(ALARM_SEQUENCE_DURATION, Duration::from_millis(500));
        assert_eq!(ALARM_GAIN_VALUE, 0.1);
    }

    // ------------------------------------------------------------------------
    // ToneSequence Tests
    // ------------------------------------------------------------------------

    mod sequence_tests {
        use super::*;

        #[test]
        fn test_alarm_alternates_pitches() {
            let sequence = ToneSequence::alarm();
            let freqs: Vec<f32> = sequence.notes().iter().map(|n| n.frequency_hz).collect();
            assert_eq!(freqs, vec![440.0, 880.0, 440.0, 880.0]);
            assert!(sequence
                .notes()
                .iter()
                .all(|n| n.duration == ALARM_NOTE_DURATION));
        }

        #[test]
        fn test_alarm_duration_is_decay() {
            assert_eq!(ToneSequence::alarm().duration(), Duration::from_millis(500));
            assert_eq!(ToneSequence::alarm().gain(), ALARM_GAIN_VALUE);
        }

        #[test]
        fn test_frequency_at() {
            let sequence = ToneSequence::alarm();
            assert_eq!(sequence.frequency_at(Duration::ZERO), Some(440.0));
            assert_eq!(sequence.frequency_at(Duration::from_millis(150)), Some(880.0));
            assert_eq!(sequence.frequency_at(Duration::from_millis(200)), Some(440.0));
            assert_eq!(sequence.frequency_at(Duration::from_millis(399)), Some(880.0));
            assert_eq!(sequence.frequency_at(Duration::from_millis(400)), None);
        }

        #[test]
        fn test_gain_ramps_to_silence() {
            let sequence = ToneSequence::alarm();
            assert!((sequence.gain_at(Duration::ZERO) - 0.1).abs() < 1e-6);
            assert!((sequence.gain_at(Duration::from_millis(250)) - 0.05).abs() < 1e-6);
            assert_eq!(sequence.gain_at(Duration::from_millis(500)), 0.0);
            assert_eq!(sequence.gain_at(Duration::from_secs(2)), 0.0);
        }

        #[test]
        fn test_gain_monotonic() {
            let sequence = ToneSequence::alarm();
            let mut previous = f32::MAX;
            for ms in (0..=500).step_by(10) {
                let gain = sequence.gain_at(Duration::from_millis(ms));
                assert!(gain <= previous);
                previous = gain;
            }
        }

        #[test]
        fn test_zero_decay_is_silent() {
            let sequence = ToneSequence::new(
                vec![Note {
                    frequency_hz: 440.0,
                    duration: Duration::from_millis(100),
                }],
                0.5,
                Duration::ZERO,
            );
            assert_eq!(sequence.gain_at(Duration::ZERO), 0.0);
            assert_eq!(sequence.duration(), Duration::from_millis(100));
        }
    }

    // ------------------------------------------------------------------------
    // SquareTone Tests
    // ------------------------------------------------------------------------

    mod square_tone_tests {
        use super::*;

        #[test]
        fn test_sample_count_matches_duration() {
            let source = ToneSequence::alarm().to_source();
            assert_eq!(source.sample_rate(), SAMPLE_RATE);
            assert_eq!(source.channels(), 1);
            assert_eq!(source.total_duration(), Some(Duration::from_millis(500)));
            assert_eq!(source.count(), 22_050);
        }

        #[test]
        fn test_samples_bounded_by_gain() {
            let source = ToneSequence::alarm().to_source();
            assert!(source.clone().all(|s| s.abs() <= ALARM_GAIN_VALUE + 1e-6));
            // First sample is at full gain on the positive half-wave.
            let first = ToneSequence::alarm().to_source().next().unwrap();
            assert!((first - ALARM_GAIN_VALUE).abs() < 1e-6);
        }

        #[test]
        fn test_tail_after_notes_is_silent() {
            let source = SquareTone::new(ToneSequence::alarm(), 1_000);
            let tail: Vec<f32> = source.skip(400).collect();
            assert_eq!(tail.len(), 100);
            assert!(tail.iter().all(|s| *s == 0.0));
        }

        #[test]
        fn test_square_wave_changes_sign() {
            let source = SquareTone::new(ToneSequence::alarm(), 8_000);
            let samples: Vec<f32> = source.take(100).collect();
            assert!(samples.iter().any(|s| *s > 0.0));
            assert!(samples.iter().any(|s| *s < 0.0));
        }

        #[test]
        fn test_frame_len_counts_down() {
            let mut source = SquareTone::new(ToneSequence::alarm(), 1_000);
            assert_eq!(source.current_frame_len(), Some(500));
            source.next();
            assert_eq!(source.current_frame_len(), Some(499));
            assert_eq!(source.size_hint(), (499, Some(499)));
        }
    }
}
