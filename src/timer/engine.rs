//! Timer engine for the Focus Timer.
//!
//! This module provides the controller that ties everything together:
//! - Command processing (start, pause, acknowledge, settings edits, ...)
//! - Countdown with `tokio::time::interval_at`
//! - Alarm repetition while a completion awaits acknowledgment
//! - Event firing and snapshot publishing for the front-end
//! - Teardown on every exit path
//!
//! The engine is the single owner of both interval handles. Each lives in
//! an `Option`; dropping the handle cancels the timer.

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::alarm::{Alarm, ToneGenerator, ALARM_REPEAT_INTERVAL};
use crate::settings::{EditOutcome, SettingField, SettingsStore};
use crate::timer::machine::{SessionMachine, TickOutcome};
use crate::title::{TitleController, TitleSink};
use crate::types::{SessionMode, TimerSettings, TimerSnapshot, TimerState};

/// Period of the countdown tick.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// TimerCommand
// ============================================================================

/// User actions fed into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start if paused, pause if running
    Toggle,
    /// Start the clock
    Start,
    /// Pause the clock
    Pause,
    /// Restart the current session from its full duration
    RestartSession,
    /// Back to a fresh work cycle
    Reset,
    /// Switch mode manually
    SelectMode(SessionMode),
    /// Confirm a completed session
    Acknowledge,
    /// Edit one setting from raw text
    EditSetting(SettingField, String),
    /// Replace every setting at once
    ReplaceSettings(TimerSettings),
    /// Stop the engine
    Shutdown,
}

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for rendering and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The clock started
    Started {
        /// Mode of the running session
        mode: SessionMode,
    },
    /// The clock paused
    Paused,
    /// One second elapsed (tick)
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// A session reached zero and the alarm started ringing
    SessionCompleted {
        /// Mode of the finished session
        finished: SessionMode,
        /// Mode that acknowledgment switches to
        next: SessionMode,
    },
    /// The alarm sequence was repeated
    AlarmRepeated,
    /// A completion was acknowledged and the next session started
    Acknowledged {
        /// Mode of the new session
        mode: SessionMode,
    },
    /// The mode was switched manually
    ModeSelected {
        /// Selected mode
        mode: SessionMode,
    },
    /// The current session was restarted
    SessionRestarted {
        /// Mode of the restarted session
        mode: SessionMode,
    },
    /// The cycle was reset
    Reset,
    /// A setting changed
    SettingsChanged {
        /// Settings after the change
        settings: TimerSettings,
        /// Whether the countdown followed the change immediately
        rederived: bool,
    },
    /// The engine stopped
    Shutdown,
}

/// Waits for the next tick of an optional interval; pends forever on `None`.
async fn next_tick(interval: &mut Option<Interval>) -> Instant {
    match interval {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

/// Creates an interval whose first tick fires one `period` from now.
fn periodic(period: Duration, behavior: MissedTickBehavior) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(behavior);
    interval
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the session state and every side effect.
pub struct TimerEngine<G: ToneGenerator, S: TitleSink> {
    /// Clock and mode state machine
    machine: SessionMachine,
    /// Current settings
    settings: SettingsStore,
    /// Session-complete alarm
    alarm: Alarm<G>,
    /// Window title side channel
    title: TitleController<S>,
    /// Countdown handle, present while the clock runs
    countdown: Option<Interval>,
    /// Alarm repeat handle, present while the alarm rings
    alarm_repeat: Option<Interval>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    /// Latest snapshot for renderers
    snapshot_tx: watch::Sender<TimerSnapshot>,
    /// Whether teardown already ran
    torn_down: bool,
}

impl<G: ToneGenerator, S: TitleSink> TimerEngine<G, S> {
    /// Creates a new engine with a paused work session.
    ///
    /// Nothing is written to the title and no audio device is opened until
    /// the engine processes its first command or runs.
    pub fn new(
        settings: TimerSettings,
        generator: G,
        title_sink: S,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let settings = SettingsStore::new(settings);
        let machine = SessionMachine::new(settings.settings());
        let (snapshot_tx, _) = watch::channel(machine.snapshot(false));
        Self {
            machine,
            settings,
            alarm: Alarm::new(generator),
            title: TitleController::new(title_sink),
            countdown: None,
            alarm_repeat: None,
            event_tx,
            snapshot_tx,
            torn_down: false,
        }
    }

    /// Returns a receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Builds a snapshot of the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.machine.snapshot(self.alarm.is_ringing())
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        self.machine.state()
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &TimerSettings {
        self.settings.settings()
    }

    /// Returns the alarm.
    pub fn alarm(&self) -> &Alarm<G> {
        &self.alarm
    }

    /// Returns the title controller.
    pub fn title(&self) -> &TitleController<S> {
        &self.title
    }

    /// Returns true while the countdown handle is alive.
    pub fn is_countdown_scheduled(&self) -> bool {
        self.countdown.is_some()
    }

    /// Returns true while the alarm repeat handle is alive.
    pub fn is_alarm_scheduled(&self) -> bool {
        self.alarm_repeat.is_some()
    }

    /// Returns true once teardown has run.
    pub fn is_shut_down(&self) -> bool {
        self.torn_down
    }

    /// Runs the engine until `Shutdown` or until the command channel closes.
    ///
    /// Teardown runs on every exit path, including errors.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<TimerCommand>) -> Result<()> {
        info!("Timer engine started");
        self.publish();
        let result = self.run_loop(&mut commands).await;
        self.shutdown();
        info!("Timer engine stopped");
        result
    }

    async fn run_loop(&mut self, commands: &mut mpsc::UnboundedReceiver<TimerCommand>) -> Result<()> {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if !self.handle(command)? {
                            return Ok(());
                        }
                    }
                    None => {
                        debug!("Command channel closed");
                        return Ok(());
                    }
                },
                _ = next_tick(&mut self.countdown) => self.on_countdown_tick()?,
                _ = next_tick(&mut self.alarm_repeat) => self.on_alarm_repeat()?,
            }
        }
    }

    /// Processes one command. Returns false once the engine should stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn handle(&mut self, command: TimerCommand) -> Result<bool> {
        if self.torn_down {
            debug!(?command, "Engine shut down, ignoring command");
            return Ok(false);
        }
        debug!(?command, "Handling command");
        self.alarm.unlock();

        match command {
            TimerCommand::Toggle => {
                if self.machine.state().is_running {
                    self.pause()?;
                } else {
                    self.start()?;
                }
            }
            TimerCommand::Start => self.start()?,
            TimerCommand::Pause => self.pause()?,
            TimerCommand::RestartSession => {
                self.stop_alarm();
                self.countdown = None;
                self.machine.restart_session(self.settings.settings());
                let mode = self.machine.state().mode;
                self.event_tx
                    .send(TimerEvent::SessionRestarted { mode })
                    .context("Failed to send session restarted event")?;
            }
            TimerCommand::Reset => {
                self.stop_alarm();
                self.countdown = None;
                self.machine.reset(self.settings.settings());
                self.event_tx
                    .send(TimerEvent::Reset)
                    .context("Failed to send reset event")?;
            }
            TimerCommand::SelectMode(mode) => {
                self.stop_alarm();
                self.countdown = None;
                self.machine.select_mode(mode, self.settings.settings());
                self.event_tx
                    .send(TimerEvent::ModeSelected { mode })
                    .context("Failed to send mode selected event")?;
            }
            TimerCommand::Acknowledge => self.acknowledge()?,
            TimerCommand::EditSetting(field, raw) => self.edit_setting(field, &raw)?,
            TimerCommand::ReplaceSettings(settings) => self.replace_settings(settings)?,
            TimerCommand::Shutdown => {
                self.shutdown();
                self.event_tx
                    .send(TimerEvent::Shutdown)
                    .context("Failed to send shutdown event")?;
                return Ok(false);
            }
        }

        self.publish();
        Ok(true)
    }

    fn start(&mut self) -> Result<()> {
        if !self.machine.start() {
            debug!("Start ignored");
            return Ok(());
        }
        self.countdown = Some(periodic(TICK_PERIOD, MissedTickBehavior::Burst));
        self.event_tx
            .send(TimerEvent::Started {
                mode: self.machine.state().mode,
            })
            .context("Failed to send started event")?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.countdown = None;
        if self.machine.pause() {
            self.event_tx
                .send(TimerEvent::Paused)
                .context("Failed to send paused event")?;
        }
        Ok(())
    }

    fn acknowledge(&mut self) -> Result<()> {
        let Some(mode) = self.machine.acknowledge(self.settings.settings()) else {
            debug!("Nothing to acknowledge");
            return Ok(());
        };
        self.stop_alarm();
        self.countdown = Some(periodic(TICK_PERIOD, MissedTickBehavior::Burst));
        self.event_tx
            .send(TimerEvent::Acknowledged { mode })
            .context("Failed to send acknowledged event")?;
        Ok(())
    }

    fn edit_setting(&mut self, field: SettingField, raw: &str) -> Result<()> {
        match self.settings.apply_edit(field, raw) {
            EditOutcome::Applied { .. } => self.settings_changed(field.is_duration())?,
            EditOutcome::Unchanged => debug!(%field, "Setting unchanged"),
            EditOutcome::Ignored(e) => debug!(%field, error = %e, "Ignoring invalid setting"),
        }
        Ok(())
    }

    fn replace_settings(&mut self, settings: TimerSettings) -> Result<()> {
        match self.settings.replace(settings) {
            Ok(changed) if changed.is_empty() => debug!("Settings unchanged"),
            Ok(changed) => {
                let durations = changed.iter().any(SettingField::is_duration);
                self.settings_changed(durations)?;
            }
            Err(e) => debug!(error = %e, "Ignoring invalid settings"),
        }
        Ok(())
    }

    /// Publishes a settings change. The countdown is re-derived only for a
    /// duration change while the clock is stopped.
    fn settings_changed(&mut self, durations_changed: bool) -> Result<()> {
        let settings = *self.settings.settings();
        let rederived = durations_changed && self.machine.settings_changed(&settings);
        self.event_tx
            .send(TimerEvent::SettingsChanged {
                settings,
                rederived,
            })
            .context("Failed to send settings changed event")?;
        Ok(())
    }

    /// Handles one countdown tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn on_countdown_tick(&mut self) -> Result<()> {
        match self.machine.tick(self.settings.settings()) {
            TickOutcome::Idle => {
                // Stray tick after a pause raced with the interval.
                self.countdown = None;
            }
            TickOutcome::Counting { remaining } => {
                self.event_tx
                    .send(TimerEvent::Tick {
                        remaining_seconds: remaining,
                    })
                    .context("Failed to send tick event")?;
            }
            TickOutcome::Completed { finished, next } => {
                self.countdown = None;
                self.event_tx
                    .send(TimerEvent::Tick {
                        remaining_seconds: 0,
                    })
                    .context("Failed to send tick event")?;

                if self.alarm.trigger() {
                    self.alarm_repeat =
                        Some(periodic(ALARM_REPEAT_INTERVAL, MissedTickBehavior::Skip));
                }
                info!(%finished, %next, "{}", finished.completion_message());
                self.event_tx
                    .send(TimerEvent::SessionCompleted { finished, next })
                    .context("Failed to send session completed event")?;
            }
        }
        self.publish();
        Ok(())
    }

    /// Handles one alarm repeat tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn on_alarm_repeat(&mut self) -> Result<()> {
        if !self.alarm.is_ringing() {
            self.alarm_repeat = None;
            return Ok(());
        }
        self.alarm.ring_once();
        self.event_tx
            .send(TimerEvent::AlarmRepeated)
            .context("Failed to send alarm repeated event")?;
        Ok(())
    }

    fn stop_alarm(&mut self) {
        self.alarm_repeat = None;
        if self.alarm.stop() {
            debug!("Alarm stopped");
        }
    }

    /// Cancels both handles, stops the alarm, releases the audio device and
    /// restores the default title. Idempotent.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.countdown = None;
        self.alarm_repeat = None;
        self.machine.pause();
        self.alarm.close();
        self.title.restore_default();
        self.snapshot_tx.send_replace(self.snapshot());
        debug!("Timer engine torn down");
    }

    fn publish(&mut self) {
        if self.torn_down {
            return;
        }
        self.title
            .update(self.machine.state(), self.machine.is_active());
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl<G: ToneGenerator, S: TitleSink> Drop for TimerEngine<G, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<G: ToneGenerator, S: TitleSink> std::fmt::Debug for TimerEngine<G, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("machine", &self.machine)
            .field("settings", self.settings.settings())
            .field("is_ringing", &self.alarm.is_ringing())
            .field("countdown", &self.countdown.is_some())
            .field("alarm_repeat", &self.alarm_repeat.is_some())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::MockToneGenerator;
    use crate::title::{MockTitleSink, DEFAULT_TITLE};
    use std::sync::Arc;

    type TestEngine = TimerEngine<Arc<MockToneGenerator>, Arc<MockTitleSink>>;

    struct Harness {
        engine: TestEngine,
        rx: mpsc::UnboundedReceiver<TimerEvent>,
        generator: Arc<MockToneGenerator>,
        title: Arc<MockTitleSink>,
    }

    fn create_engine_with_settings(settings: TimerSettings) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let generator = Arc::new(MockToneGenerator::new());
        let title = Arc::new(MockTitleSink::new());
        let engine = TimerEngine::new(settings, Arc::clone(&generator), Arc::clone(&title), tx);
        Harness {
            engine,
            rx,
            generator,
            title,
        }
    }

    fn create_engine() -> Harness {
        create_engine_with_settings(TimerSettings::default())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Ticks until the current session completes.
    fn complete_session(engine: &mut TestEngine) {
        while !engine.snapshot().awaiting_acknowledgment() {
            engine.on_countdown_tick().unwrap();
        }
    }

    // ------------------------------------------------------------------------
    // TimerEvent Tests
    // ------------------------------------------------------------------------

    mod timer_event_tests {
        use super::*;

        #[test]
        fn test_tick_event() {
            let event = TimerEvent::Tick {
                remaining_seconds: 1499,
            };
            assert_eq!(
                event,
                TimerEvent::Tick {
                    remaining_seconds: 1499
                }
            );
        }

        #[test]
        fn test_session_completed_event() {
            let event = TimerEvent::SessionCompleted {
                finished: SessionMode::Work,
                next: SessionMode::LongBreak,
            };
            let debug_str = format!("{:?}", event);
            assert!(debug_str.contains("SessionCompleted"));
            assert!(debug_str.contains("LongBreak"));
        }

        #[test]
        fn test_command_clone() {
            let command = TimerCommand::EditSetting(SettingField::WorkMinutes, "30".to_string());
            assert_eq!(command.clone(), command);
        }
    }

    // ------------------------------------------------------------------------
    // TimerEngine Tests
    // ------------------------------------------------------------------------

    mod timer_engine_tests {
        use super::*;

        #[tokio::test]
        async fn test_new_engine() {
            let h = create_engine();
            assert_eq!(h.engine.state().mode, SessionMode::Work);
            assert_eq!(h.engine.state().seconds_remaining, 1500);
            assert!(!h.engine.state().is_running);
            assert!(!h.engine.is_countdown_scheduled());
            // No side effects before the first interaction.
            assert!(!h.generator.is_unlocked());
            assert_eq!(h.title.write_count(), 0);
        }

        #[tokio::test]
        async fn test_start() {
            let mut h = create_engine();
            assert!(h.engine.handle(TimerCommand::Start).unwrap());

            assert!(h.engine.state().is_running);
            assert!(h.engine.is_countdown_scheduled());
            assert_eq!(
                drain(&mut h.rx),
                vec![TimerEvent::Started {
                    mode: SessionMode::Work
                }]
            );
            assert_eq!(h.title.last_title().as_deref(), Some("25:00 - Focus Timer"));
        }

        #[tokio::test]
        async fn test_every_command_unlocks_audio() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Pause).unwrap();
            assert!(h.generator.is_unlocked());
        }

        #[tokio::test]
        async fn test_start_twice_sends_one_event() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            h.engine.handle(TimerCommand::Start).unwrap();
            assert_eq!(drain(&mut h.rx).len(), 1);
        }

        #[tokio::test]
        async fn test_toggle() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Toggle).unwrap();
            assert!(h.engine.state().is_running);
            h.engine.handle(TimerCommand::Toggle).unwrap();
            assert!(!h.engine.state().is_running);
            assert!(!h.engine.is_countdown_scheduled());
            assert_eq!(
                drain(&mut h.rx),
                vec![
                    TimerEvent::Started {
                        mode: SessionMode::Work
                    },
                    TimerEvent::Paused
                ]
            );
        }

        #[tokio::test]
        async fn test_pause_twice_equals_once() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            h.engine.on_countdown_tick().unwrap();
            h.engine.handle(TimerCommand::Pause).unwrap();
            let once = h.engine.snapshot();
            h.engine.handle(TimerCommand::Pause).unwrap();
            assert_eq!(h.engine.snapshot(), once);

            let paused = drain(&mut h.rx)
                .into_iter()
                .filter(|e| *e == TimerEvent::Paused)
                .count();
            assert_eq!(paused, 1);
        }

        #[tokio::test]
        async fn test_tick_sends_event_and_updates_title() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            drain(&mut h.rx);

            h.engine.on_countdown_tick().unwrap();
            assert_eq!(
                drain(&mut h.rx),
                vec![TimerEvent::Tick {
                    remaining_seconds: 1499
                }]
            );
            assert_eq!(h.title.last_title().as_deref(), Some("24:59 - Focus Timer"));
        }

        #[tokio::test]
        async fn test_completion_rings_alarm() {
            let mut h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            h.engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut h.engine);

            assert!(h.engine.alarm().is_ringing());
            assert!(h.engine.is_alarm_scheduled());
            assert!(!h.engine.is_countdown_scheduled());
            assert!(!h.engine.state().is_running);
            assert_eq!(h.generator.play_count(), 1);

            let events = drain(&mut h.rx);
            assert_eq!(
                events.last(),
                Some(&TimerEvent::SessionCompleted {
                    finished: SessionMode::Work,
                    next: SessionMode::ShortBreak
                })
            );
            assert_eq!(h.title.last_title().as_deref(), Some("00:00 - Focus Timer"));
        }

        #[tokio::test]
        async fn test_alarm_repeat_plays_while_ringing() {
            let mut h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            h.engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut h.engine);
            drain(&mut h.rx);

            h.engine.on_alarm_repeat().unwrap();
            h.engine.on_alarm_repeat().unwrap();
            assert_eq!(h.generator.play_count(), 3);
            assert_eq!(
                drain(&mut h.rx),
                vec![TimerEvent::AlarmRepeated, TimerEvent::AlarmRepeated]
            );
        }

        #[tokio::test]
        async fn test_acknowledge_resumes_next_mode() {
            let mut h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            h.engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut h.engine);
            drain(&mut h.rx);

            h.engine.handle(TimerCommand::Acknowledge).unwrap();
            let state = h.engine.state();
            assert_eq!(state.mode, SessionMode::ShortBreak);
            assert_eq!(state.seconds_remaining, 300);
            assert!(state.is_running);
            assert_eq!(state.completed_work_sessions, 1);

            assert!(!h.engine.alarm().is_ringing());
            assert!(!h.engine.is_alarm_scheduled());
            assert!(h.engine.is_countdown_scheduled());
            assert_eq!(h.generator.silence_count(), 1);
            assert_eq!(
                drain(&mut h.rx),
                vec![TimerEvent::Acknowledged {
                    mode: SessionMode::ShortBreak
                }]
            );

            // Repeat ticks after acknowledgment play nothing.
            h.engine.on_alarm_repeat().unwrap();
            assert_eq!(h.generator.play_count(), 1);
        }

        #[tokio::test]
        async fn test_acknowledge_without_completion_is_noop() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Acknowledge).unwrap();
            assert!(drain(&mut h.rx).is_empty());
            assert!(!h.engine.state().is_running);
        }

        #[tokio::test]
        async fn test_select_mode_stops_alarm_and_keeps_count() {
            let mut h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            h.engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut h.engine);

            h.engine
                .handle(TimerCommand::SelectMode(SessionMode::LongBreak))
                .unwrap();
            assert!(!h.engine.alarm().is_ringing());
            assert!(!h.engine.is_alarm_scheduled());
            assert_eq!(h.engine.state().mode, SessionMode::LongBreak);
            assert_eq!(h.engine.state().seconds_remaining, 900);
            assert_eq!(h.engine.state().completed_work_sessions, 0);
            assert_eq!(h.title.last_title().as_deref(), Some(DEFAULT_TITLE));
        }

        #[tokio::test]
        async fn test_restart_session() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            h.engine.on_countdown_tick().unwrap();
            h.engine.handle(TimerCommand::RestartSession).unwrap();

            assert_eq!(h.engine.state().seconds_remaining, 1500);
            assert!(!h.engine.state().is_running);
            assert!(!h.engine.is_countdown_scheduled());
            assert_eq!(
                drain(&mut h.rx).last(),
                Some(&TimerEvent::SessionRestarted {
                    mode: SessionMode::Work
                })
            );
        }

        #[tokio::test]
        async fn test_reset() {
            let mut h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            h.engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut h.engine);
            h.engine.handle(TimerCommand::Acknowledge).unwrap();
            h.engine.handle(TimerCommand::Reset).unwrap();

            let state = h.engine.state();
            assert_eq!(state.mode, SessionMode::Work);
            assert_eq!(state.seconds_remaining, 60);
            assert_eq!(state.completed_work_sessions, 0);
            assert!(!state.is_running);
            assert!(!h.engine.is_countdown_scheduled());
        }

        #[tokio::test]
        async fn test_edit_setting_while_paused_rederives() {
            let mut h = create_engine();
            h.engine
                .handle(TimerCommand::EditSetting(
                    SettingField::WorkMinutes,
                    "1".to_string(),
                ))
                .unwrap();
            assert_eq!(h.engine.state().seconds_remaining, 60);
            assert_eq!(h.engine.settings().work_minutes, 1);
            assert_eq!(
                drain(&mut h.rx),
                vec![TimerEvent::SettingsChanged {
                    settings: TimerSettings::default().with_work_minutes(1),
                    rederived: true
                }]
            );
        }

        #[tokio::test]
        async fn test_edit_setting_while_running_is_deferred() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            for _ in 0..500 {
                h.engine.on_countdown_tick().unwrap();
            }
            assert_eq!(h.engine.state().seconds_remaining, 1000);

            h.engine
                .handle(TimerCommand::EditSetting(
                    SettingField::WorkMinutes,
                    "1".to_string(),
                ))
                .unwrap();
            assert_eq!(h.engine.state().seconds_remaining, 1000);

            h.engine.handle(TimerCommand::RestartSession).unwrap();
            assert_eq!(h.engine.state().seconds_remaining, 60);
        }

        #[tokio::test]
        async fn test_invalid_edit_is_ignored() {
            let mut h = create_engine();
            for raw in ["abc", "0", "-5", "99999", ""] {
                h.engine
                    .handle(TimerCommand::EditSetting(
                        SettingField::WorkMinutes,
                        raw.to_string(),
                    ))
                    .unwrap();
            }
            assert_eq!(h.engine.settings().work_minutes, 25);
            assert_eq!(h.engine.state().seconds_remaining, 1500);
            assert!(drain(&mut h.rx).is_empty());
        }

        #[tokio::test]
        async fn test_shutdown_is_idempotent() {
            let mut h = create_engine();
            h.engine.handle(TimerCommand::Start).unwrap();
            assert!(!h.engine.handle(TimerCommand::Shutdown).unwrap());
            assert!(h.engine.is_shut_down());
            assert!(!h.engine.is_countdown_scheduled());
            assert!(h.generator.is_closed());
            assert_eq!(h.title.last_title().as_deref(), Some(DEFAULT_TITLE));
            assert_eq!(h.engine.title().current(), Some(DEFAULT_TITLE));

            let writes = h.title.write_count();
            h.engine.shutdown();
            assert!(!h.engine.handle(TimerCommand::Start).unwrap());
            assert_eq!(h.title.write_count(), writes);
            assert_eq!(drain(&mut h.rx).last(), Some(&TimerEvent::Shutdown));
        }

        #[tokio::test]
        async fn test_drop_tears_down() {
            let h = create_engine_with_settings(TimerSettings::default().with_work_minutes(1));
            let Harness {
                mut engine,
                generator,
                title,
                ..
            } = h;
            engine.handle(TimerCommand::Start).unwrap();
            complete_session(&mut engine);
            drop(engine);

            assert!(generator.is_closed());
            assert_eq!(title.last_title().as_deref(), Some(DEFAULT_TITLE));
        }

        #[tokio::test]
        async fn test_snapshot_channel_follows_state() {
            let mut h = create_engine();
            let rx = h.engine.subscribe();
            h.engine.handle(TimerCommand::Start).unwrap();
            h.engine.on_countdown_tick().unwrap();

            let snapshot = rx.borrow().clone();
            assert_eq!(snapshot.seconds_remaining, 1499);
            assert!(snapshot.is_running);
            assert_eq!(snapshot.display, "24:59");
        }
    }

    // ------------------------------------------------------------------------
    // Run Loop Tests
    // ------------------------------------------------------------------------

    mod run_loop_tests {
        use super::*;
        use tokio::time::{sleep, timeout};

        #[tokio::test(start_paused = true)]
        async fn test_run_ticks_once_per_second() {
            let mut h = create_engine();
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
            cmd_tx.send(TimerCommand::Start).unwrap();

            let run = tokio::spawn(async move {
                h.engine.run(cmd_rx).await.unwrap();
                h.rx
            });

            sleep(Duration::from_millis(3500)).await;
            cmd_tx.send(TimerCommand::Shutdown).unwrap();

            let mut rx = timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
            let ticks: Vec<u32> = drain(&mut rx)
                .into_iter()
                .filter_map(|e| match e {
                    TimerEvent::Tick { remaining_seconds } => Some(remaining_seconds),
                    _ => None,
                })
                .collect();
            assert_eq!(ticks, vec![1499, 1498, 1497]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_stops_when_commands_close() {
            let mut h = create_engine();
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<TimerCommand>();
            drop(cmd_tx);

            h.engine.run(cmd_rx).await.unwrap();
            assert!(h.engine.is_shut_down());
            assert_eq!(h.title.last_title().as_deref(), Some(DEFAULT_TITLE));
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_without_start_sends_no_ticks() {
            let mut h = create_engine();
            let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

            let run = tokio::spawn(async move {
                h.engine.run(cmd_rx).await.unwrap();
                h.rx
            });

            sleep(Duration::from_secs(5)).await;
            cmd_tx.send(TimerCommand::Shutdown).unwrap();

            let mut rx = run.await.unwrap();
            assert_eq!(drain(&mut rx), vec![TimerEvent::Shutdown]);
        }
    }
}
