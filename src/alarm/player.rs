//! Tone generator implementation using rodio.
//!
//! The rodio output stream is not `Send`, so it lives on a dedicated
//! `alarm-audio` thread that is spawned on the first [`unlock`] and fed
//! through a crossbeam channel. Until then no audio device is touched.
//!
//! Opening the device can take a while (or hang on a misconfigured sound
//! server), so [`unlock`] only starts the worker. The worker reports the
//! outcome over a ready channel that later calls poll without waiting.
//! Sequences played while the device is still opening are queued.
//!
//! [`unlock`]: RodioToneGenerator::unlock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::AlarmError;
use super::tone::ToneSequence;
use super::ToneGenerator;

/// Commands understood by the audio worker thread.
#[derive(Debug)]
enum AudioCommand {
    Play(ToneSequence),
    Silence,
    Close,
}

// ============================================================================
// Audio Output
// ============================================================================

/// Output owned by the worker thread.
trait AudioOutput {
    fn play(&mut self, sequence: ToneSequence) -> Result<(), AlarmError>;
    fn silence(&mut self);
}

/// Opens an output on the worker thread.
type Opener = Arc<dyn Fn() -> Result<Box<dyn AudioOutput>, AlarmError> + Send + Sync>;

/// The default rodio output device.
struct RodioOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    current: Option<Sink>,
}

impl RodioOutput {
    fn open() -> Result<Box<dyn AudioOutput>, AlarmError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| AlarmError::DeviceNotAvailable(e.to_string()))?;
        Ok(Box::new(Self {
            _stream: stream,
            handle,
            current: None,
        }))
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, sequence: ToneSequence) -> Result<(), AlarmError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| AlarmError::StreamError(e.to_string()))?;
        sink.append(sequence.to_source());
        // Replacing the previous sink stops its playback.
        self.current = Some(sink);
        Ok(())
    }

    fn silence(&mut self) {
        if let Some(sink) = self.current.take() {
            sink.stop();
        }
    }
}

// ============================================================================
// Audio Worker
// ============================================================================

/// Device state as last reported by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeviceStatus {
    Opening,
    Ready,
    Failed(AlarmError),
}

/// Handle to the running audio worker.
struct AudioWorker {
    tx: Sender<AudioCommand>,
    ready_rx: Receiver<Result<(), AlarmError>>,
    handle: JoinHandle<()>,
    status: DeviceStatus,
}

impl AudioWorker {
    /// Spawns the worker; the device is opened on the new thread.
    fn spawn(open: Opener) -> Result<Self, AlarmError> {
        let (tx, rx) = unbounded::<AudioCommand>();
        let (ready_tx, ready_rx) = bounded::<Result<(), AlarmError>>(1);

        let handle = thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || {
                let mut output = match open() {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                debug!("Audio output stream initialized");

                for command in rx.iter() {
                    match command {
                        AudioCommand::Play(sequence) => {
                            if let Err(e) = output.play(sequence) {
                                warn!("{}", e);
                            }
                        }
                        AudioCommand::Silence => output.silence(),
                        AudioCommand::Close => break,
                    }
                }

                output.silence();
                debug!("Audio output stream released");
            })
            .map_err(|e| AlarmError::PlaybackError(e.to_string()))?;

        Ok(Self {
            tx,
            ready_rx,
            handle,
            status: DeviceStatus::Opening,
        })
    }

    /// Picks up the open result if the worker has reported it.
    fn poll(&mut self) -> &DeviceStatus {
        if self.status == DeviceStatus::Opening {
            match self.ready_rx.try_recv() {
                Ok(Ok(())) => self.status = DeviceStatus::Ready,
                Ok(Err(e)) => self.status = DeviceStatus::Failed(e),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.status = DeviceStatus::Failed(AlarmError::PlaybackError(
                        "audio worker exited during startup".to_string(),
                    ));
                }
            }
        }
        &self.status
    }
}

// ============================================================================
// RodioToneGenerator
// ============================================================================

/// A tone generator that plays square-wave sequences through rodio.
///
/// The generator is `Send + Sync`; all device access happens on the worker
/// thread.
pub struct RodioToneGenerator {
    /// Worker thread, present from the first unlock until it fails or closes.
    worker: Mutex<Option<AudioWorker>>,
    /// Opens the output device on the worker thread.
    open: Opener,
    /// Whether playback is disabled (the device is never opened).
    disabled: AtomicBool,
    /// Whether `close` has been called.
    closed: AtomicBool,
}

impl RodioToneGenerator {
    /// Creates a generator without touching the audio device.
    ///
    /// # Arguments
    ///
    /// * `disabled` - If true, unlocking and playback are silent no-ops.
    #[must_use]
    pub fn new(disabled: bool) -> Self {
        let generator = Self::with_opener(Arc::new(RodioOutput::open));
        generator.disabled.store(disabled, Ordering::Relaxed);
        generator
    }

    /// Creates a generator that never produces sound.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(true)
    }

    fn with_opener(open: Opener) -> Self {
        Self {
            worker: Mutex::new(None),
            open,
            disabled: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns true if playback is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    fn send(&self, command: AudioCommand) -> Result<(), AlarmError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(worker) = worker.as_mut() else {
            return Err(AlarmError::Locked);
        };
        if let DeviceStatus::Failed(_) = worker.poll() {
            return Err(AlarmError::Locked);
        }
        worker
            .tx
            .send(command)
            .map_err(|e| AlarmError::PlaybackError(e.to_string()))
    }
}

impl ToneGenerator for RodioToneGenerator {
    /// Starts opening the device in the background and returns immediately.
    ///
    /// A failed open is reported by the next call, which also clears the
    /// worker so that the call after it tries again.
    fn unlock(&self) -> Result<(), AlarmError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AlarmError::Closed);
        }
        if self.is_disabled() {
            return Ok(());
        }

        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = worker.as_mut() {
            if let DeviceStatus::Failed(e) = active.poll() {
                let e = e.clone();
                *worker = None;
                return Err(e);
            }
            return Ok(());
        }

        *worker = Some(AudioWorker::spawn(Arc::clone(&self.open))?);
        debug!("Opening alarm audio device");
        Ok(())
    }

    fn is_unlocked(&self) -> bool {
        self.is_disabled()
            || self
                .worker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .as_mut()
                .is_some_and(|worker| *worker.poll() == DeviceStatus::Ready)
    }

    fn play(&self, sequence: &ToneSequence) -> Result<(), AlarmError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AlarmError::Closed);
        }
        if self.is_disabled() {
            debug!("Alarm sound disabled, skipping");
            return Ok(());
        }
        self.send(AudioCommand::Play(sequence.clone()))
    }

    fn silence(&self) {
        // Nothing is playing if the worker was never started.
        let _ = self.send(AudioCommand::Silence);
    }

    /// Stops the worker. A worker that is still opening the device is not
    /// waited for; it exits as soon as the open returns.
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut worker) = worker else {
            return;
        };
        let _ = worker.tx.send(AudioCommand::Close);
        if *worker.poll() == DeviceStatus::Ready && worker.handle.join().is_err() {
            warn!("Audio worker panicked during shutdown");
        }
    }
}

impl Drop for RodioToneGenerator {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RodioToneGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioToneGenerator")
            .field("disabled", &self.is_disabled())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
