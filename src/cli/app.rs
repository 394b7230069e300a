//! Interactive front-end for `focus-timer run`.
//!
//! The engine runs as its own task. This loop feeds it commands parsed
//! from stdin and renders snapshots and events until the user quits,
//! stdin closes, or Ctrl-C arrives.

use std::io::{self, BufRead};
use std::thread;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::alarm::RodioToneGenerator;
use crate::cli::commands::RunArgs;
use crate::cli::display::Display;
use crate::cli::input::{parse_input, InputAction};
use crate::timer::{TimerCommand, TimerEngine, TimerEvent};
use crate::title::TerminalTitleSink;
use crate::types::TimerSnapshot;

/// Reads stdin on a dedicated thread.
///
/// Blocking reads on a runtime worker would keep the runtime alive after
/// quitting; a detached thread does not.
fn spawn_input_reader() -> Result<mpsc::UnboundedReceiver<io::Result<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })
        .context("Failed to spawn input reader thread")?;
    Ok(rx)
}

/// Renders snapshots either as a status line or as JSON lines.
struct Renderer {
    json: bool,
}

impl Renderer {
    fn snapshot(&self, snapshot: &TimerSnapshot) -> Result<()> {
        if self.json {
            Display::show_json(snapshot)
        } else {
            Display::show_status_line(snapshot).context("Failed to draw status line")
        }
    }

    /// Prints a message and redraws the status line below it.
    fn message(&self, message: &str, snapshot: &TimerSnapshot) -> Result<()> {
        if self.json {
            // The snapshot stream already carries everything.
            return Ok(());
        }
        Display::show_message(message).context("Failed to print message")?;
        self.snapshot(snapshot)
    }

    fn event(&self, event: &TimerEvent, snapshot: &TimerSnapshot) -> Result<()> {
        match event {
            TimerEvent::SessionCompleted { finished, next } => {
                self.message(&Display::completion_prompt(*finished, *next), snapshot)
            }
            TimerEvent::SettingsChanged {
                settings,
                rederived,
            } => self.message(&Display::settings_changed(settings, *rederived), snapshot),
            _ => Ok(()),
        }
    }
}

/// Runs the interactive timer until the user quits.
///
/// # Errors
///
/// Returns an error if the engine fails or the terminal cannot be written.
pub async fn run(args: RunArgs) -> Result<()> {
    let settings = args.settings();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let generator = RodioToneGenerator::new(args.no_sound);
    let title_sink = TerminalTitleSink::new(!args.no_title);
    let mut engine = TimerEngine::new(settings, generator, title_sink, event_tx);
    let mut snapshots: watch::Receiver<TimerSnapshot> = engine.subscribe();

    let engine_task = tokio::spawn(async move { engine.run(command_rx).await });
    let mut input = spawn_input_reader()?;
    let renderer = Renderer { json: args.json };

    if !args.json {
        Display::show_welcome(&settings);
    }
    renderer.snapshot(&snapshots.borrow_and_update())?;

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = input.recv() => {
                let line = match line {
                    Some(line) => line.context("Failed to read input")?,
                    None => {
                        debug!("Input closed");
                        break;
                    }
                };
                match parse_input(&line) {
                    Ok(InputAction::Command(command)) => {
                        if command_tx.send(command).is_err() {
                            break;
                        }
                    }
                    Ok(InputAction::Status) => {
                        let snapshot = snapshots.borrow().clone();
                        renderer.message(&Display::status_line(&snapshot), &snapshot)?;
                    }
                    Ok(InputAction::Help) => {
                        let snapshot = snapshots.borrow().clone();
                        renderer.message(Display::help_text(), &snapshot)?;
                    }
                    Ok(InputAction::Quit) => break,
                    Err(e) => {
                        let snapshot = snapshots.borrow().clone();
                        renderer.message(&format!("{} ({})", e, e.suggestion()), &snapshot)?;
                    }
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                renderer.snapshot(&snapshot)?;
            }
            event = event_rx.recv() => match event {
                Some(TimerEvent::Shutdown) | None => break,
                Some(event) => {
                    let snapshot = snapshots.borrow().clone();
                    renderer.event(&event, &snapshot)?;
                }
            },
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
        }
    }

    let _ = command_tx.send(TimerCommand::Shutdown);
    drop(command_tx);
    let result = engine_task
        .await
        .context("Timer engine task panicked")?;
    if !args.json {
        Display::finish();
    }
    result
}
