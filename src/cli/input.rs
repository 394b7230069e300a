//! Interactive input parsing.
//!
//! One command per line. Commands are case-insensitive; an empty line
//! toggles the clock.

use thiserror::Error;

use crate::settings::{SettingField, SettingsError};
use crate::timer::TimerCommand;
use crate::types::{SessionMode, TimerSettings};

/// What a line of input asks the front-end to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Forward a command to the timer engine
    Command(TimerCommand),
    /// Print the current status
    Status,
    /// Print the help text
    Help,
    /// Leave the program
    Quit,
}

/// Errors produced while parsing a line of input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The command word was not recognised.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A command was given without its argument.
    #[error("'{command}' needs {expected}")]
    MissingArgument {
        /// Command word
        command: &'static str,
        /// Description of the missing argument
        expected: &'static str,
    },

    /// The mode name was not recognised.
    #[error("unknown mode '{0}'")]
    InvalidMode(String),

    /// The settings field was not recognised.
    #[error(transparent)]
    Setting(#[from] SettingsError),
}

impl InputError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "type 'help' for a list of commands",
            Self::MissingArgument { command: "set", .. } => "example: set work 25",
            Self::MissingArgument { .. } | Self::InvalidMode(_) => {
                "use one of: work, short, long"
            }
            Self::Setting(e) => e.suggestion(),
        }
    }
}

/// Parses one line of interactive input.
///
/// # Errors
///
/// Returns an [`InputError`] if the line is not a known command.
///
/// # Examples
///
/// ```
/// use focus_timer::cli::{parse_input, InputAction};
/// use focus_timer::timer::TimerCommand;
///
/// assert_eq!(parse_input("").unwrap(), InputAction::Command(TimerCommand::Toggle));
/// assert_eq!(parse_input("q").unwrap(), InputAction::Quit);
/// ```
pub fn parse_input(line: &str) -> Result<InputAction, InputError> {
    let lowered = line.trim().to_ascii_lowercase();
    let mut words = lowered.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(InputAction::Command(TimerCommand::Toggle));
    };

    let action = match word {
        "t" | "toggle" => InputAction::Command(TimerCommand::Toggle),
        "start" => InputAction::Command(TimerCommand::Start),
        "pause" => InputAction::Command(TimerCommand::Pause),
        "r" | "restart" => InputAction::Command(TimerCommand::RestartSession),
        "reset" => InputAction::Command(TimerCommand::Reset),
        "n" | "next" | "ok" => InputAction::Command(TimerCommand::Acknowledge),
        "mode" => {
            let name = words.next().ok_or(InputError::MissingArgument {
                command: "mode",
                expected: "a mode name",
            })?;
            let mode = name
                .parse::<SessionMode>()
                .map_err(|_| InputError::InvalidMode(name.to_string()))?;
            InputAction::Command(TimerCommand::SelectMode(mode))
        }
        "work" => InputAction::Command(TimerCommand::SelectMode(SessionMode::Work)),
        "short" => InputAction::Command(TimerCommand::SelectMode(SessionMode::ShortBreak)),
        "long" => InputAction::Command(TimerCommand::SelectMode(SessionMode::LongBreak)),
        "set" => {
            let field = words.next().ok_or(InputError::MissingArgument {
                command: "set",
                expected: "a field and a value",
            })?;
            let field = field.parse::<SettingField>()?;
            let value = words.next().ok_or(InputError::MissingArgument {
                command: "set",
                expected: "a value",
            })?;
            InputAction::Command(TimerCommand::EditSetting(field, value.to_string()))
        }
        "defaults" => InputAction::Command(TimerCommand::ReplaceSettings(TimerSettings::default())),
        "status" | "s" => InputAction::Status,
        "h" | "help" | "?" => InputAction::Help,
        "q" | "quit" | "exit" => InputAction::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };
    Ok(action)
}
