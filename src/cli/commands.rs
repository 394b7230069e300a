//! Command definitions for the Focus Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::types::TimerSettings;

// ============================================================================
// CLI Structure
// ============================================================================

/// Focus Timer CLI - a Pomodoro timer for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "focus-timer",
    version,
    about = "Pomodoro focus timer with an audible alarm",
    long_about = "A terminal Pomodoro timer. Work sessions alternate with short breaks, \
                  and every few sessions a long break follows. When a session ends an \
                  alarm rings until you acknowledge it.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the interactive timer
    Run(RunArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Work duration in minutes (1-1440)
    #[arg(
        short,
        long,
        default_value = "25",
        value_parser = clap::value_parser!(u32).range(1..=1440)
    )]
    pub work: u32,

    /// Short break duration in minutes (1-1440)
    #[arg(
        short,
        long,
        default_value = "5",
        value_parser = clap::value_parser!(u32).range(1..=1440)
    )]
    pub short_break: u32,

    /// Long break duration in minutes (1-1440)
    #[arg(
        short,
        long,
        default_value = "15",
        value_parser = clap::value_parser!(u32).range(1..=1440)
    )]
    pub long_break: u32,

    /// Work sessions before a long break (1-12)
    #[arg(
        long,
        default_value = "4",
        value_parser = clap::value_parser!(u32).range(1..=12)
    )]
    pub sessions: u32,

    /// Disable the alarm sound
    #[arg(long)]
    pub no_sound: bool,

    /// Leave the terminal window title untouched
    #[arg(long)]
    pub no_title: bool,

    /// Print one JSON snapshot per line instead of the status line
    #[arg(long)]
    pub json: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            work: 25,
            short_break: 5,
            long_break: 15,
            sessions: 4,
            no_sound: false,
            no_title: false,
            json: false,
        }
    }
}

impl RunArgs {
    /// Builds the initial timer settings from the arguments.
    pub fn settings(&self) -> TimerSettings {
        TimerSettings::default()
            .with_work_minutes(self.work)
            .with_short_break_minutes(self.short_break)
            .with_long_break_minutes(self.long_break)
            .with_sessions_before_long_break(self.sessions)
    }
}

// ============================================================================
// Tests
// ============================================================================
