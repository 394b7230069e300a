//! CLI module for the Focus Timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `input`: Parsing of interactive input lines
//! - `display`: Output formatting and display logic
//! - `app`: The interactive run loop

pub mod app;
pub mod commands;
pub mod display;
pub mod input;

pub use commands::{Cli, Commands, RunArgs};
pub use display::Display;
pub use input::{parse_input, InputAction, InputError};
