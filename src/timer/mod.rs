//! Timer core: the session state machine and the engine driving it.

pub mod engine;
pub mod machine;

pub use engine::{TimerCommand, TimerEngine, TimerEvent, TICK_PERIOD};
pub use machine::{SessionMachine, TickOutcome};
