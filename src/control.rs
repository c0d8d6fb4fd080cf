//! Control module - operator commands, mode state and the command loop

pub mod command;
pub mod controller;
pub mod state;

pub use command::Command;
pub use controller::{Controller, Flow, SweepOutcome};
pub use state::{ControlState, Mode};
