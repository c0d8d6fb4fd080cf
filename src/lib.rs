pub mod actuator;
pub mod config;
pub mod control;
pub mod input;
pub mod ipc;
pub mod mapping;
pub mod metrics;
pub mod sequencer;
pub mod transport;
pub mod visualization;

pub use actuator::{ActuatorBank, ActuatorChannel, Axis, PositionLimits};
pub use config::{load_config, RuntimeConfig};
pub use control::{Command, Controller, Mode};
pub use input::CommandSource;
pub use mapping::{ArmId, Geometry, Mapping, Tilt};
pub use sequencer::{SweepKind, SweepProfile};
