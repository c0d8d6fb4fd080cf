//! IPC module - command channels between input threads and the controller, and
//! shared diagnostics

pub mod channels;
pub mod shared_resource;

pub use channels::{spawn_script_feeder, ChannelSource, CommandChannels};
pub use shared_resource::{DiagnosticEntry, DiagnosticLog};
