use std::fmt::Write;

use crate::actuator::{ActuatorBank, ChannelStatus};
use crate::config::ARM_COUNT;
use crate::control::ControlState;
use crate::ipc::DiagnosticEntry;

/// One header line plus one row per arm:
/// `Status <arm>: <observed>/<target>/<offset> <observed>/<target>/<offset>`
/// for the roll and pitch channel. Offline channels show `--`.
pub fn render_status(state: &ControlState, bank: &ActuatorBank) -> String {
    let tilt = state.tilt();
    let mut out = format!(
        "Mode: {}  tilt: ({:.1}, {:.1})  step: {}\n",
        state.mode(),
        tilt.x,
        tilt.y,
        state.step()
    );
    for arm in 0..ARM_COUNT {
        let channels = bank.arm(arm);
        let _ = writeln!(
            out,
            "Status {}: {} {}",
            arm + 1,
            cell(&channels.roll.status()),
            cell(&channels.pitch.status())
        );
    }
    out
}

fn cell(status: &ChannelStatus) -> String {
    if status.online {
        format!("{}/{}/{}", status.observed, status.target, status.offset)
    } else {
        format!("--(id {})", status.id)
    }
}

/// Failure log as printable lines, oldest first.
pub fn render_diagnostics(entries: &[DiagnosticEntry]) -> String {
    entries.iter().fold(String::new(), |mut out, entry| {
        let _ = writeln!(out, "{entry}");
        out
    })
}
