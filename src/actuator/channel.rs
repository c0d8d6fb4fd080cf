use std::time::Instant;

use tracing::{debug, info, warn};

use super::{Axis, PositionLimits};
use crate::ipc::DiagnosticLog;
use crate::metrics::{Transaction, TransportMetrics};
use crate::transport::{PortConfig, ServoLink, Transport, TransportError};

/// Snapshot of one channel for the status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub id: u8,
    pub axis: Axis,
    pub observed: i32,
    pub target: i32,
    pub offset: i32,
    pub online: bool,
}

// ============================================================================
// ACTUATOR CHANNEL - One servo, its calibration and its link
// ============================================================================

/// One addressable servo.
///
/// `target` is relative to `offset`; the value on the wire is
/// `target + offset` clamped to `limits`. Transaction failures are logged and
/// swallowed here, so callers only see whether the operation went through.
pub struct ActuatorChannel {
    id: u8,
    axis: Axis,
    offset: i32,
    target: i32,
    observed: i32,
    limits: PositionLimits,
    link: Option<Box<dyn ServoLink>>,
    excluded: Option<String>,
    diagnostics: DiagnosticLog,
    metrics: TransportMetrics,
}

impl ActuatorChannel {
    /// A channel with no link yet. It ignores commands until connected.
    pub fn new(
        id: u8,
        axis: Axis,
        limits: PositionLimits,
        diagnostics: DiagnosticLog,
        metrics: TransportMetrics,
    ) -> Self {
        Self {
            id,
            axis,
            offset: 0,
            target: 0,
            observed: 0,
            limits,
            link: None,
            excluded: None,
            diagnostics,
            metrics,
        }
    }

    /// Open and configure the link. On failure the channel is excluded for the
    /// rest of the session and `false` is returned.
    pub fn connect(&mut self, transport: &mut dyn Transport, port: &PortConfig) -> bool {
        if self.link.is_some() {
            return true;
        }

        let mut link = match transport.open(self.id, port) {
            Ok(link) => link,
            Err(e) => {
                self.exclude("open", &e);
                return false;
            }
        };
        if let Err(e) = link.set_rate(port.baud) {
            link.close();
            self.exclude("set_rate", &e);
            return false;
        }

        debug!(channel = self.id, axis = %self.axis, "connected");
        self.link = Some(link);
        true
    }

    fn exclude(&mut self, op: &'static str, err: &TransportError) {
        warn!(channel = self.id, op, error = %err, "channel excluded");
        self.diagnostics.record(self.id, op, err.to_string());
        self.metrics.record_exclusion();
        self.excluded = Some(err.to_string());
    }

    /// Run one transaction on the link, recording its outcome. `None` when the
    /// channel has no link or the transaction failed.
    fn transact<T>(
        &mut self,
        kind: Transaction,
        op: &'static str,
        f: impl FnOnce(&mut dyn ServoLink, u8) -> Result<T, TransportError>,
    ) -> Option<T> {
        let link = self.link.as_deref_mut()?;
        let start = Instant::now();
        let result = f(link, self.id);
        self.metrics.record(kind, start.elapsed(), result.is_ok());

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(channel = self.id, op, error = %e, "transaction failed");
                self.diagnostics.record(self.id, op, e.to_string());
                None
            }
        }
    }

    pub fn engage(&mut self) -> bool {
        self.transact(Transaction::Torque, "torque_on", |link, id| {
            link.set_torque(id, true)
        })
        .is_some()
    }

    /// Read the current position into `observed`.
    pub fn refresh(&mut self) -> Option<i32> {
        let position = self.transact(Transaction::Read, "read", |link, id| link.read_position(id))?;
        self.observed = position;
        Some(position)
    }

    /// Take the current position as the new neutral. The servo does not move:
    /// the target is reset to zero so the command equals the new offset.
    /// A failed read leaves offset and target untouched.
    pub fn calibrate(&mut self) -> bool {
        match self.refresh() {
            Some(position) => {
                self.offset = position;
                self.target = 0;
                true
            }
            None => false,
        }
    }

    /// Command an offset-relative target. On failure the previous target stands.
    pub fn command(&mut self, target: i32) -> bool {
        if self.link.is_none() {
            return false;
        }
        let value = self.limits.clamp(i64::from(target) + i64::from(self.offset));
        // Two's complement on the wire, the inverse of `reinterpret_signed`.
        let sent = self.transact(Transaction::Write, "write", |link, id| {
            link.write_position(id, value as u32)
        });
        if sent.is_some() {
            self.target = target;
        }
        sent.is_some()
    }

    /// Disengage and close the link, best-effort. Closing happens even if the
    /// torque-off fails. Calling again is a no-op.
    pub fn release(&mut self) -> Result<(), TransportError> {
        let Some(mut link) = self.link.take() else {
            return Ok(());
        };
        let start = Instant::now();
        let result = link.set_torque(self.id, false);
        self.metrics.record(Transaction::Torque, start.elapsed(), result.is_ok());
        link.close();

        match &result {
            Ok(()) => debug!(channel = self.id, "released"),
            Err(e) => {
                warn!(channel = self.id, op = "torque_off", error = %e, "transaction failed");
                self.diagnostics.record(self.id, "torque_off", e.to_string());
            }
        }
        result
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn target(&self) -> i32 {
        self.target
    }

    pub fn observed(&self) -> i32 {
        self.observed
    }

    /// Value that the current target puts on the wire.
    pub fn command_value(&self) -> i32 {
        self.limits.clamp(i64::from(self.target) + i64::from(self.offset))
    }

    pub fn is_online(&self) -> bool {
        self.link.is_some()
    }

    /// Why the channel was taken out of service, if it was.
    pub fn excluded(&self) -> Option<&str> {
        self.excluded.as_deref()
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            id: self.id,
            axis: self.axis,
            observed: self.observed,
            target: self.target,
            offset: self.offset,
            online: self.is_online(),
        }
    }
}

impl Drop for ActuatorChannel {
    fn drop(&mut self) {
        if self.link.is_some() {
            info!(channel = self.id, "releasing on drop");
            let _ = self.release();
        }
    }
}
