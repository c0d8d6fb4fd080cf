use tracing::{info, warn};

use super::channel::{ActuatorChannel, ChannelStatus};
use super::Axis;
use crate::config::{RuntimeConfig, ARM_COUNT};
use crate::ipc::DiagnosticLog;
use crate::mapping::ArmTargets;
use crate::metrics::TransportMetrics;
use crate::transport::{Transport, TransportError};

/// Borrowed view of one arm's two channels.
pub struct ArmChannels<'a> {
    pub roll: &'a ActuatorChannel,
    pub pitch: &'a ActuatorChannel,
}

/// Outcome of a best-effort shutdown.
#[derive(Debug, Default)]
pub struct ReleaseReport {
    /// Channels that had a link and were closed.
    pub released: usize,
    /// Channels whose torque-off failed. Their links were closed anyway.
    pub failures: Vec<(u8, TransportError)>,
}

impl ReleaseReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// ACTUATOR BANK - Six roll and six pitch channels, index-aligned by arm
// ============================================================================

pub struct ActuatorBank {
    roll: [ActuatorChannel; ARM_COUNT],
    pitch: [ActuatorChannel; ARM_COUNT],
}

impl ActuatorBank {
    /// Open every channel, enable torque and take the current positions as
    /// offsets. Channels that fail to open are excluded; the bank starts anyway.
    /// `config` must have passed [`RuntimeConfig::validate`].
    pub fn connect(
        transport: &mut dyn Transport,
        config: &RuntimeConfig,
        diagnostics: &DiagnosticLog,
        metrics: &TransportMetrics,
    ) -> Self {
        let limits = config.limits();
        let port = config.port_config();
        let ids = &config.actuators;
        let make = |id: u8, axis: Axis| {
            ActuatorChannel::new(id, axis, limits, diagnostics.clone(), metrics.clone())
        };

        let mut bank = Self::from_channels(
            std::array::from_fn(|i| make(ids.roll_ids[i], Axis::Roll)),
            std::array::from_fn(|i| make(ids.pitch_ids[i], Axis::Pitch)),
        );

        for channel in bank.channels_mut() {
            if channel.connect(transport, &port) {
                channel.engage();
                channel.calibrate();
            }
        }

        let online = bank.online_count();
        if online < 2 * ARM_COUNT {
            warn!("{online} of {} channels online", 2 * ARM_COUNT);
        } else {
            info!("All {online} channels online on {}", port.device);
        }
        bank
    }

    pub fn from_channels(
        roll: [ActuatorChannel; ARM_COUNT],
        pitch: [ActuatorChannel; ARM_COUNT],
    ) -> Self {
        Self { roll, pitch }
    }

    /// Push per-arm targets. Arms mapped to `None` are left alone. Returns the
    /// number of writes that went through.
    pub fn apply(&mut self, targets: &[Option<ArmTargets>; ARM_COUNT]) -> usize {
        let mut sent = 0;
        for (arm, target) in targets.iter().enumerate() {
            if let Some(t) = target {
                sent += usize::from(self.roll[arm].command(t.roll));
                sent += usize::from(self.pitch[arm].command(t.pitch));
            }
        }
        sent
    }

    /// Send every channel back to its offset.
    pub fn zero_all(&mut self) -> usize {
        self.channels_mut().map(|c| usize::from(c.command(0))).sum()
    }

    /// Re-read every position into its offset.
    pub fn calibrate(&mut self) -> usize {
        self.channels_mut().map(|c| usize::from(c.calibrate())).sum()
    }

    /// Re-read every position for display.
    pub fn refresh(&mut self) {
        for channel in self.channels_mut() {
            channel.refresh();
        }
    }

    /// Disengage and close every channel. One failure never skips the rest.
    pub fn release_all(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        for channel in self.channels_mut() {
            if !channel.is_online() {
                continue;
            }
            report.released += 1;
            if let Err(e) = channel.release() {
                report.failures.push((channel.id(), e));
            }
        }
        info!(
            released = report.released,
            failed = report.failures.len(),
            "bank released"
        );
        report
    }

    pub fn arm(&self, arm: usize) -> ArmChannels<'_> {
        ArmChannels {
            roll: &self.roll[arm],
            pitch: &self.pitch[arm],
        }
    }

    /// Roll channels first, then pitch, each in arm order.
    pub fn channels(&self) -> impl Iterator<Item = &ActuatorChannel> {
        self.roll.iter().chain(self.pitch.iter())
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut ActuatorChannel> {
        self.roll.iter_mut().chain(self.pitch.iter_mut())
    }

    pub fn channel(&self, id: u8) -> Option<&ActuatorChannel> {
        self.channels().find(|c| c.id() == id)
    }

    pub fn online_count(&self) -> usize {
        self.channels().filter(|c| c.is_online()).count()
    }

    pub fn status(&self) -> Vec<ChannelStatus> {
        self.channels().map(ActuatorChannel::status).collect()
    }
}
