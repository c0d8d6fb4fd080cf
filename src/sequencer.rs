//! Sweep sequencer - timed tilt sample streams for the two demonstration sweeps
//!
//! A sweep settles at the origin, ramps `tilt.x` out to the sweep angle, rotates the
//! tilt vector once around the full circle and ramps back in. The sequence is a lazy
//! iterator; the controller paces it and may drop it at any sample boundary.

use std::time::Duration;

use crate::control::Mode;
use crate::mapping::{Mapping, Tilt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Every arm follows the same tilt about its own origin.
    Origin,
    /// The tilt is distributed over the arms as a whole-body tilt.
    Body,
}

impl SweepKind {
    pub fn mapping(self) -> Mapping {
        match self {
            SweepKind::Origin => Mapping::Uniform,
            SweepKind::Body => Mapping::Body,
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            SweepKind::Origin => Mode::SweepOrigin,
            SweepKind::Body => Mode::SweepBody,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Settle,
    RampIn,
    Rotate,
    RampOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSample {
    pub phase: SweepPhase,
    /// Position within the phase.
    pub index: usize,
    pub tilt: Tilt,
    /// Wait after transmitting this sample.
    pub delay: Duration,
}

// ============================================================================
// SWEEP PROFILE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProfile {
    pub angle_deg: u32,
    /// Must be at least 1.
    pub step_deg: u32,
    pub sample_delay: Duration,
    pub settle_delay: Duration,
}

impl Default for SweepProfile {
    fn default() -> Self {
        Self {
            angle_deg: 30,
            step_deg: 5,
            sample_delay: Duration::from_millis(100),
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl SweepProfile {
    /// Same shape with every delay removed.
    pub fn instant(self) -> Self {
        Self {
            sample_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            ..self
        }
    }

    fn step(&self) -> u32 {
        self.step_deg.max(1)
    }

    /// Samples in each of the ramp-in and ramp-out phases.
    pub fn ramp_len(&self) -> usize {
        (self.angle_deg / self.step()) as usize + 1
    }

    pub fn rotate_len(&self) -> usize {
        (360 / self.step()) as usize + 1
    }

    pub fn phase_len(&self, phase: SweepPhase) -> usize {
        match phase {
            SweepPhase::Settle => 1,
            SweepPhase::RampIn | SweepPhase::RampOut => self.ramp_len(),
            SweepPhase::Rotate => self.rotate_len(),
        }
    }

    pub fn total_len(&self) -> usize {
        1 + 2 * self.ramp_len() + self.rotate_len()
    }

    /// Time the full sweep spends waiting between samples.
    pub fn duration(&self) -> Duration {
        self.settle_delay + self.sample_delay * (self.total_len() as u32 - 1)
    }

    pub fn sequence(&self) -> SweepSequence {
        SweepSequence {
            profile: *self,
            phase: Some(SweepPhase::Settle),
            index: 0,
            emitted: 0,
        }
    }

    fn rotate_tilt(&self, index: usize) -> Tilt {
        let angle = f64::from(self.angle_deg);
        let k = (index as f64 * f64::from(self.step())).to_radians();
        Tilt::new(angle * k.cos(), angle * k.sin())
    }

    fn sample(&self, phase: SweepPhase, index: usize) -> SweepSample {
        let step = f64::from(self.step());
        let angle = f64::from(self.angle_deg);
        let tilt = match phase {
            SweepPhase::Settle => Tilt::ZERO,
            SweepPhase::RampIn => Tilt::new(index as f64 * step, 0.0),
            SweepPhase::Rotate => self.rotate_tilt(index),
            SweepPhase::RampOut => {
                let hold_y = self.rotate_tilt(self.rotate_len() - 1).y;
                Tilt::new(angle - index as f64 * step, hold_y)
            }
        };
        let delay = match phase {
            SweepPhase::Settle => self.settle_delay,
            _ => self.sample_delay,
        };
        SweepSample {
            phase,
            index,
            tilt,
            delay,
        }
    }
}

// ============================================================================
// SWEEP SEQUENCE
// ============================================================================

#[derive(Debug, Clone)]
pub struct SweepSequence {
    profile: SweepProfile,
    phase: Option<SweepPhase>,
    index: usize,
    emitted: usize,
}

impl SweepSequence {
    /// Start over from the settle sample.
    pub fn restart(&mut self) {
        *self = self.profile.sequence();
    }
}

impl Iterator for SweepSequence {
    type Item = SweepSample;

    fn next(&mut self) -> Option<SweepSample> {
        let phase = self.phase?;
        let sample = self.profile.sample(phase, self.index);

        self.index += 1;
        self.emitted += 1;
        if self.index >= self.profile.phase_len(phase) {
            self.index = 0;
            self.phase = match phase {
                SweepPhase::Settle => Some(SweepPhase::RampIn),
                SweepPhase::RampIn => Some(SweepPhase::Rotate),
                SweepPhase::Rotate => Some(SweepPhase::RampOut),
                SweepPhase::RampOut => None,
            };
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.profile.total_len() - self.emitted;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepSequence {}
