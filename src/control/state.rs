use std::fmt;

use crate::mapping::{ArmId, Mapping, Tilt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    SingleActuator(ArmId),
    UniformOrigin,
    BodyDistributed,
    SweepOrigin,
    SweepBody,
}

impl Mode {
    /// Mapping applied on every command, or `None` for modes that map nothing
    /// directly.
    pub fn mapping(self) -> Option<Mapping> {
        match self {
            Mode::SingleActuator(arm) => Some(Mapping::Single(arm)),
            Mode::UniformOrigin => Some(Mapping::Uniform),
            Mode::BodyDistributed => Some(Mapping::Body),
            Mode::Idle | Mode::SweepOrigin | Mode::SweepBody => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => write!(f, "idle"),
            Mode::SingleActuator(arm) => write!(f, "arm {arm}"),
            Mode::UniformOrigin => write!(f, "uniform origin"),
            Mode::BodyDistributed => write!(f, "body distributed"),
            Mode::SweepOrigin => write!(f, "sweep (origin)"),
            Mode::SweepBody => write!(f, "sweep (body)"),
        }
    }
}

// ============================================================================
// CONTROL STATE - Mode, tilt and step, mutated only by the controller
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    mode: Mode,
    tilt: Tilt,
    step: i32,
    min_step: i32,
}

impl ControlState {
    /// `min_step` is raised to 1 and `step` to `min_step`.
    pub fn new(step: i32, min_step: i32) -> Self {
        let min_step = min_step.max(1);
        Self {
            mode: Mode::Idle,
            tilt: Tilt::ZERO,
            step: step.max(min_step),
            min_step,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tilt(&self) -> Tilt {
        self.tilt
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn min_step(&self) -> i32 {
        self.min_step
    }

    pub(super) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub(super) fn set_tilt(&mut self, tilt: Tilt) {
        self.tilt = tilt;
    }

    pub(super) fn reset_tilt(&mut self) {
        self.tilt = Tilt::ZERO;
    }

    /// Move the tilt by `dx`/`dy` steps.
    pub(super) fn nudge(&mut self, dx: i32, dy: i32) {
        let step = f64::from(self.step);
        self.tilt.x += f64::from(dx) * step;
        self.tilt.y += f64::from(dy) * step;
    }

    pub(super) fn increase_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    pub(super) fn decrease_step(&mut self) {
        self.step = (self.step - 1).max(self.min_step);
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
