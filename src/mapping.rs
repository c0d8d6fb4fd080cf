//! Mapping engine - converts the two body tilt inputs into per-arm actuator targets

use std::fmt;

use crate::config::ARM_COUNT;

// ============================================================================
// ARM IDENTITY
// ============================================================================

/// One of the six arms, numbered 1..=6 as the operator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmId(u8);

impl ArmId {
    pub fn new(number: u8) -> Option<Self> {
        (1..=ARM_COUNT as u8).contains(&number).then_some(Self(number))
    }

    /// Zero-based position in the bank.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for ArmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TILT AND TARGETS
// ============================================================================

/// Body-frame tilt request in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tilt {
    pub x: f64,
    pub y: f64,
}

impl Tilt {
    pub const ZERO: Tilt = Tilt { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Raw, offset-relative targets for one arm's roll and pitch actuators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmTargets {
    pub roll: i32,
    pub pitch: i32,
}

/// How a tilt request is spread over the arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    /// Only the selected arm moves.
    Single(ArmId),
    /// Every arm tilts about its own origin by the same amount.
    Uniform,
    /// The tilt is applied to the body as a whole and resolved per arm.
    Body,
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    scale_roll: f64,
    scale_pitch: f64,
    arm_angles: [f64; ARM_COUNT],
}

impl Geometry {
    /// `arm_angles` are in radians, indexed by arm.
    pub fn new(scale_roll: f64, scale_pitch: f64, arm_angles: [f64; ARM_COUNT]) -> Self {
        Self {
            scale_roll,
            scale_pitch,
            arm_angles,
        }
    }

    pub fn scale_roll(&self) -> f64 {
        self.scale_roll
    }

    pub fn scale_pitch(&self) -> f64 {
        self.scale_pitch
    }

    /// Targets for a single arm, or `None` when the mapping leaves it untouched.
    pub fn map_targets(&self, mapping: Mapping, tilt: Tilt, arm: usize) -> Option<ArmTargets> {
        match mapping {
            Mapping::Single(selected) if selected.index() == arm => Some(self.uniform(tilt)),
            Mapping::Single(_) => None,
            Mapping::Uniform => Some(self.uniform(tilt)),
            Mapping::Body => Some(self.body(tilt, self.arm_angles[arm])),
        }
    }

    pub fn map_all(&self, mapping: Mapping, tilt: Tilt) -> [Option<ArmTargets>; ARM_COUNT] {
        std::array::from_fn(|arm| self.map_targets(mapping, tilt, arm))
    }

    fn uniform(&self, tilt: Tilt) -> ArmTargets {
        ArmTargets {
            roll: to_raw(tilt.x * self.scale_roll),
            pitch: to_raw(tilt.y * self.scale_pitch),
        }
    }

    /// Rotate the body tilt vector into the arm's local frame.
    fn body(&self, tilt: Tilt, theta: f64) -> ArmTargets {
        let (sin, cos) = theta.sin_cos();
        ArmTargets {
            roll: to_raw(self.scale_roll * (-tilt.x * sin + tilt.y * cos)),
            pitch: to_raw(self.scale_pitch * (tilt.x * cos + tilt.y * sin)),
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        crate::config::RuntimeConfig::default().geometry()
    }
}

// Saturates on overflow; the channel clamps to the servo range afterwards.
fn to_raw(value: f64) -> i32 {
    value.round() as i32
}
