//! Actuator module - per-servo channels and the twelve-channel bank

pub mod bank;
pub mod channel;

pub use bank::{ActuatorBank, ArmChannels, ReleaseReport};
pub use channel::{ActuatorChannel, ChannelStatus};

// ============================================================================
// ACTUATOR TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Roll,
    Pitch,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Roll => write!(f, "roll"),
            Axis::Pitch => write!(f, "pitch"),
        }
    }
}

// ============================================================================
// POSITION LIMITS
// ============================================================================

/// Valid raw command range of a servo, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionLimits {
    min: i32,
    max: i32,
}

impl PositionLimits {
    /// Swaps the bounds if given in the wrong order.
    pub fn new(min: i32, max: i32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn clamp(&self, value: i64) -> i32 {
        value.clamp(i64::from(self.min), i64::from(self.max)) as i32
    }
}

impl Default for PositionLimits {
    fn default() -> Self {
        Self::new(0, 4095)
    }
}
