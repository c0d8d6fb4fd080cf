//! Configuration loading/management

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::actuator::PositionLimits;
use crate::mapping::Geometry;
use crate::sequencer::SweepProfile;
use crate::transport::PortConfig;

/// Default location of the runtime configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/hexatilt.toml";

/// Number of arms on the body; one roll and one pitch actuator per arm.
pub const ARM_COUNT: usize = 6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// RUNTIME CONFIG - Everything the controller needs, read from TOML
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub bus: BusSection,
    pub actuators: ActuatorSection,
    pub geometry: GeometrySection,
    pub sweep: SweepSection,
    pub control: ControlSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusSection {
    pub device: String,
    pub baud: u32,
    pub timeout_ms: u64,
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud: 57_600,
            timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorSection {
    pub roll_ids: Vec<u8>,
    pub pitch_ids: Vec<u8>,
    pub position_min: i32,
    pub position_max: i32,
}

impl Default for ActuatorSection {
    fn default() -> Self {
        Self {
            roll_ids: vec![1, 2, 3, 4, 5, 6],
            pitch_ids: vec![11, 12, 13, 14, 15, 16],
            position_min: 0,
            position_max: 4095,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometrySection {
    /// Raw position units per degree of roll tilt.
    pub scale_roll: f64,
    /// Raw position units per degree of pitch tilt.
    pub scale_pitch: f64,
    /// Placement of each arm around the body center, degrees.
    pub arm_angles_deg: Vec<f64>,
}

impl Default for GeometrySection {
    fn default() -> Self {
        // 4096 ticks per servo revolution, times the gear ratio of each linkage.
        Self {
            scale_roll: 4096.0 / 360.0 * 40.0 / 12.0,
            scale_pitch: 4096.0 / 360.0 * 306.0 / 12.0,
            arm_angles_deg: vec![0.0, 180.0, 120.0, 300.0, 60.0, 240.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    pub angle_deg: u32,
    pub step_deg: u32,
    pub sample_delay_ms: u64,
    pub settle_delay_ms: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            angle_deg: 30,
            step_deg: 5,
            sample_delay_ms: 100,
            settle_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    pub initial_step: i32,
    pub min_step: i32,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            initial_step: 1,
            min_step: 1,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.actuators;
        if a.roll_ids.len() != ARM_COUNT || a.pitch_ids.len() != ARM_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected {ARM_COUNT} roll and {ARM_COUNT} pitch ids, got {} and {}",
                a.roll_ids.len(),
                a.pitch_ids.len()
            )));
        }
        let mut ids: Vec<u8> = a.roll_ids.iter().chain(&a.pitch_ids).copied().collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != 2 * ARM_COUNT {
            return Err(ConfigError::Invalid("actuator ids must be unique".into()));
        }
        if a.position_min < 0 || a.position_min >= a.position_max {
            return Err(ConfigError::Invalid(format!(
                "position range {}..={} is empty or negative",
                a.position_min, a.position_max
            )));
        }
        if self.geometry.arm_angles_deg.len() != ARM_COUNT {
            return Err(ConfigError::Invalid(format!(
                "expected {ARM_COUNT} arm angles, got {}",
                self.geometry.arm_angles_deg.len()
            )));
        }
        if self.sweep.step_deg == 0 {
            return Err(ConfigError::Invalid("sweep.step_deg must be at least 1".into()));
        }
        if self.control.min_step < 1 || self.control.initial_step < self.control.min_step {
            return Err(ConfigError::Invalid(format!(
                "control.initial_step ({}) must be >= control.min_step ({}) >= 1",
                self.control.initial_step, self.control.min_step
            )));
        }
        Ok(())
    }

    pub fn port_config(&self) -> PortConfig {
        PortConfig {
            device: self.bus.device.clone(),
            baud: self.bus.baud,
            timeout: Duration::from_millis(self.bus.timeout_ms),
        }
    }

    pub fn limits(&self) -> PositionLimits {
        PositionLimits::new(self.actuators.position_min, self.actuators.position_max)
    }

    pub fn geometry(&self) -> Geometry {
        let mut arm_angles = [0.0; ARM_COUNT];
        for (slot, deg) in arm_angles.iter_mut().zip(&self.geometry.arm_angles_deg) {
            *slot = deg.to_radians();
        }
        Geometry::new(self.geometry.scale_roll, self.geometry.scale_pitch, arm_angles)
    }

    pub fn sweep_profile(&self) -> SweepProfile {
        SweepProfile {
            angle_deg: self.sweep.angle_deg,
            step_deg: self.sweep.step_deg,
            sample_delay: Duration::from_millis(self.sweep.sample_delay_ms),
            settle_delay: Duration::from_millis(self.sweep.settle_delay_ms),
        }
    }
}

// ============================================================================
// CONFIG FILE LOADING
// ============================================================================

/// Load the runtime configuration. A missing file means defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<RuntimeConfig, ConfigError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(s) => RuntimeConfig::from_toml_str(&s, &origin),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No config at {origin}, using defaults");
            Ok(RuntimeConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: origin,
            source,
        }),
    }
}
