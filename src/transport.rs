//! Transport module - the servo bus seam and its implementations
//!
//! The core only talks to [`Transport`] (open a link for one actuator) and
//! [`ServoLink`] (position/torque transactions on that link). Every transaction
//! reports its own success or failure; nothing here retries.

pub mod dynamixel;
pub mod serial;
pub mod sim;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use serial::DynamixelBus;
pub use sim::{SimOp, SimulatedBus};

/// Where and how to reach the servo bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfig {
    pub device: String,
    pub baud: u32,
    pub timeout: Duration,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The port could not be opened.
    #[error("connection error: {0}")]
    Connection(String),

    /// The port opened but could not be configured.
    #[error("configuration error: {0}")]
    Config(String),

    /// The transaction did not complete (timeout, I/O, corrupt reply).
    #[error("communication error: {0}")]
    Comm(String),

    /// The actuator answered with a fault.
    #[error("actuator {id} reported {fault}")]
    Protocol { id: u8, fault: HardwareFault },
}

impl TransportError {
    /// Startup failures that take a channel out of service.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::Connection(_) | TransportError::Config(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    ResultFail,
    Instruction,
    Crc,
    DataRange,
    DataLength,
    DataLimit,
    Access,
    /// Only the hardware alert bit was set.
    AlertOnly,
    Unknown(u8),
}

/// Decoded status-packet error byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareFault {
    pub kind: FaultKind,
    /// The actuator has latched a hardware error (overload, overheat, ...).
    pub alert: bool,
}

impl HardwareFault {
    const ALERT_BIT: u8 = 0x80;

    /// `None` when the byte reports no error.
    pub fn from_status_byte(byte: u8) -> Option<Self> {
        let alert = byte & Self::ALERT_BIT != 0;
        let kind = match byte & !Self::ALERT_BIT {
            0 if alert => FaultKind::AlertOnly,
            0 => return None,
            1 => FaultKind::ResultFail,
            2 => FaultKind::Instruction,
            3 => FaultKind::Crc,
            4 => FaultKind::DataRange,
            5 => FaultKind::DataLength,
            6 => FaultKind::DataLimit,
            7 => FaultKind::Access,
            other => FaultKind::Unknown(other),
        };
        Some(Self { kind, alert })
    }
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FaultKind::ResultFail => write!(f, "result fail")?,
            FaultKind::Instruction => write!(f, "instruction error")?,
            FaultKind::Crc => write!(f, "CRC error")?,
            FaultKind::DataRange => write!(f, "data range error")?,
            FaultKind::DataLength => write!(f, "data length error")?,
            FaultKind::DataLimit => write!(f, "data limit error")?,
            FaultKind::Access => write!(f, "access error")?,
            FaultKind::AlertOnly => write!(f, "hardware alert")?,
            FaultKind::Unknown(code) => write!(f, "unknown error 0x{code:02X}")?,
        }
        if self.alert && self.kind != FaultKind::AlertOnly {
            write!(f, " (hardware alert)")?;
        }
        Ok(())
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Opens links to individual actuators.
pub trait Transport {
    fn open(&mut self, id: u8, config: &PortConfig) -> Result<Box<dyn ServoLink>, TransportError>;
}

/// An open link to the bus, used by exactly one actuator channel.
pub trait ServoLink: Send {
    fn set_rate(&mut self, baud: u32) -> Result<(), TransportError>;

    fn read_position(&mut self, id: u8) -> Result<i32, TransportError>;

    fn write_position(&mut self, id: u8, value: u32) -> Result<(), TransportError>;

    fn set_torque(&mut self, id: u8, enabled: bool) -> Result<(), TransportError>;

    /// Release the link. Consuming the box makes a second close impossible.
    fn close(self: Box<Self>);
}
