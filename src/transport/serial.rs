//! Serial servo bus - Dynamixel Protocol 2.0 over a `serialport` device

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info};

use super::dynamixel::{self, PacketError, StatusPacket};
use super::{HardwareFault, PortConfig, ServoLink, Transport, TransportError};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Opens links on real serial devices.
///
/// All actuators share one wire, so links to the same device path share one open
/// port. The port closes when the last link to it is closed.
#[derive(Default)]
pub struct DynamixelBus {
    ports: HashMap<String, Weak<Mutex<Box<dyn SerialPort>>>>,
}

impl DynamixelBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn port_for(&mut self, config: &PortConfig) -> Result<SharedPort, TransportError> {
        if let Some(port) = self.ports.get(&config.device).and_then(Weak::upgrade) {
            return Ok(port);
        }

        info!("Opening serial port: {} at {} bps", config.device, config.baud);
        let port = serialport::new(config.device.as_str(), config.baud)
            .timeout(config.timeout)
            .open()
            .map_err(|e| TransportError::Connection(format!("{}: {e}", config.device)))?;

        let port = Arc::new(Mutex::new(port));
        self.ports.insert(config.device.clone(), Arc::downgrade(&port));
        Ok(port)
    }
}

impl Transport for DynamixelBus {
    fn open(&mut self, id: u8, config: &PortConfig) -> Result<Box<dyn ServoLink>, TransportError> {
        let port = self.port_for(config)?;
        debug!(id, device = %config.device, "link opened");
        Ok(Box::new(DynamixelLink {
            port,
            device: config.device.clone(),
        }))
    }
}

// ============================================================================
// LINK
// ============================================================================

pub struct DynamixelLink {
    port: SharedPort,
    device: String,
}

impl DynamixelLink {
    /// Send one instruction packet and wait for its status reply.
    fn transact(&mut self, id: u8, packet: &[u8]) -> Result<StatusPacket, TransportError> {
        let mut port = self.port.lock();
        // Stale bytes from an earlier timed-out reply would desync the framer.
        port.clear(ClearBuffer::Input).map_err(comm)?;
        port.write_all(packet).map_err(io_comm)?;
        port.flush().map_err(io_comm)?;

        let frame = dynamixel::read_status_frame(&mut **port).map_err(io_comm)?;
        drop(port);

        let status = dynamixel::parse_status(&frame).map_err(packet_comm)?;
        if status.id != id {
            return Err(packet_comm(PacketError::IdMismatch {
                expected: id,
                got: status.id,
            }));
        }
        if let Some(fault) = HardwareFault::from_status_byte(status.error) {
            return Err(TransportError::Protocol { id, fault });
        }
        Ok(status)
    }
}

impl ServoLink for DynamixelLink {
    fn set_rate(&mut self, baud: u32) -> Result<(), TransportError> {
        self.port
            .lock()
            .set_baud_rate(baud)
            .map_err(|e| TransportError::Config(format!("{}: baud {baud}: {e}", self.device)))
    }

    fn read_position(&mut self, id: u8) -> Result<i32, TransportError> {
        let status = self.transact(id, &dynamixel::present_position_packet(id))?;
        dynamixel::position_from_params(&status.params).map_err(packet_comm)
    }

    fn write_position(&mut self, id: u8, value: u32) -> Result<(), TransportError> {
        self.transact(id, &dynamixel::goal_position_packet(id, value))
            .map(|_| ())
    }

    fn set_torque(&mut self, id: u8, enabled: bool) -> Result<(), TransportError> {
        self.transact(id, &dynamixel::torque_packet(id, enabled))
            .map(|_| ())
    }

    fn close(self: Box<Self>) {
        debug!(device = %self.device, "link closed");
    }
}

fn comm(e: serialport::Error) -> TransportError {
    TransportError::Comm(e.to_string())
}

fn io_comm(e: io::Error) -> TransportError {
    match e.kind() {
        io::ErrorKind::TimedOut => TransportError::Comm("timed out waiting for status".into()),
        _ => TransportError::Comm(e.to_string()),
    }
}

fn packet_comm(e: PacketError) -> TransportError {
    TransportError::Comm(e.to_string())
}
