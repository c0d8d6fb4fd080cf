//! Dynamixel Protocol 2.0 packet codec.
//!
//! Instruction packet layout:
//!
//! ```text
//! FF FF FD 00 | ID | LEN_L LEN_H | INST | PARAMS... | CRC_L CRC_H
//! ```
//!
//! `LEN` counts everything after itself (instruction, stuffed parameters, CRC).
//! Status packets use `INST = 0x55` followed by the error byte. The CRC covers the
//! whole packet as transmitted, stuffing included.

use std::io::{self, Read};

use crc_any::CRCu16;
use thiserror::Error;

pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

pub const INST_READ: u8 = 0x02;
pub const INST_WRITE: u8 = 0x03;
pub const INST_STATUS: u8 = 0x55;

/// Control table (X-series, extended position mode).
pub const ADDR_TORQUE_ENABLE: u16 = 64;
pub const ADDR_GOAL_POSITION: u16 = 116;
pub const ADDR_PRESENT_POSITION: u16 = 132;
pub const LEN_POSITION: u16 = 4;

/// Bytes scanned for a header before a reply is declared garbage.
const MAX_SYNC_BYTES: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("missing packet header")]
    Header,

    #[error("truncated packet: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("CRC mismatch: packet says 0x{expected:04X}, computed 0x{computed:04X}")]
    Crc { expected: u16, computed: u16 },

    #[error("not a status packet (instruction 0x{0:02X})")]
    NotStatus(u8),

    #[error("reply from id {got}, expected {expected}")]
    IdMismatch { expected: u8, got: u8 },

    #[error("expected {expected} parameter bytes, got {got}")]
    ShortParams { expected: usize, got: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub id: u8,
    pub error: u8,
    pub params: Vec<u8>,
}

// ============================================================================
// CRC
// ============================================================================

/// CRC-16 with polynomial 0x8005, zero init, no reflection.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRCu16::create_crc(0x8005, 16, 0x0000, 0x0000, false);
    crc.digest(data);
    crc.get_crc()
}

// ============================================================================
// BYTE STUFFING
// ============================================================================

/// Insert `FD` after every `FF FF FD` so the body can never mimic a header.
pub fn stuff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 2);
    for (i, &b) in body.iter().enumerate() {
        out.push(b);
        if i >= 2 && body[i - 2] == 0xFF && body[i - 1] == 0xFF && b == 0xFD {
            out.push(0xFD);
        }
    }
    out
}

pub fn unstuff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        out.push(body[i]);
        let stuffed = i >= 2
            && body[i - 2] == 0xFF
            && body[i - 1] == 0xFF
            && body[i] == 0xFD
            && body.get(i + 1) == Some(&0xFD);
        i += if stuffed { 2 } else { 1 };
    }
    out
}

// ============================================================================
// ENCODING
// ============================================================================

pub fn instruction_packet(id: u8, instruction: u8, params: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(params.len() + 1);
    body.push(instruction);
    body.extend_from_slice(params);
    let body = stuff(&body);

    let length = (body.len() + 2) as u16;
    let mut packet = Vec::with_capacity(HEADER.len() + 3 + body.len() + 2);
    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.extend_from_slice(&length.to_le_bytes());
    packet.extend_from_slice(&body);
    let crc = crc16(&packet);
    packet.extend_from_slice(&crc.to_le_bytes());
    packet
}

pub fn read_packet(id: u8, address: u16, length: u16) -> Vec<u8> {
    let [a0, a1] = address.to_le_bytes();
    let [l0, l1] = length.to_le_bytes();
    instruction_packet(id, INST_READ, &[a0, a1, l0, l1])
}

pub fn write_packet(id: u8, address: u16, data: &[u8]) -> Vec<u8> {
    let mut params = Vec::with_capacity(data.len() + 2);
    params.extend_from_slice(&address.to_le_bytes());
    params.extend_from_slice(data);
    instruction_packet(id, INST_WRITE, &params)
}

pub fn goal_position_packet(id: u8, value: u32) -> Vec<u8> {
    write_packet(id, ADDR_GOAL_POSITION, &value.to_le_bytes())
}

pub fn present_position_packet(id: u8) -> Vec<u8> {
    read_packet(id, ADDR_PRESENT_POSITION, LEN_POSITION)
}

pub fn torque_packet(id: u8, enabled: bool) -> Vec<u8> {
    write_packet(id, ADDR_TORQUE_ENABLE, &[u8::from(enabled)])
}

/// Build a status packet the way an actuator would. Used by simulators and tests.
pub fn status_packet(id: u8, error: u8, params: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(params.len() + 1);
    body.push(error);
    body.extend_from_slice(params);
    instruction_packet(id, INST_STATUS, &body)
}

// ============================================================================
// DECODING
// ============================================================================

/// Validate and decode a complete status packet.
pub fn parse_status(packet: &[u8]) -> Result<StatusPacket, PacketError> {
    if packet.len() < HEADER.len() + 3 || packet[..HEADER.len()] != HEADER {
        return Err(PacketError::Header);
    }
    let id = packet[4];
    let length = usize::from(u16::from_le_bytes([packet[5], packet[6]]));
    let total = 7 + length;
    if length < 4 || packet.len() < total {
        return Err(PacketError::Truncated {
            expected: total.max(11),
            got: packet.len(),
        });
    }

    let expected = u16::from_le_bytes([packet[total - 2], packet[total - 1]]);
    let computed = crc16(&packet[..total - 2]);
    if expected != computed {
        return Err(PacketError::Crc { expected, computed });
    }

    let body = unstuff(&packet[7..total - 2]);
    if body[0] != INST_STATUS {
        return Err(PacketError::NotStatus(body[0]));
    }
    let error = *body.get(1).ok_or(PacketError::Truncated {
        expected: total + 1,
        got: total,
    })?;

    Ok(StatusPacket {
        id,
        error,
        params: body[2..].to_vec(),
    })
}

/// Reinterpret a raw 32-bit control-table word as the signed value the servo meant.
///
/// Position and velocity registers are two's-complement on the wire; a servo sitting
/// a few ticks below zero in extended position mode reports `0xFFFF_FFFx`.
pub fn reinterpret_signed(raw: u32) -> i32 {
    raw as i32
}

pub fn position_from_params(params: &[u8]) -> Result<i32, PacketError> {
    let bytes: [u8; 4] = params
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or(PacketError::ShortParams {
            expected: 4,
            got: params.len(),
        })?;
    Ok(reinterpret_signed(u32::from_le_bytes(bytes)))
}

/// Read one status packet off a byte stream, skipping any leading noise.
pub fn read_status_frame<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut frame = Vec::with_capacity(16);
    let mut byte = [0u8; 1];
    let mut scanned = 0;
    while frame.len() < HEADER.len() {
        reader.read_exact(&mut byte)?;
        scanned += 1;
        if scanned > MAX_SYNC_BYTES {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "no packet header"));
        }
        frame.push(byte[0]);
        if !HEADER.starts_with(&frame) {
            // Keep the longest suffix that could still begin a header.
            let keep = (1..frame.len())
                .find(|&start| HEADER.starts_with(&frame[start..]))
                .unwrap_or(frame.len());
            frame.drain(..keep);
        }
    }

    let mut id_len = [0u8; 3];
    reader.read_exact(&mut id_len)?;
    frame.extend_from_slice(&id_len);
    let length = usize::from(u16::from_le_bytes([id_len[1], id_len[2]]));

    let start = frame.len();
    frame.resize(start + length, 0);
    reader.read_exact(&mut frame[start..])?;
    Ok(frame)
}
