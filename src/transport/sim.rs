//! Simulated servo bus - ideal in-memory actuators with scriptable faults

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::dynamixel::reinterpret_signed;
use super::{PortConfig, ServoLink, Transport, TransportError};

/// Position an unknown simulated servo reports before its first write.
pub const DEFAULT_SIM_POSITION: i32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    Open,
    SetRate,
    Read,
    Write,
    Torque,
}

#[derive(Default)]
struct SimState {
    positions: HashMap<u8, i32>,
    torque: HashMap<u8, bool>,
    writes: Vec<(u8, u32)>,
    opens: HashMap<u8, usize>,
    closes: HashMap<u8, usize>,
    baud: HashMap<u8, u32>,
    failures: HashMap<(u8, SimOp), TransportError>,
    random: Option<(StdRng, f64)>,
}

impl SimState {
    fn check(&mut self, id: u8, op: SimOp) -> Result<(), TransportError> {
        if let Some(err) = self.failures.get(&(id, op)) {
            return Err(err.clone());
        }
        if let Some((rng, rate)) = self.random.as_mut() {
            if matches!(op, SimOp::Read | SimOp::Write | SimOp::Torque) && rng.gen_bool(*rate) {
                return Err(TransportError::Comm(format!("simulated timeout on id {id}")));
            }
        }
        Ok(())
    }

    fn position(&self, id: u8) -> i32 {
        self.positions.get(&id).copied().unwrap_or(DEFAULT_SIM_POSITION)
    }
}

/// In-memory bus. Clones share state, so a test keeps one handle for inspection
/// while the bank owns the links.
#[derive(Clone, Default)]
pub struct SimulatedBus {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given servos already sitting at known positions.
    pub fn with_positions(positions: impl IntoIterator<Item = (u8, i32)>) -> Self {
        let bus = Self::new();
        bus.state.lock().positions.extend(positions);
        bus
    }

    /// Fail each read/write/torque transaction with probability `rate`.
    pub fn with_fault_rate(self, rate: f64, seed: u64) -> Self {
        self.state.lock().random = Some((StdRng::seed_from_u64(seed), rate.clamp(0.0, 1.0)));
        self
    }

    /// Make every `op` on `id` fail with `err` until cleared.
    pub fn fail(&self, id: u8, op: SimOp, err: TransportError) {
        self.state.lock().failures.insert((id, op), err);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failures.clear();
        state.random = None;
    }

    /// Move a servo by hand, as if someone pushed the arm.
    pub fn set_position(&self, id: u8, position: i32) {
        self.state.lock().positions.insert(id, position);
    }

    pub fn position(&self, id: u8) -> i32 {
        self.state.lock().position(id)
    }

    pub fn torque(&self, id: u8) -> bool {
        self.state.lock().torque.get(&id).copied().unwrap_or(false)
    }

    pub fn baud(&self, id: u8) -> Option<u32> {
        self.state.lock().baud.get(&id).copied()
    }

    /// Values written to `id`, oldest first.
    pub fn writes_for(&self, id: u8) -> Vec<u32> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(wid, _)| *wid == id)
            .map(|&(_, value)| value)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn open_count(&self, id: u8) -> usize {
        self.state.lock().opens.get(&id).copied().unwrap_or(0)
    }

    pub fn close_count(&self, id: u8) -> usize {
        self.state.lock().closes.get(&id).copied().unwrap_or(0)
    }
}

impl Transport for SimulatedBus {
    fn open(&mut self, id: u8, _config: &PortConfig) -> Result<Box<dyn ServoLink>, TransportError> {
        let mut state = self.state.lock();
        state.check(id, SimOp::Open)?;
        *state.opens.entry(id).or_default() += 1;
        Ok(Box::new(SimLink {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

// ============================================================================
// LINK
// ============================================================================

struct SimLink {
    id: u8,
    state: Arc<Mutex<SimState>>,
}

impl ServoLink for SimLink {
    fn set_rate(&mut self, baud: u32) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.check(self.id, SimOp::SetRate)?;
        state.baud.insert(self.id, baud);
        Ok(())
    }

    fn read_position(&mut self, id: u8) -> Result<i32, TransportError> {
        let mut state = self.state.lock();
        state.check(id, SimOp::Read)?;
        Ok(state.position(id))
    }

    fn write_position(&mut self, id: u8, value: u32) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.check(id, SimOp::Write)?;
        state.writes.push((id, value));
        state.positions.insert(id, reinterpret_signed(value));
        Ok(())
    }

    fn set_torque(&mut self, id: u8, enabled: bool) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.check(id, SimOp::Torque)?;
        state.torque.insert(id, enabled);
        Ok(())
    }

    fn close(self: Box<Self>) {
        *self.state.lock().closes.entry(self.id).or_default() += 1;
    }
}
