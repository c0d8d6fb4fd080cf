use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::command::Command;
use super::state::{ControlState, Mode};
use crate::actuator::{ActuatorBank, ReleaseReport};
use crate::config::RuntimeConfig;
use crate::input::{CommandSource, InputError};
use crate::mapping::{Geometry, Tilt};
use crate::sequencer::{SweepKind, SweepProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    /// Stopped by the operator; the actuators hold the last sample.
    Cancelled,
    /// Quit arrived mid-sweep.
    Quit,
}

// ============================================================================
// CONTROLLER - Single-threaded command loop over the bank
// ============================================================================

/// Owns the control state and the bank, and turns commands into targets.
///
/// One command is fully processed before the next is taken. While a sweep runs,
/// only stop and quit are acted on; anything else is queued and handled after
/// the sweep in arrival order.
pub struct Controller {
    state: ControlState,
    bank: ActuatorBank,
    geometry: Geometry,
    profile: SweepProfile,
    deferred: VecDeque<Command>,
}

impl Controller {
    pub fn new(bank: ActuatorBank, config: &RuntimeConfig) -> Self {
        Self::with_parts(
            bank,
            config.geometry(),
            config.sweep_profile(),
            ControlState::new(config.control.initial_step, config.control.min_step),
        )
    }

    pub fn with_parts(
        bank: ActuatorBank,
        geometry: Geometry,
        profile: SweepProfile,
        state: ControlState,
    ) -> Self {
        Self {
            state,
            bank,
            geometry,
            profile,
            deferred: VecDeque::new(),
        }
    }

    /// Process commands until quit, then release the bank.
    ///
    /// `on_tick` runs after every processed command. The bank is released even
    /// when the source fails.
    pub fn run(
        &mut self,
        source: &mut dyn CommandSource,
        mut on_tick: impl FnMut(&mut Controller, Command),
    ) -> Result<ReleaseReport, InputError> {
        let result = loop {
            let command = match self.deferred.pop_front() {
                Some(command) => command,
                None => match source.next_command() {
                    Ok(command) => command,
                    Err(e) => break Err(e),
                },
            };
            match self.handle(command, source) {
                Ok(Flow::Continue) => on_tick(self, command),
                Ok(Flow::Quit) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        let report = self.shutdown();
        result.map(|()| report)
    }

    /// Apply one command. Sweeps run to completion (or cancellation) before
    /// this returns, polling `source` between samples.
    pub fn handle(
        &mut self,
        command: Command,
        source: &mut dyn CommandSource,
    ) -> Result<Flow, InputError> {
        debug!(%command, mode = %self.state.mode(), "command");
        match command {
            Command::SweepOrigin | Command::SweepBody => {
                let kind = if command == Command::SweepOrigin {
                    SweepKind::Origin
                } else {
                    SweepKind::Body
                };
                return match self.run_sweep(kind, source)? {
                    SweepOutcome::Quit => Ok(Flow::Quit),
                    SweepOutcome::Completed | SweepOutcome::Cancelled => Ok(Flow::Continue),
                };
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Stop | Command::Unrecognized => return Ok(Flow::Continue),

            Command::SelectUniform => self.state.set_mode(Mode::UniformOrigin),
            Command::SelectBody => self.state.set_mode(Mode::BodyDistributed),
            Command::SelectActuator(arm) => {
                self.state.set_mode(Mode::SingleActuator(arm));
                self.state.reset_tilt();
            }
            Command::ZeroAll => {
                self.bank.zero_all();
                self.state.reset_tilt();
            }
            Command::IncreaseStep => self.state.increase_step(),
            Command::DecreaseStep => self.state.decrease_step(),
            Command::TiltLeft => self.state.nudge(-1, 0),
            Command::TiltRight => self.state.nudge(1, 0),
            Command::TiltForward => self.state.nudge(0, 1),
            Command::TiltBack => self.state.nudge(0, -1),
            Command::Calibrate => {
                let calibrated = self.bank.calibrate();
                info!("Calibrated {calibrated} channels");
            }
        }

        self.push_targets();
        Ok(Flow::Continue)
    }

    /// Map the active mode at the current tilt and send it to the bank.
    fn push_targets(&mut self) {
        if let Some(mapping) = self.state.mode().mapping() {
            let targets = self.geometry.map_all(mapping, self.state.tilt());
            self.bank.apply(&targets);
        }
    }

    /// Drive one sweep. Mode and tilt return to idle and zero however it ends.
    pub fn run_sweep(
        &mut self,
        kind: SweepKind,
        source: &mut dyn CommandSource,
    ) -> Result<SweepOutcome, InputError> {
        self.state.set_mode(kind.mode());
        self.state.reset_tilt();
        info!(
            "Sweep {:?}: {} samples over {:?}",
            kind,
            self.profile.total_len(),
            self.profile.duration()
        );

        let mapping = kind.mapping();
        let mut outcome = SweepOutcome::Completed;
        for sample in self.profile.sequence() {
            self.state.set_tilt(sample.tilt);
            let sent = self.bank.apply(&self.geometry.map_all(mapping, sample.tilt));
            debug!(
                phase = ?sample.phase,
                index = sample.index,
                x = sample.tilt.x,
                y = sample.tilt.y,
                sent,
                "sweep sample"
            );

            match self.pause(sample.delay, source) {
                Ok(None) => {}
                Ok(Some(stop)) => {
                    outcome = stop;
                    break;
                }
                Err(e) => {
                    self.finish_sweep();
                    return Err(e);
                }
            }
        }

        self.finish_sweep();
        info!("Sweep {:?} {:?}", kind, outcome);
        Ok(outcome)
    }

    fn finish_sweep(&mut self) {
        self.state.set_mode(Mode::Idle);
        self.state.set_tilt(Tilt::ZERO);
    }

    /// Wait out `delay` while listening for commands. Polls at least once.
    fn pause(
        &mut self,
        delay: Duration,
        source: &mut dyn CommandSource,
    ) -> Result<Option<SweepOutcome>, InputError> {
        let deadline = Instant::now() + delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match source.poll_command(remaining)? {
                Some(Command::Stop) => return Ok(Some(SweepOutcome::Cancelled)),
                Some(Command::Quit) => return Ok(Some(SweepOutcome::Quit)),
                Some(other) => {
                    debug!(command = %other, "deferred until sweep ends");
                    self.deferred.push_back(other);
                }
                None => {}
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    /// Disengage and close every channel.
    pub fn shutdown(&mut self) -> ReleaseReport {
        info!("Shutting down, releasing all channels");
        self.state.set_mode(Mode::Idle);
        self.bank.release_all()
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn bank(&self) -> &ActuatorBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut ActuatorBank {
        &mut self.bank
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn profile(&self) -> &SweepProfile {
        &self.profile
    }

    /// Commands received during a sweep and not yet processed.
    pub fn deferred(&self) -> impl Iterator<Item = &Command> {
        self.deferred.iter()
    }
}
