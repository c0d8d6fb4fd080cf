//! Input module - where operator commands come from
//!
//! The controller only sees [`CommandSource`]. [`TerminalSource`] reads the
//! keyboard; [`crate::ipc::ChannelSource`] reads commands sent from another
//! thread (scripts, tests).

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use thiserror::Error;
use tracing::warn;

use crate::control::Command;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("terminal input failed: {0}")]
    Terminal(#[from] io::Error),
}

pub trait CommandSource {
    /// Block until the next command.
    fn next_command(&mut self) -> Result<Command, InputError>;

    /// Wait at most `timeout` for a command. A zero timeout still checks once.
    fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>, InputError>;
}

// ============================================================================
// TERMINAL SOURCE - crossterm key capture
// ============================================================================

/// Keyboard input in raw mode.
///
/// Raw mode is only held while waiting for a key, so status output printed
/// between commands renders normally.
#[derive(Debug, Default)]
pub struct TerminalSource {
    _private: (),
}

impl TerminalSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyEvent>> {
        let _raw = RawModeGuard::enable()?;
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if !event::poll(remaining)? {
                    return Ok(None);
                }
            }
            if let Event::Key(key) = event::read()? {
                return Ok(Some(key));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(None);
            }
        }
    }
}

impl CommandSource for TerminalSource {
    fn next_command(&mut self) -> Result<Command, InputError> {
        loop {
            if let Some(command) = self.read_key(None)?.as_ref().and_then(Command::from_key) {
                return Ok(command);
            }
        }
    }

    fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>, InputError> {
        Ok(self.read_key(Some(timeout))?.as_ref().and_then(Command::from_key))
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("failed to leave raw mode: {e}");
        }
    }
}
