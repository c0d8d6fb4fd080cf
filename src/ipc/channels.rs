use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

use crate::control::Command;
use crate::input::{CommandSource, InputError};

/// Command pipe from an input thread to the controller.
#[derive(Clone)]
pub struct CommandChannels {
    pub command_tx: Sender<Command>,
    pub command_rx: Receiver<Command>,
}

impl CommandChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (command_tx, command_rx) = bounded(buffer_size);
        Self {
            command_tx,
            command_rx,
        }
    }

    /// Controller side of the pipe. The channel stays open while any sender,
    /// including `command_tx` here, is alive.
    pub fn source(&self) -> ChannelSource {
        ChannelSource::new(self.command_rx.clone())
    }
}

// ============================================================================
// CHANNEL SOURCE - Commands from a crossbeam receiver
// ============================================================================

/// A [`CommandSource`] fed by a channel.
///
/// Once every sender is gone, `next_command` reads as quit. Polling a
/// disconnected channel just waits out the timeout, so a sweep in progress
/// finishes normally.
pub struct ChannelSource {
    rx: Receiver<Command>,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Command>) -> Self {
        Self { rx }
    }

    /// A source that yields `commands` in order, then quit.
    pub fn from_commands(commands: impl IntoIterator<Item = Command>) -> Self {
        let commands: Vec<Command> = commands.into_iter().collect();
        let (tx, rx) = bounded(commands.len().max(1));
        for command in commands {
            let _ = tx.send(command);
        }
        // tx drops here; once drained the source reads quit.
        Self::new(rx)
    }
}

impl CommandSource for ChannelSource {
    fn next_command(&mut self) -> Result<Command, InputError> {
        Ok(self.rx.recv().unwrap_or(Command::Quit))
    }

    fn poll_command(&mut self, timeout: Duration) -> Result<Option<Command>, InputError> {
        match self.rx.recv_timeout(timeout) {
            Ok(command) => Ok(Some(command)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Feed `commands` from a background thread, one every `interval`.
///
/// The channel disconnects when the script runs out, which the controller
/// reads as quit.
pub fn spawn_script_feeder(
    commands: Vec<Command>,
    interval: Duration,
) -> (ChannelSource, JoinHandle<usize>) {
    let (tx, rx) = bounded(16);
    let handle = thread::spawn(move || {
        let mut sent = 0;
        for command in commands {
            thread::sleep(interval);
            if tx.send(command).is_err() {
                break;
            }
            debug!(%command, "script command sent");
            sent += 1;
        }
        sent
    });
    (ChannelSource::new(rx), handle)
}
