use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::mapping::ArmId;

/// A discrete operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectUniform,
    SelectBody,
    SweepOrigin,
    SweepBody,
    ZeroAll,
    SelectActuator(ArmId),
    IncreaseStep,
    DecreaseStep,
    TiltLeft,
    TiltRight,
    TiltForward,
    TiltBack,
    Calibrate,
    Stop,
    Quit,
    Unrecognized,
}

impl Command {
    /// Keyboard layout of the operator console.
    pub fn from_char(c: char) -> Self {
        match c {
            '0' => Command::SelectUniform,
            '9' => Command::SelectBody,
            'q' => Command::SweepOrigin,
            'w' => Command::SweepBody,
            '-' => Command::ZeroAll,
            '1'..='6' => c
                .to_digit(10)
                .and_then(|d| ArmId::new(d as u8))
                .map_or(Command::Unrecognized, Command::SelectActuator),
            'a' => Command::IncreaseStep,
            'z' => Command::DecreaseStep,
            'j' => Command::TiltLeft,
            'l' => Command::TiltRight,
            'i' => Command::TiltForward,
            'k' => Command::TiltBack,
            'm' => Command::Calibrate,
            ' ' => Command::Stop,
            '\u{1b}' => Command::Quit,
            _ => Command::Unrecognized,
        }
    }

    /// `None` for key releases, which carry no command.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let command = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
            KeyCode::Char(c) => Command::from_char(c),
            KeyCode::Esc => Command::Quit,
            KeyCode::Left => Command::TiltLeft,
            KeyCode::Right => Command::TiltRight,
            KeyCode::Up => Command::TiltForward,
            KeyCode::Down => Command::TiltBack,
            _ => Command::Unrecognized,
        };
        Some(command)
    }

    /// Parse a key script.
    ///
    /// Tokens are separated by whitespace. A token is either a command name
    /// (`stop`, `quit`, `esc`, `space`, `left`, ...) or a run of console keys,
    /// each mapped on its own: `"3 ii stop quit"`.
    pub fn parse_script(script: &str) -> Vec<Self> {
        let mut commands = Vec::new();
        for token in script.split_whitespace() {
            match Self::from_name(token) {
                Some(command) => commands.push(command),
                None => commands.extend(token.chars().map(Self::from_char)),
            }
        }
        commands
    }

    fn from_name(token: &str) -> Option<Self> {
        let command = match token.to_ascii_lowercase().as_str() {
            "uniform" => Command::SelectUniform,
            "body" => Command::SelectBody,
            "sweep-origin" => Command::SweepOrigin,
            "sweep-body" => Command::SweepBody,
            "zero" => Command::ZeroAll,
            "faster" => Command::IncreaseStep,
            "slower" => Command::DecreaseStep,
            "left" => Command::TiltLeft,
            "right" => Command::TiltRight,
            "forward" | "up" => Command::TiltForward,
            "back" | "down" => Command::TiltBack,
            "calibrate" => Command::Calibrate,
            "stop" | "space" => Command::Stop,
            "quit" | "esc" => Command::Quit,
            _ => return None,
        };
        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SelectUniform => write!(f, "select-uniform"),
            Command::SelectBody => write!(f, "select-body"),
            Command::SweepOrigin => write!(f, "sweep-origin"),
            Command::SweepBody => write!(f, "sweep-body"),
            Command::ZeroAll => write!(f, "zero-all"),
            Command::SelectActuator(arm) => write!(f, "select-actuator({arm})"),
            Command::IncreaseStep => write!(f, "increase-step"),
            Command::DecreaseStep => write!(f, "decrease-step"),
            Command::TiltLeft => write!(f, "tilt-left"),
            Command::TiltRight => write!(f, "tilt-right"),
            Command::TiltForward => write!(f, "tilt-forward"),
            Command::TiltBack => write!(f, "tilt-back"),
            Command::Calibrate => write!(f, "calibrate"),
            Command::Stop => write!(f, "stop"),
            Command::Quit => write!(f, "quit"),
            Command::Unrecognized => write!(f, "unrecognized"),
        }
    }
}
