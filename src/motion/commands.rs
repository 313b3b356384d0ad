//! Command token definitions
//!
//! Controllers send bare ASCII tokens. The mapping table is fixed and compared
//! case-insensitively after trimming:
//!
//! | Token | Command |
//! |-------|---------|
//! | `W` | Forward |
//! | `S` | Backward |
//! | `A` | StrafeLeft |
//! | `D` | StrafeRight |
//! | `Q` | YawLeft |
//! | `E` | YawRight |
//! | `3` | PitchUp |
//! | `Z` | PitchDown |
//! | `STOP` | Stop |
//!
//! Anything else parses to [`Command::Unknown`].

use std::fmt;

/// Movement command, exactly one is current at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
    #[default]
    Stop,
    Unknown,
}

const TABLE: [(&str, Command); 9] = [
    ("W", Command::Forward),
    ("S", Command::Backward),
    ("A", Command::StrafeLeft),
    ("D", Command::StrafeRight),
    ("Q", Command::YawLeft),
    ("E", Command::YawRight),
    ("3", Command::PitchUp),
    ("Z", Command::PitchDown),
    ("STOP", Command::Stop),
];

impl Command {
    /// Parse raw command text
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim();
        TABLE
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(token))
            .map(|(_, cmd)| *cmd)
            .unwrap_or(Command::Unknown)
    }

    /// Canonical wire token (None for Unknown)
    pub fn token(self) -> Option<&'static str> {
        TABLE.iter().find(|(_, c)| *c == self).map(|(t, _)| *t)
    }

    /// Get command type as string
    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::StrafeLeft => "strafe_left",
            Self::StrafeRight => "strafe_right",
            Self::YawLeft => "yaw_left",
            Self::YawRight => "yaw_right",
            Self::PitchUp => "pitch_up",
            Self::PitchDown => "pitch_down",
            Self::Stop => "stop",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
