//! Per-tick motion intent derived from the current command

use crate::core::types::Vec3;
use crate::motion::commands::Command;

/// What the current command asks for this tick
///
/// `move_vector` is unit length in the body frame. Rates are signed unit
/// scalars; the tick scales them by the configured speeds and elapsed time.
/// Positive `pitch_rate` tilts the view downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionIntent {
    pub move_vector: Vec3,
    pub rotation_rate: f32,
    pub pitch_rate: f32,
}

impl MotionIntent {
    /// Zero motion
    pub const IDLE: MotionIntent = MotionIntent {
        move_vector: Vec3::ZERO,
        rotation_rate: 0.0,
        pitch_rate: 0.0,
    };

    /// Derive the intent for a command. Unknown behaves like Stop.
    pub fn from_command(command: Command) -> Self {
        match command {
            Command::Forward => Self::translate(Vec3::FORWARD),
            Command::Backward => Self::translate(-Vec3::FORWARD),
            Command::StrafeLeft => Self::translate(-Vec3::RIGHT),
            Command::StrafeRight => Self::translate(Vec3::RIGHT),
            Command::YawLeft => Self {
                rotation_rate: -1.0,
                ..Self::IDLE
            },
            Command::YawRight => Self {
                rotation_rate: 1.0,
                ..Self::IDLE
            },
            Command::PitchUp => Self {
                pitch_rate: -1.0,
                ..Self::IDLE
            },
            Command::PitchDown => Self {
                pitch_rate: 1.0,
                ..Self::IDLE
            },
            Command::Stop | Command::Unknown => Self::IDLE,
        }
    }

    fn translate(move_vector: Vec3) -> Self {
        Self {
            move_vector,
            ..Self::IDLE
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translations_are_unit_length() {
        for cmd in [
            Command::Forward,
            Command::Backward,
            Command::StrafeLeft,
            Command::StrafeRight,
        ] {
            let intent = MotionIntent::from_command(cmd);
            assert_eq!(intent.move_vector.length(), 1.0, "{cmd}");
            assert_eq!(intent.rotation_rate, 0.0);
            assert_eq!(intent.pitch_rate, 0.0);
        }
    }

    #[test]
    fn test_rotation_and_pitch_signs() {
        assert_eq!(MotionIntent::from_command(Command::YawLeft).rotation_rate, -1.0);
        assert_eq!(MotionIntent::from_command(Command::YawRight).rotation_rate, 1.0);
        assert_eq!(MotionIntent::from_command(Command::PitchUp).pitch_rate, -1.0);
        assert_eq!(MotionIntent::from_command(Command::PitchDown).pitch_rate, 1.0);
        assert!(MotionIntent::from_command(Command::YawLeft).move_vector.is_zero());
    }

    #[test]
    fn test_unknown_is_stop() {
        assert!(MotionIntent::from_command(Command::Unknown).is_idle());
        assert_eq!(
            MotionIntent::from_command(Command::Unknown),
            MotionIntent::from_command(Command::Stop)
        );
    }
}
