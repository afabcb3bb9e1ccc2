// Actuator registry interface
//
// The registry is the hardware access layer: it hands out named motor and
// continuous-servo handles and accepts direction, run mode, brake behavior,
// power and target position commands. Everything above this layer only talks
// to the trait, so the same control code runs against real hardware or the
// in-memory simulation.

use serde::{Deserialize, Serialize};

/// Every actuator the robot wires up, in hardware-map order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActuatorId {
    LeftFront,
    RightFront,
    LeftBack,
    RightBack,
    LeftIntake,
    RightIntake,
    LiftArm,
    Grip,
    Roll,
    Pitch,
    LeftFoundation,
    RightFoundation,
}

/// What kind of device sits behind an actuator id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorKind {
    /// DC motor with an encoder
    Motor,
    /// Continuous-rotation servo, power only
    ContinuousServo,
}

impl ActuatorId {
    pub const ALL: [ActuatorId; 12] = [
        ActuatorId::LeftFront,
        ActuatorId::RightFront,
        ActuatorId::LeftBack,
        ActuatorId::RightBack,
        ActuatorId::LeftIntake,
        ActuatorId::RightIntake,
        ActuatorId::LiftArm,
        ActuatorId::Grip,
        ActuatorId::Roll,
        ActuatorId::Pitch,
        ActuatorId::LeftFoundation,
        ActuatorId::RightFoundation,
    ];

    /// Drivetrain wheels as [left_front, right_front, left_back, right_back]
    pub const WHEELS: [ActuatorId; 4] = [
        ActuatorId::LeftFront,
        ActuatorId::RightFront,
        ActuatorId::LeftBack,
        ActuatorId::RightBack,
    ];

    /// Name of the device in the hardware map
    pub fn name(self) -> &'static str {
        match self {
            ActuatorId::LeftFront => "leftFrontMotor",
            ActuatorId::RightFront => "rightFrontMotor",
            ActuatorId::LeftBack => "leftBackMotor",
            ActuatorId::RightBack => "rightBackMotor",
            ActuatorId::LeftIntake => "leftIntakeMotor",
            ActuatorId::RightIntake => "rightIntakeMotor",
            ActuatorId::LiftArm => "liftArmMotor",
            ActuatorId::Grip => "gripCRServo",
            ActuatorId::Roll => "rollCRServo",
            ActuatorId::Pitch => "pitchCRServo",
            ActuatorId::LeftFoundation => "leftFoundationCRServo",
            ActuatorId::RightFoundation => "rightFoundationCRServo",
        }
    }

    pub fn kind(self) -> ActuatorKind {
        match self {
            ActuatorId::LeftFront
            | ActuatorId::RightFront
            | ActuatorId::LeftBack
            | ActuatorId::RightBack
            | ActuatorId::LeftIntake
            | ActuatorId::RightIntake
            | ActuatorId::LiftArm => ActuatorKind::Motor,
            _ => ActuatorKind::ContinuousServo,
        }
    }

    pub fn is_motor(self) -> bool {
        self.kind() == ActuatorKind::Motor
    }
}

impl std::fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction polarity of an actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    /// Sign applied to commanded power by the hardware
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// Motor run modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Stop and zero the encoder; the motor does not move in this mode
    StopAndResetEncoder,
    /// Open-loop power, encoder not used for control
    RunWithoutEncoder,
    /// Seek the target position at the commanded power
    RunToPosition,
}

/// What the motor does when commanded power is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroPowerBehavior {
    #[default]
    Float,
    Brake,
}

/// Error types for registry access
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardwareError {
    #[error("Actuator {id} is not present in the hardware map")]
    MissingActuator { id: ActuatorId },

    #[error("Position of {id} could not be read")]
    PositionUnavailable { id: ActuatorId },

    #[error("{id} does not support {operation}")]
    Unsupported {
        id: ActuatorId,
        operation: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, HardwareError>;

/// Hardware access layer for named actuators
///
/// Calls are synchronous and expected not to block; any latency belongs to
/// the implementation.
pub trait ActuatorRegistry {
    /// Whether the named actuator is wired up
    fn contains(&self, id: ActuatorId) -> bool;

    fn set_direction(&mut self, id: ActuatorId, direction: Direction) -> Result<()>;

    /// Motors only
    fn set_run_mode(&mut self, id: ActuatorId, mode: RunMode) -> Result<()>;

    /// Motors only
    fn set_zero_power_behavior(&mut self, id: ActuatorId, behavior: ZeroPowerBehavior)
    -> Result<()>;

    /// Set signed power in [-1, 1]
    fn set_power(&mut self, id: ActuatorId, power: f32) -> Result<()>;

    /// Motors only. Used together with `RunMode::RunToPosition`
    fn set_target_position(&mut self, id: ActuatorId, position: i32) -> Result<()>;

    /// Current encoder position (motors only)
    fn current_position(&self, id: ActuatorId) -> Result<i32>;

    /// Last commanded power, for diagnostics
    fn power(&self, id: ActuatorId) -> Result<f32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = ActuatorId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ActuatorId::ALL.len());
    }

    #[test]
    fn test_kinds() {
        assert!(ActuatorId::WHEELS.iter().all(|id| id.is_motor()));
        assert!(ActuatorId::LiftArm.is_motor());
        assert_eq!(ActuatorId::Grip.kind(), ActuatorKind::ContinuousServo);
        assert_eq!(
            ActuatorId::RightFoundation.kind(),
            ActuatorKind::ContinuousServo
        );
    }

    #[test]
    fn test_id_serializes_camel_case() {
        let json = serde_json::to_string(&ActuatorId::LeftFoundation).unwrap();
        assert_eq!(json, "\"leftFoundation\"");
    }
}
