// Define message types for the runtime

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::control::lift::LiftMode;
use crate::motor::registry::ActuatorId;

// Operator controls sampled once per tick by the host
// Missing fields read as released, so a scripted line only names what it presses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperatorInput {
    pub drive_forward: f32,
    pub drive_strafe: f32,
    pub drive_rotate: f32,

    pub intake_left_in: bool,
    pub intake_left_out: bool,
    pub intake_right_in: bool,
    pub intake_right_out: bool,

    pub foundation_raise: bool,
    pub foundation_lower: bool,

    pub grip_close: bool,
    pub grip_open: bool,
    pub roll_left: bool,
    pub roll_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,

    pub lift_manual_axis: f32,
    pub lift_level_up: bool,
    pub lift_level_down: bool,
}

impl OperatorInput {
    /// All sticks centered, nothing pressed
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Power for every non-drive, non-lift actuator, recomputed every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActuatorPowerSet {
    pub left_intake: f32,
    pub right_intake: f32,
    pub left_foundation: f32,
    pub right_foundation: f32,
    pub grip: f32,
    pub roll: f32,
    pub pitch: f32,
}

impl ActuatorPowerSet {
    /// (actuator, power) pairs in a fixed order
    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, f32)> {
        [
            (ActuatorId::LeftIntake, self.left_intake),
            (ActuatorId::RightIntake, self.right_intake),
            (ActuatorId::LeftFoundation, self.left_foundation),
            (ActuatorId::RightFoundation, self.right_foundation),
            (ActuatorId::Grip, self.grip),
            (ActuatorId::Roll, self.roll),
            (ActuatorId::Pitch, self.pitch),
        ]
        .into_iter()
    }

    pub fn get(&self, id: ActuatorId) -> Option<f32> {
        self.iter().find(|(a, _)| *a == id).map(|(_, p)| p)
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    InputStale,
}

/// Diagnostic readback for display; never consumed by the control path
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub tick: u64,
    pub health: RuntimeHealth,
    /// Power each actuator reports back, keyed by hardware-map name
    pub powers: BTreeMap<&'static str, f32>,
    pub lift_mode: LiftMode,
    pub lift_level: usize,
    pub lift_target: Option<i32>,
    pub lift_degraded: bool,
    /// Encoder positions keyed by hardware-map name; unreadable ones are left out
    pub positions: BTreeMap<&'static str, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_input_line_parses() {
        let input: OperatorInput =
            serde_json::from_str(r#"{ "driveForward": 0.5, "liftLevelUp": true }"#).unwrap();
        assert_eq!(input.drive_forward, 0.5);
        assert!(input.lift_level_up);
        assert!(!input.intake_left_in);
        assert_eq!(input.lift_manual_axis, 0.0);
    }

    #[test]
    fn test_power_set_lookup() {
        let set = ActuatorPowerSet {
            grip: -1.0,
            ..ActuatorPowerSet::default()
        };
        assert_eq!(set.get(ActuatorId::Grip), Some(-1.0));
        assert_eq!(set.get(ActuatorId::LeftIntake), Some(0.0));
        assert_eq!(set.get(ActuatorId::LiftArm), None);
        assert_eq!(set.iter().count(), 7);
    }

    #[test]
    fn test_health_serializes_snake_case() {
        let json = serde_json::to_string(&RuntimeHealth::InputStale).unwrap();
        assert_eq!(json, "\"input_stale\"");
    }
}
