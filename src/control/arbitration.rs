// Discrete operator controls -> actuator power
//
// Every actuator is driven by a pair of opposing controls. Released means
// exactly zero power on that tick, never "keep the last command". When both
// controls of a pair are held the first-declared one wins.

use crate::messages::{ActuatorPowerSet, OperatorInput};

const FULL_POWER: f32 = 1.0;

/// Resolve an opposing pair of controls to a power
///
/// `first` is checked before `second`, so it takes priority when both are held.
pub fn resolve_pair(first: bool, second: bool) -> f32 {
    if first {
        FULL_POWER
    } else if second {
        -FULL_POWER
    } else {
        0.0
    }
}

/// Compute power for intakes, foundation grippers and the end effector
pub fn compute_actuator_powers(input: &OperatorInput) -> ActuatorPowerSet {
    // lowering is declared first: the grippers must grab even if raise is also held
    let foundation = resolve_pair(input.foundation_lower, input.foundation_raise);

    ActuatorPowerSet {
        left_intake: resolve_pair(input.intake_left_in, input.intake_left_out),
        right_intake: resolve_pair(input.intake_right_in, input.intake_right_out),
        left_foundation: foundation,
        right_foundation: foundation,
        grip: resolve_pair(input.grip_close, input.grip_open),
        roll: resolve_pair(input.roll_left, input.roll_right),
        pitch: resolve_pair(input.pitch_up, input.pitch_down),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_idle_is_exactly_zero() {
        let powers = compute_actuator_powers(&OperatorInput::idle());
        assert_eq!(powers, ActuatorPowerSet::default());
        assert!(powers.iter().all(|(_, p)| p == 0.0));
    }

    #[test]
    fn test_single_controls() {
        let input = OperatorInput {
            intake_left_in: true,
            intake_right_out: true,
            grip_open: true,
            pitch_up: true,
            ..OperatorInput::idle()
        };
        let powers = compute_actuator_powers(&input);
        assert_eq!(powers.left_intake, 1.0);
        assert_eq!(powers.right_intake, -1.0);
        assert_eq!(powers.grip, -1.0);
        assert_eq!(powers.pitch, 1.0);
        assert_eq!(powers.roll, 0.0);
        assert_eq!(powers.left_foundation, 0.0);
    }

    #[test]
    fn test_both_intake_controls_prefer_in() {
        let input = OperatorInput {
            intake_left_in: true,
            intake_left_out: true,
            ..OperatorInput::idle()
        };
        for _ in 0..3 {
            let powers = compute_actuator_powers(&input);
            assert_eq!(powers.left_intake, 1.0, "in should win over out");
            assert_eq!(powers.right_intake, 0.0, "right intake is independent");
        }
    }

    #[test]
    fn test_foundation_pair_moves_together() {
        let raise = OperatorInput {
            foundation_raise: true,
            ..OperatorInput::idle()
        };
        let powers = compute_actuator_powers(&raise);
        assert_eq!(powers.left_foundation, -1.0);
        assert_eq!(powers.right_foundation, -1.0);

        let both = OperatorInput {
            foundation_raise: true,
            foundation_lower: true,
            ..OperatorInput::idle()
        };
        let powers = compute_actuator_powers(&both);
        assert_eq!(powers.left_foundation, 1.0, "lower should win over raise");
    }

    #[test]
    fn test_release_after_hold_returns_to_zero() {
        let held = OperatorInput {
            roll_right: true,
            ..OperatorInput::idle()
        };
        assert_eq!(compute_actuator_powers(&held).roll, -1.0);
        assert_eq!(compute_actuator_powers(&OperatorInput::idle()).roll, 0.0);
    }

    proptest! {
        #[test]
        fn prop_pair_resolution(first in any::<bool>(), second in any::<bool>()) {
            let p = resolve_pair(first, second);
            match (first, second) {
                (false, false) => prop_assert_eq!(p, 0.0),
                (true, _) => prop_assert_eq!(p, 1.0),
                (false, true) => prop_assert_eq!(p, -1.0),
            }
        }
    }
}
