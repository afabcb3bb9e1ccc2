// Mecanum inverse kinematics for the 4-wheel base
// Converts an operator drive vector (forward, strafe, rotate) to per-wheel power.

use serde::{Deserialize, Serialize};

/// Largest magnitude any wheel is ever commanded
const MAX_POWER: f32 = 1.0;

/// Per-wheel power commands in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelPowers {
    pub left_front: f32,
    pub right_front: f32,
    pub left_back: f32,
    pub right_back: f32,
}

impl WheelPowers {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns powers as array [left_front, right_front, left_back, right_back]
    pub fn as_array(&self) -> [f32; 4] {
        [
            self.left_front,
            self.right_front,
            self.left_back,
            self.right_back,
        ]
    }
}

/// How much each drive axis contributes to one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelSigns {
    pub forward: i8,
    pub strafe: i8,
    pub rotate: i8,
}

impl WheelSigns {
    pub const fn new(forward: i8, strafe: i8, rotate: i8) -> Self {
        Self {
            forward,
            strafe,
            rotate,
        }
    }

    fn apply(&self, forward: f32, strafe: f32, rotate: f32) -> f32 {
        f32::from(self.forward) * forward
            + f32::from(self.strafe) * strafe
            + f32::from(self.rotate) * rotate
    }

    fn signs(&self) -> [i8; 3] {
        [self.forward, self.strafe, self.rotate]
    }
}

/// Sign pattern of every wheel
///
/// The default is the standard roller layout (rollers forming an X seen from
/// above): positive strafe moves right, positive rotate turns clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WheelMixing {
    pub left_front: WheelSigns,
    pub right_front: WheelSigns,
    pub left_back: WheelSigns,
    pub right_back: WheelSigns,
}

impl Default for WheelMixing {
    fn default() -> Self {
        Self {
            left_front: WheelSigns::new(1, 1, 1),
            right_front: WheelSigns::new(1, -1, -1),
            left_back: WheelSigns::new(1, -1, 1),
            right_back: WheelSigns::new(1, 1, -1),
        }
    }
}

impl WheelMixing {
    /// First sign outside {-1, 0, 1}, if any
    pub fn invalid_sign(&self) -> Option<i8> {
        [
            self.left_front,
            self.right_front,
            self.left_back,
            self.right_back,
        ]
        .iter()
        .flat_map(WheelSigns::signs)
        .find(|s| !(-1..=1).contains(s))
    }
}

/// Clamp an operator axis to [-1, 1]; NaN reads as released
pub fn sanitize_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-MAX_POWER, MAX_POWER)
    }
}

/// Convert an operator drive vector to wheel powers with the default mixing
///
/// # Arguments
/// * `forward` - Forward command in [-1, 1] (positive = forward)
/// * `strafe` - Lateral command in [-1, 1] (positive = right)
/// * `rotate` - Rotation command in [-1, 1] (positive = clockwise)
pub fn compute_wheel_powers(forward: f32, strafe: f32, rotate: f32) -> WheelPowers {
    compute_wheel_powers_with_mixing(forward, strafe, rotate, &WheelMixing::default())
}

/// Convert an operator drive vector to wheel powers with a calibrated mixing
///
/// Each wheel is clamped to [-1, 1] on its own. The vector is not
/// renormalized, so a saturated command can bend the resulting motion.
pub fn compute_wheel_powers_with_mixing(
    forward: f32,
    strafe: f32,
    rotate: f32,
    mixing: &WheelMixing,
) -> WheelPowers {
    let (f, s, r) = (
        sanitize_axis(forward),
        sanitize_axis(strafe),
        sanitize_axis(rotate),
    );
    let wheel = |signs: &WheelSigns| signs.apply(f, s, r).clamp(-MAX_POWER, MAX_POWER);

    WheelPowers {
        left_front: wheel(&mixing.left_front),
        right_front: wheel(&mixing.right_front),
        left_back: wheel(&mixing.left_back),
        right_back: wheel(&mixing.right_back),
    }
}
