// Loop timing and per-robot calibration
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::motor::kinematics::WheelMixing;
use crate::motor::registry::{ActuatorId, Direction};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Highest loop frequency the host accepts
pub const MAX_LOOP_HZ: u64 = 1000;

// Input timeout for watchdog
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(250);

/// Tick period for a loop frequency in `1..=MAX_LOOP_HZ`
pub fn loop_period(hz: u64) -> Result<Duration, ConfigError> {
    if !(1..=MAX_LOOP_HZ).contains(&hz) {
        return Err(ConfigError::Invalid(format!(
            "loop frequency {}Hz outside 1..={}Hz",
            hz, MAX_LOOP_HZ
        )));
    }
    Ok(Duration::from_nanos(1_000_000_000 / hz))
}

/// Errors raised while loading calibration data
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read calibration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse calibration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid calibration: {0}")]
    Invalid(String),
}

/// Lift arm travel limits and level table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiftCalibration {
    /// Lowest encoder position the arm may be commanded to
    pub min_position: i32,
    /// Highest encoder position the arm may be commanded to
    pub max_position: i32,
    /// Target position per level; index 0 is home
    pub level_positions: Vec<i32>,
    /// Manual axis magnitude at or below which the stick counts as released
    pub deadband: f32,
    /// Power used while seeking a level
    pub hold_power: f32,
}

impl Default for LiftCalibration {
    fn default() -> Self {
        Self {
            min_position: -15,
            max_position: 150,
            level_positions: vec![0, 25, 50, 75, 100, 125],
            deadband: 0.05,
            hold_power: 1.0,
        }
    }
}

impl LiftCalibration {
    pub fn min_level(&self) -> usize {
        0
    }

    pub fn max_level(&self) -> usize {
        self.level_positions.len().saturating_sub(1)
    }

    /// Target for `level`, never outside the travel limits
    pub fn target_for(&self, level: usize) -> i32 {
        let level = level.min(self.max_level());
        let raw = self.level_positions.get(level).copied().unwrap_or(0);
        raw.clamp(self.min_position, self.max_position)
    }
}

/// Static description of one robot variant
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriveCalibration {
    pub wheel_mixing: WheelMixing,
    /// Polarity applied at teleop start
    pub teleop_directions: BTreeMap<ActuatorId, Direction>,
    /// Polarity applied at autonomous start
    pub autonomous_directions: BTreeMap<ActuatorId, Direction>,
    /// Wheel diameter in inches, kept for distance conversion
    pub wheel_diameter_in: f64,
    pub lift: LiftCalibration,
}

impl Default for DriveCalibration {
    fn default() -> Self {
        let reversed = [
            ActuatorId::RightFront,
            ActuatorId::RightBack,
            ActuatorId::LeftIntake,
            ActuatorId::LiftArm,
            ActuatorId::LeftFoundation,
            ActuatorId::Pitch,
        ];
        let teleop_directions = ActuatorId::ALL
            .iter()
            .map(|&id| {
                let dir = if reversed.contains(&id) {
                    Direction::Reverse
                } else {
                    Direction::Forward
                };
                (id, dir)
            })
            .collect();

        let autonomous_directions =
            BTreeMap::from([(ActuatorId::LeftFoundation, Direction::Reverse)]);

        Self {
            wheel_mixing: WheelMixing::default(),
            teleop_directions,
            autonomous_directions,
            wheel_diameter_in: 3.54331,
            lift: LiftCalibration::default(),
        }
    }
}

impl DriveCalibration {
    /// Load and validate calibration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate calibration from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let calibration: Self = serde_json::from_str(text)?;
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let lift = &self.lift;
        if lift.level_positions.is_empty() {
            return Err(ConfigError::Invalid(
                "lift.levelPositions must have at least one entry".into(),
            ));
        }
        if lift.min_position > lift.max_position {
            return Err(ConfigError::Invalid(format!(
                "lift.minPosition ({}) is above lift.maxPosition ({})",
                lift.min_position, lift.max_position
            )));
        }
        if !(0.0..1.0).contains(&lift.deadband) {
            return Err(ConfigError::Invalid(format!(
                "lift.deadband must be in [0, 1), got {}",
                lift.deadband
            )));
        }
        if !(lift.hold_power > 0.0 && lift.hold_power <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "lift.holdPower must be in (0, 1], got {}",
                lift.hold_power
            )));
        }
        if let Some(bad) = self.wheel_mixing.invalid_sign() {
            return Err(ConfigError::Invalid(format!(
                "wheelMixing signs must be -1, 0 or 1, got {}",
                bad
            )));
        }
        if self.wheel_diameter_in <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "wheelDiameterIn must be positive, got {}",
                self.wheel_diameter_in
            )));
        }
        Ok(())
    }
}
