// In-memory actuator registry
//
// Stands in for the hardware map when no robot is attached. Encoder positions
// are integrated from commanded power on every `step()`, and position mode
// seeks the target. Physical travel additionally goes through the direction
// polarity and the way each device is mounted, so a wrong polarity entry
// shows up as a wheel turning the wrong way. Faults can be injected to
// exercise the error paths.

use std::collections::HashMap;

use tracing::debug;

use super::registry::{
    ActuatorId, ActuatorKind, ActuatorRegistry, Direction, HardwareError, Result, RunMode,
    ZeroPowerBehavior,
};

/// Encoder counts travelled per step at full power
pub const COUNTS_PER_STEP: f64 = 10.0;

/// Devices mounted mirrored on the chassis: positive shaft rotation moves
/// them the opposite way to their counterpart on the other side
pub const MIRRORED_MOUNTS: [ActuatorId; 6] = [
    ActuatorId::RightFront,
    ActuatorId::RightBack,
    ActuatorId::LeftIntake,
    ActuatorId::LiftArm,
    ActuatorId::LeftFoundation,
    ActuatorId::Pitch,
];

#[derive(Debug, Clone)]
struct SimActuator {
    kind: ActuatorKind,
    direction: Direction,
    mounting: Direction,
    zero_power: ZeroPowerBehavior,
    modes: Vec<RunMode>,
    power: f32,
    target: i32,
    position: f64,
    travel: f64,
    position_readable: bool,
}

impl SimActuator {
    fn new(kind: ActuatorKind, mounting: Direction) -> Self {
        Self {
            kind,
            direction: Direction::Forward,
            mounting,
            zero_power: ZeroPowerBehavior::Float,
            modes: Vec::new(),
            power: 0.0,
            target: 0,
            position: 0.0,
            travel: 0.0,
            position_readable: true,
        }
    }

    fn mode(&self) -> RunMode {
        self.modes
            .last()
            .copied()
            .unwrap_or(RunMode::RunWithoutEncoder)
    }
}

/// Simulated hardware map
#[derive(Debug, Clone)]
pub struct SimulatedRegistry {
    actuators: HashMap<ActuatorId, SimActuator>,
}

impl Default for SimulatedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRegistry {
    /// A registry with every actuator of the robot wired up
    pub fn new() -> Self {
        Self::with_actuators(&ActuatorId::ALL)
    }

    /// A registry containing only the given actuators
    pub fn with_actuators(ids: &[ActuatorId]) -> Self {
        let actuators = ids
            .iter()
            .map(|&id| {
                let mounting = if MIRRORED_MOUNTS.contains(&id) {
                    Direction::Reverse
                } else {
                    Direction::Forward
                };
                (id, SimActuator::new(id.kind(), mounting))
            })
            .collect();
        Self { actuators }
    }

    /// Override how a device is mounted, e.g. to model a rewired motor
    pub fn set_mounting(&mut self, id: ActuatorId, mounting: Direction) {
        if let Some(act) = self.actuators.get_mut(&id) {
            act.mounting = mounting;
        }
    }

    /// Physical distance moved, in counts, after polarity and mounting
    pub fn travel(&self, id: ActuatorId) -> Option<f64> {
        self.actuators.get(&id).map(|a| a.travel)
    }

    /// Unplug an actuator
    pub fn remove(&mut self, id: ActuatorId) {
        self.actuators.remove(&id);
    }

    /// Make encoder reads for `id` fail (or succeed again)
    pub fn set_position_readable(&mut self, id: ActuatorId, readable: bool) {
        if let Some(act) = self.actuators.get_mut(&id) {
            act.position_readable = readable;
        }
    }

    /// Force the encoder to a value, e.g. to model a drifted arm
    pub fn set_position(&mut self, id: ActuatorId, position: i32) {
        if let Some(act) = self.actuators.get_mut(&id) {
            act.position = position as f64;
        }
    }

    pub fn direction(&self, id: ActuatorId) -> Option<Direction> {
        self.actuators.get(&id).map(|a| a.direction)
    }

    pub fn run_mode(&self, id: ActuatorId) -> Option<RunMode> {
        self.actuators
            .get(&id)
            .filter(|a| a.kind == ActuatorKind::Motor)
            .map(SimActuator::mode)
    }

    /// Every run mode ever set on `id`, oldest first
    pub fn mode_history(&self, id: ActuatorId) -> &[RunMode] {
        self.actuators
            .get(&id)
            .map(|a| a.modes.as_slice())
            .unwrap_or(&[])
    }

    pub fn zero_power_behavior(&self, id: ActuatorId) -> Option<ZeroPowerBehavior> {
        self.actuators.get(&id).map(|a| a.zero_power)
    }

    pub fn target_position(&self, id: ActuatorId) -> Option<i32> {
        self.actuators.get(&id).map(|a| a.target)
    }

    /// Advance the simulation by one control period
    pub fn step(&mut self) {
        for act in self.actuators.values_mut() {
            let reach = f64::from(act.power.abs()) * COUNTS_PER_STEP;
            // Shaft rotation in the commanded frame; the encoder follows it
            let delta = match (act.kind, act.mode()) {
                (ActuatorKind::Motor, RunMode::StopAndResetEncoder) => {
                    act.position = 0.0;
                    0.0
                }
                (ActuatorKind::Motor, RunMode::RunToPosition) => {
                    (f64::from(act.target) - act.position).clamp(-reach, reach)
                }
                _ => f64::from(act.power) * COUNTS_PER_STEP,
            };
            if act.kind == ActuatorKind::Motor {
                act.position += delta;
            }
            act.travel +=
                delta * f64::from(act.direction.sign()) * f64::from(act.mounting.sign());
        }
    }

    fn get(&self, id: ActuatorId) -> Result<&SimActuator> {
        self.actuators
            .get(&id)
            .ok_or(HardwareError::MissingActuator { id })
    }

    fn get_mut(&mut self, id: ActuatorId) -> Result<&mut SimActuator> {
        self.actuators
            .get_mut(&id)
            .ok_or(HardwareError::MissingActuator { id })
    }

    fn motor_mut(&mut self, id: ActuatorId, operation: &'static str) -> Result<&mut SimActuator> {
        let act = self.get_mut(id)?;
        if act.kind != ActuatorKind::Motor {
            return Err(HardwareError::Unsupported { id, operation });
        }
        Ok(act)
    }
}

impl ActuatorRegistry for SimulatedRegistry {
    fn contains(&self, id: ActuatorId) -> bool {
        self.actuators.contains_key(&id)
    }

    fn set_direction(&mut self, id: ActuatorId, direction: Direction) -> Result<()> {
        debug!("{} direction -> {:?}", id, direction);
        self.get_mut(id)?.direction = direction;
        Ok(())
    }

    fn set_run_mode(&mut self, id: ActuatorId, mode: RunMode) -> Result<()> {
        let act = self.motor_mut(id, "run modes")?;
        if mode == RunMode::StopAndResetEncoder {
            act.position = 0.0;
            act.power = 0.0;
        }
        act.modes.push(mode);
        Ok(())
    }

    fn set_zero_power_behavior(
        &mut self,
        id: ActuatorId,
        behavior: ZeroPowerBehavior,
    ) -> Result<()> {
        self.motor_mut(id, "zero power behavior")?.zero_power = behavior;
        Ok(())
    }

    fn set_power(&mut self, id: ActuatorId, power: f32) -> Result<()> {
        self.get_mut(id)?.power = power.clamp(-1.0, 1.0);
        Ok(())
    }

    fn set_target_position(&mut self, id: ActuatorId, position: i32) -> Result<()> {
        self.motor_mut(id, "target position")?.target = position;
        Ok(())
    }

    fn current_position(&self, id: ActuatorId) -> Result<i32> {
        let act = self.get(id)?;
        if act.kind != ActuatorKind::Motor {
            return Err(HardwareError::Unsupported {
                id,
                operation: "position readback",
            });
        }
        if !act.position_readable {
            return Err(HardwareError::PositionUnavailable { id });
        }
        Ok(act.position.round() as i32)
    }

    fn power(&self, id: ActuatorId) -> Result<f32> {
        Ok(self.get(id)?.power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_actuator_is_reported() {
        let mut reg = SimulatedRegistry::new();
        reg.remove(ActuatorId::LiftArm);
        assert!(!reg.contains(ActuatorId::LiftArm));
        assert_eq!(
            reg.set_power(ActuatorId::LiftArm, 0.5),
            Err(HardwareError::MissingActuator {
                id: ActuatorId::LiftArm
            })
        );
    }

    #[test]
    fn test_servo_rejects_run_mode() {
        let mut reg = SimulatedRegistry::new();
        let err = reg
            .set_run_mode(ActuatorId::Grip, RunMode::RunWithoutEncoder)
            .unwrap_err();
        assert!(matches!(err, HardwareError::Unsupported { .. }));
    }

    #[test]
    fn test_open_loop_integrates_power() {
        let mut reg = SimulatedRegistry::new();
        reg.set_run_mode(ActuatorId::LeftFront, RunMode::RunWithoutEncoder)
            .unwrap();
        reg.set_power(ActuatorId::LeftFront, 0.5).unwrap();
        reg.step();
        reg.step();
        assert_eq!(reg.current_position(ActuatorId::LeftFront), Ok(10));
    }

    #[test]
    fn test_run_to_position_stops_at_target() {
        let mut reg = SimulatedRegistry::new();
        reg.set_target_position(ActuatorId::LiftArm, 25).unwrap();
        reg.set_run_mode(ActuatorId::LiftArm, RunMode::RunToPosition)
            .unwrap();
        reg.set_power(ActuatorId::LiftArm, 1.0).unwrap();
        for _ in 0..10 {
            reg.step();
        }
        assert_eq!(reg.current_position(ActuatorId::LiftArm), Ok(25));
    }

    #[test]
    fn test_direction_flips_physical_travel() {
        let mut reg = SimulatedRegistry::new();
        reg.set_power(ActuatorId::LeftFront, 1.0).unwrap();
        reg.set_power(ActuatorId::RightFront, 1.0).unwrap();
        reg.step();
        // right side is mirrored, so equal power drives it backwards
        assert_eq!(reg.travel(ActuatorId::LeftFront), Some(10.0));
        assert_eq!(reg.travel(ActuatorId::RightFront), Some(-10.0));

        reg.set_direction(ActuatorId::RightFront, Direction::Reverse)
            .unwrap();
        reg.step();
        assert_eq!(reg.travel(ActuatorId::RightFront), Some(0.0));
        // the encoder reads in the commanded frame either way
        assert_eq!(reg.current_position(ActuatorId::RightFront), Ok(20));
    }

    #[test]
    fn test_servo_travel_follows_polarity() {
        let mut reg = SimulatedRegistry::new();
        reg.set_mounting(ActuatorId::Grip, Direction::Reverse);
        reg.set_direction(ActuatorId::Grip, Direction::Reverse)
            .unwrap();
        reg.set_power(ActuatorId::Grip, 0.5).unwrap();
        reg.step();
        assert_eq!(reg.travel(ActuatorId::Grip), Some(5.0));
    }

    #[test]
    fn test_reset_zeroes_encoder() {
        let mut reg = SimulatedRegistry::new();
        reg.set_position(ActuatorId::RightBack, 400);
        reg.set_run_mode(ActuatorId::RightBack, RunMode::StopAndResetEncoder)
            .unwrap();
        assert_eq!(reg.current_position(ActuatorId::RightBack), Ok(0));
    }

    #[test]
    fn test_unreadable_position() {
        let mut reg = SimulatedRegistry::new();
        reg.set_position_readable(ActuatorId::LiftArm, false);
        assert_eq!(
            reg.current_position(ActuatorId::LiftArm),
            Err(HardwareError::PositionUnavailable {
                id: ActuatorId::LiftArm
            })
        );
    }
}
