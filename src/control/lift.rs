// Lift arm level state machine
//
// The arm is either driven straight from the manual axis or held at one of a
// fixed set of levels. Level-up/down presses count on the rising edge only.
// Losing position feedback drops the controller to manual for the rest of the
// run phase instead of stopping the robot.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LiftCalibration;
use crate::messages::OperatorInput;
use crate::motor::kinematics::sanitize_axis;
use crate::motor::registry::{ActuatorId, ActuatorRegistry, HardwareError, RunMode};

const LIFT: ActuatorId = ActuatorId::LiftArm;

/// Lift control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiftMode {
    Manual,
    PositionHold,
}

/// Non-fatal: position control is gone, the operator keeps the manual axis
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Lift falling back to manual control: {cause}")]
pub struct DegradedControlWarning {
    #[source]
    pub cause: HardwareError,
}

/// What the lift motor should do this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiftCommand {
    /// Open-loop power
    Power(f32),
    /// Seek `target` at `power`
    Seek { target: i32, power: f32 },
}

/// Result of one controller step
#[derive(Debug, Clone, PartialEq)]
pub struct LiftOutput {
    pub mode: LiftMode,
    pub level: usize,
    pub command: LiftCommand,
    /// Set only on the tick the controller degrades
    pub warning: Option<DegradedControlWarning>,
}

pub struct LiftController {
    calibration: LiftCalibration,
    level: usize,
    mode: LiftMode,
    last_up: bool,
    last_down: bool,
    degraded: bool,
    applied_mode: Option<RunMode>,
}

impl LiftController {
    /// Start at the home level in position hold
    pub fn new(calibration: LiftCalibration) -> Self {
        Self {
            level: calibration.min_level(),
            calibration,
            mode: LiftMode::PositionHold,
            last_up: false,
            last_down: false,
            degraded: false,
            applied_mode: None,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn mode(&self) -> LiftMode {
        self.mode
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Encoder target of the current level
    pub fn target(&self) -> i32 {
        self.calibration.target_for(self.level)
    }

    /// Advance the state machine without touching hardware
    pub fn update(&mut self, input: &OperatorInput) -> LiftCommand {
        let axis = sanitize_axis(input.lift_manual_axis);
        let manual = axis.abs() > self.calibration.deadband;

        // Edges are tracked every tick so a button held through manual
        // driving does not fire when the stick is released.
        let up_edge = input.lift_level_up && !self.last_up;
        let down_edge = input.lift_level_down && !self.last_down;
        self.last_up = input.lift_level_up;
        self.last_down = input.lift_level_down;

        if self.degraded {
            self.mode = LiftMode::Manual;
            return LiftCommand::Power(if manual { axis } else { 0.0 });
        }

        if manual {
            self.mode = LiftMode::Manual;
            return LiftCommand::Power(axis);
        }

        self.mode = LiftMode::PositionHold;
        if up_edge && self.level < self.calibration.max_level() {
            self.level += 1;
            debug!("Lift level up -> {}", self.level);
        }
        if down_edge && self.level > self.calibration.min_level() {
            self.level -= 1;
            debug!("Lift level down -> {}", self.level);
        }

        LiftCommand::Seek {
            target: self.target(),
            power: self.calibration.hold_power,
        }
    }

    /// Advance the state machine and drive the lift motor
    pub fn step(&mut self, input: &OperatorInput, registry: &mut dyn ActuatorRegistry) -> LiftOutput {
        let command = self.update(input);

        let warning = match self.apply(command, registry) {
            Ok(()) => None,
            Err(cause) if self.degraded => {
                warn!("Lift write failed in manual fallback: {}", cause);
                None
            }
            Err(cause) => Some(self.degrade(cause, input, registry)),
        };

        LiftOutput {
            mode: self.mode,
            level: self.level,
            command: if warning.is_some() {
                self.fallback_command(input)
            } else {
                command
            },
            warning,
        }
    }

    fn apply(
        &mut self,
        command: LiftCommand,
        registry: &mut dyn ActuatorRegistry,
    ) -> Result<(), HardwareError> {
        match command {
            LiftCommand::Power(power) => {
                self.switch_mode(RunMode::RunWithoutEncoder, registry)?;
                registry.set_power(LIFT, power)
            }
            LiftCommand::Seek { target, power } => {
                // Holding a level needs live feedback
                let position = registry.current_position(LIFT)?;
                debug!("Lift at {} seeking {}", position, target);
                registry.set_target_position(LIFT, target)?;
                self.switch_mode(RunMode::RunToPosition, registry)?;
                registry.set_power(LIFT, power)
            }
        }
    }

    fn switch_mode(
        &mut self,
        mode: RunMode,
        registry: &mut dyn ActuatorRegistry,
    ) -> Result<(), HardwareError> {
        if self.applied_mode != Some(mode) {
            registry.set_run_mode(LIFT, mode)?;
            self.applied_mode = Some(mode);
        }
        Ok(())
    }

    fn fallback_command(&self, input: &OperatorInput) -> LiftCommand {
        let axis = sanitize_axis(input.lift_manual_axis);
        if axis.abs() > self.calibration.deadband {
            LiftCommand::Power(axis)
        } else {
            LiftCommand::Power(0.0)
        }
    }

    fn degrade(
        &mut self,
        cause: HardwareError,
        input: &OperatorInput,
        registry: &mut dyn ActuatorRegistry,
    ) -> DegradedControlWarning {
        let warning = DegradedControlWarning { cause };
        warn!("{}", warning);
        self.degraded = true;
        self.mode = LiftMode::Manual;

        if let LiftCommand::Power(power) = self.fallback_command(input) {
            let result = self
                .switch_mode(RunMode::RunWithoutEncoder, registry)
                .and_then(|()| registry.set_power(LIFT, power));
            match result {
                Ok(()) => info!("Lift continuing under manual control"),
                Err(e) => warn!("Lift unavailable: {}", e),
            }
        }
        warning
    }
}
