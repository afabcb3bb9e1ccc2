// Control loop with input watchdog
// Note: if the operator input source dies, the watchdog zeroes the drive and
// actuators so the robot does not keep executing the last snapshot

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, warn};

// local imports
use crate::config::{DriveCalibration, INPUT_TIMEOUT, loop_period};
use crate::control::arbitration::compute_actuator_powers;
use crate::control::lift::{LiftCommand, LiftController, LiftOutput};
use crate::messages::{ActuatorPowerSet, OperatorInput, RuntimeHealth, Telemetry};
use crate::motor::init::{RunPhase, initialize};
use crate::motor::kinematics::{WheelPowers, compute_wheel_powers_with_mixing};
use crate::motor::registry::{ActuatorId, ActuatorRegistry};
use crate::motor::sim::SimulatedRegistry;
use crate::teleop::{self, InputEvent, InputSource};

/// Everything commanded during one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub health: RuntimeHealth,
    pub wheels: WheelPowers,
    pub actuators: ActuatorPowerSet,
    pub lift: LiftOutput,
    /// Power writes the registry rejected this tick
    pub write_failures: usize,
}

pub struct Runtime {
    calibration: DriveCalibration,
    lift: LiftController,
    latest_input: Option<OperatorInput>,
    input_received_at: Instant,
    health: RuntimeHealth,
    ticks: u64,
}

impl Runtime {
    pub fn new(calibration: DriveCalibration) -> Self {
        Self {
            lift: LiftController::new(calibration.lift.clone()),
            calibration,
            latest_input: None,
            input_received_at: Instant::now(),
            health: RuntimeHealth::InputStale, // Start stale until first input
            ticks: 0,
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn lift(&self) -> &LiftController {
        &self.lift
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Record a fresh operator snapshot
    pub fn on_input(&mut self, input: OperatorInput, now: Instant) {
        debug!("Received input: {:?}", &input);
        self.latest_input = Some(input);
        self.input_received_at = now;
    }

    /// Input for this tick, after the watchdog
    fn current_input(&mut self, now: Instant) -> OperatorInput {
        let input_age = now.saturating_duration_since(self.input_received_at);

        match self.latest_input {
            Some(ref input) if input_age <= INPUT_TIMEOUT => {
                if self.health != RuntimeHealth::Ok {
                    info!("Operator input live");
                }
                self.health = RuntimeHealth::Ok;
                input.clone()
            }
            _ => {
                // Watchdog triggered - idle everything, lift holds its level
                if self.health != RuntimeHealth::InputStale {
                    warn!("Input stale ({:?} old), idling robot", input_age);
                }
                self.health = RuntimeHealth::InputStale;
                OperatorInput::idle()
            }
        }
    }

    /// Run one control tick and write every command to the registry
    pub fn tick(&mut self, registry: &mut dyn ActuatorRegistry, now: Instant) -> TickReport {
        self.ticks += 1;
        let input = self.current_input(now);

        let wheels = compute_wheel_powers_with_mixing(
            input.drive_forward,
            input.drive_strafe,
            input.drive_rotate,
            &self.calibration.wheel_mixing,
        );
        let actuators = compute_actuator_powers(&input);

        let mut write_failures = 0;
        let commands = ActuatorId::WHEELS
            .into_iter()
            .zip(wheels.as_array())
            .chain(actuators.iter());
        for (id, power) in commands {
            if let Err(e) = registry.set_power(id, power) {
                warn!("Failed to command {}: {}", id, e);
                write_failures += 1;
            }
        }

        let lift = self.lift.step(&input, registry);

        TickReport {
            tick: self.ticks,
            health: self.health,
            wheels,
            actuators,
            lift,
            write_failures,
        }
    }

    /// Diagnostic snapshot of a tick, read back from the registry
    ///
    /// Actuators that fail to report a power or an encoder position are
    /// left out rather than shown with the commanded value.
    pub fn telemetry(&self, report: &TickReport, registry: &dyn ActuatorRegistry) -> Telemetry {
        let powers = ActuatorId::ALL
            .into_iter()
            .filter_map(|id| registry.power(id).ok().map(|p| (id.name(), p)))
            .collect();
        let positions = ActuatorId::ALL
            .into_iter()
            .filter(|id| id.is_motor())
            .filter_map(|id| registry.current_position(id).ok().map(|p| (id.name(), p)))
            .collect();

        Telemetry {
            tick: report.tick,
            health: report.health,
            powers,
            lift_mode: report.lift.mode,
            lift_level: report.lift.level,
            lift_target: match report.lift.command {
                LiftCommand::Seek { target, .. } => Some(target),
                LiftCommand::Power(_) => None,
            },
            lift_degraded: self.lift.is_degraded(),
            positions,
        }
    }

    /// Command zero power everywhere
    pub fn stop(&mut self, registry: &mut dyn ActuatorRegistry) {
        info!("Stopping all actuators");
        for id in ActuatorId::ALL {
            if let Err(e) = registry.set_power(id, 0.0) {
                warn!("Failed to stop {}: {}", id, e); // Keep going on cleanup
            }
        }
    }
}

/// Host loop settings
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub phase: RunPhase,
    pub calibration: DriveCalibration,
    pub loop_hz: u64,
    pub source: InputSource,
    /// Print telemetry as JSON lines on stdout
    pub telemetry: bool,
    pub calibration_path: Option<PathBuf>,
}

type RunError = Box<dyn std::error::Error + Send + Sync>;

// Where the loop takes operator input from on each tick
enum Feed {
    Keyboard {
        rx: UnboundedReceiver<InputEvent>,
        handle: JoinHandle<()>,
    },
    // One line per tick, consumed by the loop itself
    Script(VecDeque<OperatorInput>),
}

/// Run the control loop against a fresh simulated registry
pub async fn run(options: RunOptions) -> Result<(), RunError> {
    let mut registry = SimulatedRegistry::new();
    run_on(options, &mut registry).await.map(|_| ())
}

/// Run the control loop against `registry` until the input ends
///
/// A script ends after its last line has been ticked. The keyboard ends on
/// quit, after the snapshot that arrived with it has been ticked.
pub async fn run_on(
    options: RunOptions,
    registry: &mut SimulatedRegistry,
) -> Result<Runtime, RunError> {
    let period = loop_period(options.loop_hz)?;
    initialize(options.phase, registry, &options.calibration)?;

    let mut feed = match &options.source {
        InputSource::Keyboard => {
            let (tx, rx) = mpsc::unbounded_channel();
            Feed::Keyboard {
                rx,
                handle: teleop::spawn_keyboard(tx),
            }
        }
        InputSource::Script(path) => Feed::Script(teleop::load_script(path).await?),
    };

    let mut runtime = Runtime::new(options.calibration);
    let mut tick = interval(period);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        options.loop_hz,
        INPUT_TIMEOUT.as_millis()
    );
    if let Some(path) = &options.calibration_path {
        info!("Calibration: {}", path.display());
    }

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        }

        // 1. Take this tick's input
        let now = Instant::now();
        let mut finished = false;
        match &mut feed {
            Feed::Script(lines) => match lines.pop_front() {
                Some(input) => runtime.on_input(input, now),
                None => {
                    info!("Script finished");
                    break;
                }
            },
            Feed::Keyboard { rx, .. } => loop {
                // Drain all pending snapshots (non-blocking), keep latest
                match rx.try_recv() {
                    Ok(InputEvent::Input(input)) => runtime.on_input(input, now),
                    Ok(InputEvent::Quit) => {
                        info!("Operator requested stop");
                        finished = true;
                        break;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("Input source closed");
                        finished = true;
                        break;
                    }
                }
            },
        }

        // 2. Compute and write commands (includes watchdog logic)
        let report = runtime.tick(registry, Instant::now());
        registry.step();

        // 3. Diagnostics
        let telemetry = runtime.telemetry(&report, &*registry);
        let telemetry_json = serde_json::to_string(&telemetry)?;
        if options.telemetry {
            println!("{}", telemetry_json);
        } else {
            debug!("{}", telemetry_json);
        }

        if finished {
            break;
        }
    }

    runtime.stop(registry);
    if let Feed::Keyboard { handle, .. } = feed {
        handle.abort();
    }
    Ok(runtime)
}
