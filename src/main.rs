use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mecanum_teleop_runtime::config::{DriveCalibration, LOOP_HZ, MAX_LOOP_HZ};
use mecanum_teleop_runtime::motor::RunPhase;
use mecanum_teleop_runtime::runtime::{self, RunOptions};
use mecanum_teleop_runtime::teleop::InputSource;

/// Run phase as named on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PhaseArg {
    Teleop,
    Autonomous,
}

impl From<PhaseArg> for RunPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Teleop => RunPhase::TeleopStart,
            PhaseArg::Autonomous => RunPhase::AutonomousStart,
        }
    }
}

/// Operator control loop for the mecanum robot (simulated hardware)
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Calibration JSON; built-in defaults when omitted
    #[arg(long)]
    calibration: Option<PathBuf>,

    /// Run phase to initialize for
    #[arg(long, value_enum, default_value = "teleop")]
    phase: PhaseArg,

    /// Replay operator input from a JSON-lines file instead of the keyboard
    #[arg(long)]
    script: Option<PathBuf>,

    /// Control loop frequency
    #[arg(long, default_value_t = LOOP_HZ, value_parser = clap::value_parser!(u64).range(1..=MAX_LOOP_HZ))]
    hz: u64,

    /// Print per-tick telemetry as JSON lines
    #[arg(long)]
    telemetry: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init(); // installs the subscriber globally

    let args = Args::parse();

    let calibration = match &args.calibration {
        Some(path) => match DriveCalibration::load(path) {
            Ok(cal) => cal,
            Err(e) => {
                eprintln!("Calibration error: {}", e);
                std::process::exit(1);
            }
        },
        None => DriveCalibration::default(),
    };

    let options = RunOptions {
        phase: args.phase.into(),
        calibration,
        loop_hz: args.hz,
        source: args
            .script
            .map_or(InputSource::Keyboard, InputSource::Script),
        telemetry: args.telemetry,
        calibration_path: args.calibration,
    };

    if let Err(e) = runtime::run(options).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
