//! # Qtruck Link
//!
//! Drive a Qtruck robot from the keyboard over Bluetooth serial, or stand in
//! for the robot on the bench.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (defaults when the file is missing)
//!    - Set up logging, optionally with a daily rolling log file
//!    - Open the serial device
//!
//! 2. **Session**
//!    - `controller`: prompt the robot, then answer every sensor frame with
//!      a command built from the keyboard state
//!    - `robot-sim`: answer every command frame with simulated sensors
//!
//! 3. **Shutdown**
//!    - Ctrl+C, Esc, link loss or disconnect end the session
//!    - The controller keeps reading briefly so late replies are counted
//!    - A JSON session report is logged
//!
//! # Examples
//!
//! ```bash
//! sudo rfcomm bind 0 <robot-address>
//! qtruck-link --config config/qtruck.toml controller
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use qtruck_link::config::{Config, LoggingConfig};
use qtruck_link::controller::keyboard::{KeyboardDecider, KeyboardDevice};
use qtruck_link::controller::ControllerEndpoint;
use qtruck_link::robot::sim::{SimLights, SimMotors, SimServos, SimSensors};
use qtruck_link::robot::RobotEndpoint;
use qtruck_link::serial::LinkSerial;
use qtruck_link::session::{run_controller, run_robot};

/// Default configuration file location
const DEFAULT_CONFIG_PATH: &str = "config/qtruck.toml";

#[derive(Debug, Parser)]
#[command(author, version, about = "Bluetooth packet link for the Qtruck robot", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drive the robot from the keyboard
    Controller,
    /// Play the robot's side of the link with simulated hardware
    RobotSim,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let _guard = init_logging(&config.logging)?;

    info!("Qtruck Link v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut serial = LinkSerial::open(&config.serial.port, config.serial.baud_rate)?;
    info!("Robot link open at: {}", serial.device_path());

    let report = match cli.command {
        Command::Controller => {
            let keyboard = KeyboardDevice::open().context("keyboard is required in controller mode")?;
            info!("Keyboard: {}", keyboard.device_path());
            let decider = KeyboardDecider::with_events(keyboard.spawn_reader());

            let mut endpoint = ControllerEndpoint::new(decider, config.link.timeout());
            info!("Press Esc or Ctrl+C to exit");
            run_controller(
                serial.transport(),
                &mut endpoint,
                config.link.watchdog_period(),
                ctrl_c(),
            )
            .await
        }
        Command::RobotSim => {
            let mut robot = RobotEndpoint::new(
                SimMotors::default(),
                SimServos,
                SimLights::default(),
                SimSensors::default(),
                config.battery.clone(),
            );
            robot.power_up();
            info!("Waiting for commands, press Ctrl+C to exit");
            run_robot(
                serial.transport(),
                &mut robot,
                config.link.timeout(),
                config.link.watchdog_period(),
                ctrl_c(),
            )
            .await
        }
    };

    info!("Session report: {}", report.to_json());
    Ok(())
}

/// Load the configuration file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eprintln!("config {} not found, using defaults", path.display());
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("loading {}", path.display()))
}

/// Console logging filtered by `RUST_LOG` (default `info`), plus a daily
/// rolling file when a log directory is configured.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, &config.file_prefix));

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            Ok(None)
        }
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::parse_from(["qtruck-link", "controller"]);
        assert!(matches!(cli.command, Command::Controller));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));

        let cli = Cli::parse_from(["qtruck-link", "--config", "bench.toml", "robot-sim"]);
        assert!(matches!(cli.command, Command::RobotSim));
        assert_eq!(cli.config, PathBuf::from("bench.toml"));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/qtruck.toml")).unwrap();
        assert_eq!(config.link.timeout_ms, 2000);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[link]\ntimeout_ms = 5").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
