use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use light_relay::{
    history::{self, Recorder},
    sensor::SerialSensor,
    settings::{Settings, SettingsStore},
    SerialConfig, ServiceConfig,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about, version)]
struct Cli {
    /// Path to settings file
    #[arg(short, long, default_value = "settings.toml", global = true)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the controller and the HTTP server
    Run {
        /// HTTP listen address
        #[arg(long, default_value = "0.0.0.0:80")]
        listen: String,

        /// Serial port of the light sensor
        #[arg(long)]
        serial_port: Option<PathBuf>,

        /// Serial baud rate
        #[arg(long, default_value_t = 9600)]
        baudrate: u32,

        /// Sysfs GPIO directory, e.g. /sys/class/gpio
        #[arg(long)]
        gpio_root: Option<PathBuf>,

        /// Evaluation interval in milliseconds
        #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: u64,
    },

    /// Print an example settings file
    ExampleConfig,

    /// Record the light level to a CSV file
    Record {
        /// Serial port of the light sensor
        #[arg(long)]
        serial_port: PathBuf,

        /// Serial baud rate
        #[arg(long, default_value_t = 9600)]
        baudrate: u32,

        /// Minutes between measurements
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        minutes: u64,

        /// Output file
        #[arg(short, long, default_value = "records.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            listen,
            serial_port,
            baudrate,
            gpio_root,
            interval_ms,
        } => {
            let config = ServiceConfig {
                listen,
                settings_path: cli.settings,
                serial: serial_port.map(|port| SerialConfig { port, baudrate }),
                gpio_root,
                interval: Duration::from_millis(interval_ms),
            };
            light_relay::run(config).await
        }
        Command::ExampleConfig => {
            println!("{}", toml::to_string(&Settings::example())?);
            Ok(())
        }
        Command::Record {
            serial_port,
            baudrate,
            minutes,
            output,
        } => {
            let settings = SettingsStore::new(&cli.settings).load();
            let sensor = SerialSensor::open(&serial_port, baudrate, settings.sensor_pin)?;
            let recorder = Recorder::create(&output)?;
            info!("Recording light level every {} minutes to {:?}", minutes, output);
            history::record(sensor, recorder, Duration::from_secs(minutes * 60)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_must_be_positive() {
        assert!(Cli::try_parse_from(["light-relay", "run", "--interval-ms", "0"]).is_err());

        let cli = Cli::try_parse_from(["light-relay", "run", "--interval-ms", "1"]).unwrap();
        assert!(matches!(cli.command, Command::Run { interval_ms: 1, .. }));
    }

    #[test]
    fn test_record_minutes_must_be_positive() {
        let args = ["light-relay", "record", "--serial-port", "/dev/ttyUSB0", "--minutes", "0"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
