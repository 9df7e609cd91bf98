//! Light-sensing relay controller.
//!
//! Samples an ambient light sensor, switches a relay-driven light fixture
//! and serves an HTTP interface to read and override its state.

pub mod ambient_light;
pub mod arming;
pub mod controller;
pub mod error;
pub mod history;
pub mod http;
pub mod relay;
pub mod sensor;
pub mod settings;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    controller::{monitor, Controller},
    relay::{LogDriver, Relay, RelayDriver, RelayMode, SysfsGpio},
    sensor::SerialSensor,
    settings::SettingsStore,
};

/// Serial port the light sensor is attached to.
#[derive(Clone, Debug)]
pub struct SerialConfig {
    pub port: PathBuf,
    pub baudrate: u32,
}

/// Service configuration.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Path to the settings document.
    pub settings_path: PathBuf,
    /// Light sensor, automatic control is disabled without one.
    pub serial: Option<SerialConfig>,
    /// Sysfs GPIO directory, relay writes are only logged without one.
    pub gpio_root: Option<PathBuf>,
    /// Evaluation interval.
    pub interval: Duration,
}

/// Start the monitor loop and the HTTP server. Blocks until shutdown.
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let store = SettingsStore::new(&config.settings_path);
    let settings = store.load();

    let driver: Box<dyn RelayDriver> = match &config.gpio_root {
        Some(root) => Box::new(SysfsGpio::new(
            root,
            settings.relay_pin,
            RelayMode::from(settings.relay_mode),
        )),
        None => {
            warn!("No GPIO configured, relay writes are only logged");
            Box::new(LogDriver::new(settings.relay_pin))
        }
    };
    let sensor_pin = settings.sensor_pin;
    let controller = Arc::new(Mutex::new(Controller::new(
        settings,
        store,
        Relay::new(driver),
    )));

    match &config.serial {
        Some(serial) if sensor_pin > 0 => {
            let sensor = SerialSensor::open(&serial.port, serial.baudrate, sensor_pin)?;
            tokio::spawn(monitor(controller.clone(), sensor, config.interval));
        }
        _ => warn!("No light sensor configured, automatic control disabled"),
    }

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .context(format!("Failed to listen on {}", config.listen))?;
    info!("Listening on {}", config.listen);
    axum::serve(listener, http::router(controller)).await?;

    Ok(())
}
