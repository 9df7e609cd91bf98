//! The persisted settings document.

use std::{
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

/// All keys of the settings document, in document order.
pub const KEYS: [&str; 10] = [
    "Relay_Pin",
    "Relay_Mode",
    "Sensor_Pin",
    "Sense_Count",
    "Light_Sensitivity",
    "Cooldown",
    "Attempt_Rearm",
    "Armed",
    "SSID",
    "Password",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// GPIO pin driving the relay
    #[serde(rename = "Relay_Pin")]
    pub relay_pin: u8,

    /// Relay polarity, 0 = active high, 1 = active low
    #[serde(rename = "Relay_Mode")]
    pub relay_mode: u8,

    /// ADC channel of the light sensor (0 disables automatic control)
    #[serde(rename = "Sensor_Pin")]
    pub sensor_pin: u8,

    /// Number of samples averaged into the light level
    #[serde(rename = "Sense_Count")]
    pub sense_count: u16,

    /// Light level separating "dark" from "bright"
    #[serde(rename = "Light_Sensitivity")]
    pub light_sensitivity: u16,

    /// Ticks to wait after an automatic switch
    #[serde(rename = "Cooldown")]
    pub cooldown: u32,

    /// Ticks of uninterrupted darkness needed to re-arm after a manual off
    #[serde(rename = "Attempt_Rearm")]
    pub attempt_rearm: u32,

    /// Whether automatic control is enabled
    #[serde(rename = "Armed")]
    pub armed: bool,

    /// Wi-Fi network name
    #[serde(rename = "SSID")]
    pub ssid: String,

    /// Wi-Fi password
    #[serde(rename = "Password")]
    pub password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            relay_pin: 2,
            relay_mode: 0,
            sensor_pin: 36,
            sense_count: 10,
            light_sensitivity: 5000,
            cooldown: 5,
            attempt_rearm: 30,
            armed: true,
            ssid: "your_wifi".to_string(),
            password: "your_password".to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unknown setting {0:?}")]
    UnknownKey(String),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("value {value} for {key} out of range ({min}, {max})")]
    OutOfRange {
        key: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Accepted range of a numeric setting, `None` for non-numeric keys.
fn limits(key: &str) -> Option<(i64, i64)> {
    match key {
        "Relay_Pin" | "Sensor_Pin" => Some((0, 40)),
        "Relay_Mode" => Some((0, 1)),
        "Sense_Count" => Some((1, 100)),
        "Light_Sensitivity" => Some((0, 65535)),
        "Cooldown" => Some((0, 100)),
        "Attempt_Rearm" => Some((1, 60 * 60 * 6)),
        _ => None,
    }
}

fn check_range(key: &str, value: i64) -> Result<i64, SettingsError> {
    match limits(key) {
        Some((min, max)) if value < min || value > max => Err(SettingsError::OutOfRange {
            key: key.to_string(),
            value,
            min,
            max,
        }),
        _ => Ok(value),
    }
}

fn parse_int<T: TryFrom<i64>>(key: &str, value: &str) -> Result<T, SettingsError> {
    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    let parsed = check_range(key, parsed)?;
    T::try_from(parsed).map_err(|_| SettingsError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "number does not fit the setting".to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl Settings {
    /// Parse the settings file at the specified path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open settings file at {:?}", path))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read settings file to string")?;
        let settings: Self = toml::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn example() -> Self {
        Self::default()
    }

    /// Check every numeric setting against its accepted range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("Relay_Pin", self.relay_pin.into())?;
        check_range("Relay_Mode", self.relay_mode.into())?;
        check_range("Sensor_Pin", self.sensor_pin.into())?;
        check_range("Sense_Count", self.sense_count.into())?;
        check_range("Light_Sensitivity", self.light_sensitivity.into())?;
        check_range("Cooldown", self.cooldown.into())?;
        check_range("Attempt_Rearm", self.attempt_rearm.into())?;
        Ok(())
    }

    /// Update a single setting from its textual representation.
    ///
    /// The key must be one of [`KEYS`]. Numeric settings are parsed as
    /// integers and range-checked, `Armed` accepts `true`/`false`/`1`/`0`.
    /// Nothing is modified if an error is returned.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        match key {
            "Relay_Pin" => self.relay_pin = parse_int(key, value)?,
            "Relay_Mode" => self.relay_mode = parse_int(key, value)?,
            "Sensor_Pin" => self.sensor_pin = parse_int(key, value)?,
            "Sense_Count" => self.sense_count = parse_int(key, value)?,
            "Light_Sensitivity" => self.light_sensitivity = parse_int(key, value)?,
            "Cooldown" => self.cooldown = parse_int(key, value)?,
            "Attempt_Rearm" => self.attempt_rearm = parse_int(key, value)?,
            "Armed" => self.armed = parse_bool(key, value)?,
            "SSID" => self.ssid = value.to_string(),
            "Password" => self.password = value.to_string(),
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Location of the settings document on disk.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, falling back to the defaults if the document is
    /// missing or cannot be parsed.
    pub fn load(&self) -> Settings {
        match Settings::load(&self.path) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", self.path);
                settings
            }
            Err(e) => {
                warn!("Failed to load settings: {:#}, using defaults", e);
                Settings::default()
            }
        }
    }

    /// Overwrite the whole document with the given settings.
    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let contents = toml::to_string(settings).context("Failed to serialize settings")?;
        let mut file = File::create(&self.path)
            .context(format!("Failed to create settings file at {:?}", self.path))?;
        file.write_all(contents.as_bytes())
            .context("Failed to write settings file")?;
        Ok(())
    }

    /// Like [`save`](Self::save), but failures are only logged.
    pub fn persist(&self, settings: &Settings) {
        if let Err(e) = self.save(settings) {
            error!("Error saving settings: {:#}", e);
        }
    }
}
