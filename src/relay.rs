//! The relay switching the light fixture.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::{info, warn};

/// Output stage of the relay.
pub trait RelayDriver: Send {
    fn write(&mut self, energized: bool) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    ActiveHigh,
    ActiveLow,
}

impl From<u8> for RelayMode {
    fn from(mode: u8) -> Self {
        match mode {
            0 => Self::ActiveHigh,
            _ => Self::ActiveLow,
        }
    }
}

/// Stand-in driver that only logs, used when no GPIO is configured.
pub struct LogDriver {
    pin: u8,
}

impl LogDriver {
    pub fn new(pin: u8) -> Self {
        Self { pin }
    }
}

impl RelayDriver for LogDriver {
    fn write(&mut self, energized: bool) -> anyhow::Result<()> {
        info!(pin = self.pin, energized, "Relay write");
        Ok(())
    }
}

/// Relay on a sysfs GPIO line (`<root>/gpio<pin>/value`).
///
/// The line must already be exported and configured as an output.
pub struct SysfsGpio {
    value: PathBuf,
    mode: RelayMode,
}

impl SysfsGpio {
    pub fn new(root: &Path, pin: u8, mode: RelayMode) -> Self {
        Self {
            value: root.join(format!("gpio{}", pin)).join("value"),
            mode,
        }
    }
}

impl RelayDriver for SysfsGpio {
    fn write(&mut self, energized: bool) -> anyhow::Result<()> {
        let high = match self.mode {
            RelayMode::ActiveHigh => energized,
            RelayMode::ActiveLow => !energized,
        };
        fs::write(&self.value, if high { "1" } else { "0" })
            .context(format!("Failed to write GPIO value at {:?}", self.value))
    }
}

pub struct Relay {
    on: bool,
    driver: Box<dyn RelayDriver>,
}

impl Relay {
    /// Wrap a driver. The relay is switched off initially.
    pub fn new(driver: Box<dyn RelayDriver>) -> Self {
        let mut relay = Self { on: false, driver };
        relay.apply();
        relay
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn turn_on(&mut self) {
        self.set_state(true);
    }

    pub fn turn_off(&mut self) {
        self.set_state(false);
    }

    pub fn set_state(&mut self, on: bool) {
        self.on = on;
        self.apply();
    }

    fn apply(&mut self) {
        // The requested state stays authoritative even if the write fails
        if let Err(e) = self.driver.write(self.on) {
            warn!("Relay driver error: {:#}", e);
        }
    }
}
