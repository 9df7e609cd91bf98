//! The light controller: automatic switching and manual overrides.
//!
//! Automatic control follows the smoothed light level: lights go on when it
//! is bright above the threshold and off when it drops below. After every
//! automatic switch a cooldown suppresses further switching for a number of
//! ticks. Switching the lights off by hand disarms the automatic control
//! until it has stayed dark for `Attempt_Rearm` ticks in a row.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::{
    ambient_light::SampleWindow,
    arming::Arming,
    relay::Relay,
    sensor::SampleSource,
    settings::{Settings, SettingsError, SettingsStore},
};

/// Controller shared between the monitor loop and the HTTP handlers.
pub type SharedController = Arc<Mutex<Controller>>;

/// Fields accepted by [`Controller::update`]; absent fields are left alone.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SettingsUpdate {
    #[serde(rename = "Lights")]
    pub lights: Option<bool>,
    #[serde(rename = "Armed")]
    pub armed: Option<bool>,
    #[serde(rename = "Light_Sensitivity")]
    pub light_sensitivity: Option<u16>,
}

/// Snapshot returned by the status query.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    #[serde(rename = "Lights")]
    pub lights: bool,
    /// Sample window, oldest first
    #[serde(rename = "Sensor_Values")]
    pub sensor_values: Vec<u16>,
    /// Remaining rearm ticks, `None` if no countdown is running
    #[serde(rename = "Current_Rearm_Timer")]
    pub rearm_timer: Option<u32>,
    #[serde(flatten)]
    pub settings: Settings,
}

pub struct Controller {
    settings: Settings,
    store: SettingsStore,
    relay: Relay,
    window: SampleWindow,
    arming: Arming,
    cooldown: u32,
}

impl Controller {
    /// Create a controller with the lights off and automatic control armed.
    pub fn new(settings: Settings, store: SettingsStore, relay: Relay) -> Self {
        let window = SampleWindow::new(settings.sense_count.into());
        Self {
            settings,
            store,
            relay,
            window,
            arming: Arming::default(),
            cooldown: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn lights(&self) -> bool {
        self.relay.is_on()
    }

    pub fn arming(&self) -> Arming {
        self.arming
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Evaluate one new sample.
    pub fn tick(&mut self, sample: u16) {
        self.window.push(sample);
        let light = self.window.brightness(self.settings.light_sensitivity);
        if self.cooldown > 0 {
            self.cooldown -= 1;
        }

        if light.is_dark() {
            if self.relay.is_on() && self.cooldown == 0 && self.arming.is_armed() {
                info!(level = light.level, "Getting dark, switching lights off");
                self.relay.turn_off();
                self.cooldown = self.settings.cooldown;
            } else if self.arming.dark_tick() {
                info!("Dark for the whole rearm period, automatic control armed again");
            }
        } else if light.is_bright() {
            if !self.relay.is_on()
                && self.cooldown == 0
                && self.arming.countdown().is_none()
                && self.arming.is_armed()
            {
                info!(level = light.level, "Getting bright, switching lights on");
                self.relay.turn_on();
                self.cooldown = self.settings.cooldown;
            } else {
                self.arming.bright_tick(self.settings.attempt_rearm);
            }
        }
    }

    /// Switch the lights on, regardless of arming and cooldown.
    pub fn force_on(&mut self) -> bool {
        info!("Lights switched on manually");
        self.relay.turn_on();
        self.lights()
    }

    /// Switch the lights off and keep automatic control away until it has
    /// been dark for the full rearm period.
    pub fn force_off(&mut self) -> bool {
        info!("Lights switched off manually");
        self.relay.turn_off();
        self.arming.disarm_for(self.settings.attempt_rearm);
        self.lights()
    }

    pub fn set_armed(&mut self, armed: bool) {
        self.apply_armed(armed);
        self.persist();
    }

    pub fn set_sensitivity(&mut self, value: u16) {
        self.settings.light_sensitivity = value;
        self.persist();
    }

    /// Update a single setting by name, see [`Settings::set`].
    pub fn set_parameter(&mut self, key: &str, value: &str) -> Result<Settings, SettingsError> {
        let mut settings = self.settings.clone();
        settings.set(key, value)?;
        match key {
            "Armed" => self.apply_armed(settings.armed),
            "Sense_Count" => self.window.set_capacity(settings.sense_count.into()),
            _ => {}
        }
        debug!("Setting {} changed to {:?}", key, value);
        self.settings = settings;
        self.persist();
        Ok(self.settings.clone())
    }

    /// Apply a partial update and persist the result.
    pub fn update(&mut self, update: SettingsUpdate) -> Settings {
        match update.lights {
            Some(true) => {
                self.force_on();
            }
            Some(false) => {
                self.force_off();
            }
            None => {}
        }
        if let Some(armed) = update.armed {
            self.apply_armed(armed);
        }
        if let Some(value) = update.light_sensitivity {
            self.settings.light_sensitivity = value;
        }
        self.persist();
        self.settings.clone()
    }

    pub fn status(&self) -> Status {
        let mut settings = self.settings.clone();
        settings.armed = self.arming.is_armed();
        Status {
            lights: self.lights(),
            sensor_values: self.window.samples(),
            rearm_timer: self.arming.countdown(),
            settings,
        }
    }

    /// Only the armed flag changes, a running rearm countdown keeps going.
    fn apply_armed(&mut self, armed: bool) {
        info!(armed, "Automatic control {}", if armed { "armed" } else { "disarmed" });
        self.arming.set_armed(armed);
        self.settings.armed = armed;
    }

    fn persist(&self) {
        self.store.persist(&self.settings);
    }
}

/// Shortest accepted evaluation period.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Feed the latest sensor reading into the controller once per `period`.
///
/// Returns when the sample source is closed, leaving the lights as they are.
pub async fn monitor<S: SampleSource>(controller: SharedController, source: S, period: Duration) {
    let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if source.is_closed() {
            error!("Light sensor stopped delivering samples, automatic control disabled");
            return;
        }
        match source.latest() {
            Some(sample) => controller.lock().await.tick(sample),
            None => debug!("No sensor reading yet"),
        }
    }
}
