//! Arming state of the automatic control.
//!
//! Two independent parts: the `armed` flag and an optional rearm countdown
//! started by switching the lights off by hand. While the countdown runs,
//! automatic switch-on is suppressed; once it expires after uninterrupted
//! darkness, the control is armed again.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arming {
    armed: bool,
    /// Dark ticks left until re-armed, never zero
    rearm: Option<u32>,
}

impl Default for Arming {
    fn default() -> Self {
        Self {
            armed: true,
            rearm: None,
        }
    }
}

impl Arming {
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Remaining ticks of an active rearm countdown.
    pub fn countdown(&self) -> Option<u32> {
        self.rearm
    }

    /// Set the armed flag, leaving a running countdown alone.
    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Disarm and start a rearm countdown of the given number of ticks.
    pub fn disarm_for(&mut self, ticks: u32) {
        self.armed = false;
        self.rearm = Some(ticks.max(1));
    }

    /// Count down one dark tick. Returns `true` if this re-armed the control.
    pub fn dark_tick(&mut self) -> bool {
        let Some(remaining) = self.rearm else {
            return false;
        };
        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.armed = true;
            self.rearm = None;
            return true;
        }
        self.rearm = Some(remaining);
        false
    }

    /// Restart an active countdown from the full duration.
    pub fn bright_tick(&mut self, ticks: u32) {
        if let Some(remaining) = self.rearm.as_mut() {
            *remaining = ticks.max(1);
        }
    }
}
