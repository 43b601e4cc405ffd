use crate::{
    framing::Event,
    log::TemperatureLog,
    protocol::{
        REPLY_DEVICE_ERROR, REPLY_NOT_TRIPPED, REPLY_NO_DATA, REPLY_STANDBY_DISENGAGED,
        REPLY_STANDBY_ENGAGED, REPLY_TRIPPED,
    },
    stats,
    types::{Reply, TemperatureUnit},
};

/// The watch app sends every toggle request three times per button press.
pub const RESENDS_PER_PRESS: u8 = 3;

/// Collapses the watch app's resends into one logical action: every
/// request is counted, only the last of each group fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendDebounce {
    pending: u8,
    period: u8,
}

impl Default for ResendDebounce {
    fn default() -> Self {
        Self::new(RESENDS_PER_PRESS)
    }
}

impl ResendDebounce {
    pub fn new(period: u8) -> Self {
        Self {
            pending: 0,
            period: period.max(1),
        }
    }

    /// Counts one request and returns whether the action should fire.
    pub fn register(&mut self) -> bool {
        self.pending = (self.pending + 1) % self.period;
        self.pending == 0
    }

    pub fn pending(&self) -> u8 {
        self.pending
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub unit: TemperatureUnit,
    pub standby_active: bool,
    pub tripped: bool,
    pub device_error: bool,
    pub unit_debounce: ResendDebounce,
    pub standby_debounce: ResendDebounce,
}

/// Everything the ingestor and the request handlers share. Kept behind a
/// single lock so log and flags always change together.
#[derive(Debug, Clone, Default)]
pub struct Station {
    log: TemperatureLog,
    device: DeviceState,
}

impl Station {
    pub fn log(&self) -> &TemperatureLog {
        &self.log
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn apply_event(&mut self, event: Event) {
        match event {
            Event::Tripped => self.device.tripped = true,
            Event::Reading(value) => self.log.append(value),
            Event::Malformed => {}
        }
    }

    /// Returns true when the flag changed.
    pub fn set_device_error(&mut self, device_error: bool) -> bool {
        let changed = self.device.device_error != device_error;
        self.device.device_error = device_error;
        changed
    }

    pub fn press_unit_toggle(&mut self) -> bool {
        let fire = self.device.unit_debounce.register();
        if fire {
            self.device.unit = self.device.unit.toggled();
        }
        fire
    }

    pub fn press_standby_toggle(&mut self) -> bool {
        let fire = self.device.standby_debounce.register();
        if fire {
            self.device.standby_active = !self.device.standby_active;
        }
        fire
    }

    pub fn reset_alarm(&mut self) {
        self.device.tripped = false;
    }

    pub fn latest_reply(&self) -> Reply {
        if self.device.device_error {
            return Reply::new(REPLY_DEVICE_ERROR);
        }

        match self.log.latest() {
            Some(value) => {
                let unit = self.device.unit;
                Reply::new(format!("{:.1} {}", unit.convert(value), unit.as_str()))
            }
            None => Reply::new(REPLY_NO_DATA),
        }
    }

    pub fn stats_reply(&self) -> Reply {
        if self.device.device_error {
            return Reply::new(REPLY_DEVICE_ERROR);
        }

        match stats::summary(&self.log.snapshot()) {
            Some(summary) => {
                let summary = summary.in_unit(self.device.unit);
                Reply::new(format!(
                    "H: {:.1} L: {:.1} AVG: {:.1}",
                    summary.max, summary.min, summary.average
                ))
            }
            None => Reply::new(REPLY_NO_DATA),
        }
    }

    pub fn standby_reply(&self) -> Reply {
        if self.device.standby_active {
            Reply::new(REPLY_STANDBY_ENGAGED)
        } else {
            Reply::new(REPLY_STANDBY_DISENGAGED)
        }
    }

    pub fn tripped_reply(&self) -> Reply {
        if self.device.tripped {
            Reply::new(REPLY_TRIPPED)
        } else {
            Reply::new(REPLY_NOT_TRIPPED)
        }
    }
}
