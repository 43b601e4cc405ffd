use serde::{Deserialize, Serialize};

use crate::protocol::COMMAND_OFFSET;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Fahrenheit => "F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    /// Converts a stored Celsius value into this display unit.
    pub fn convert(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

/// Request codes understood by the bridge, one per watch button action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleUnit,
    LatestReading,
    Stats,
    RequestMessage,
    ResetAlarm,
    ToggleStandby,
    TrippedStatus,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Self::ToggleUnit,
        Self::LatestReading,
        Self::Stats,
        Self::RequestMessage,
        Self::ResetAlarm,
        Self::ToggleStandby,
        Self::TrippedStatus,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'a' => Some(Self::ToggleUnit),
            b'b' => Some(Self::LatestReading),
            b'd' => Some(Self::Stats),
            b'm' => Some(Self::RequestMessage),
            b'r' => Some(Self::ResetAlarm),
            b's' => Some(Self::ToggleStandby),
            b't' => Some(Self::TrippedStatus),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::ToggleUnit => b'a',
            Self::LatestReading => b'b',
            Self::Stats => b'd',
            Self::RequestMessage => b'm',
            Self::ResetAlarm => b'r',
            Self::ToggleStandby => b's',
            Self::TrippedStatus => b't',
        }
    }

    /// Extracts the command from a raw request such as `GET /b HTTP/1.1`.
    pub fn from_request(request: &[u8]) -> Option<Self> {
        request
            .get(COMMAND_OFFSET)
            .copied()
            .and_then(Self::from_code)
    }
}

/// Single-byte control codes written to the sensor device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlByte {
    UnitToggle,
    StandbyToggle,
    AlarmReset,
    DisplayMessage,
}

impl ControlByte {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::UnitToggle => b'f',
            Self::StandbyToggle => b's',
            Self::AlarmReset => b'r',
            Self::DisplayMessage => b'm',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub name: String,
}

impl Reply {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_wire(&self) -> serde_json::Result<Vec<u8>> {
        let mut body = serde_json::to_vec(self)?;
        body.push(b'\n');
        Ok(body)
    }
}
