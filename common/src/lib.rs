pub mod config;
pub mod framing;
pub mod log;
pub mod protocol;
pub mod state;
pub mod stats;
pub mod types;

pub use config::{BridgeConfig, ConfigError};
pub use framing::{classify_line, Event, LineFramer};
pub use log::{LogSnapshot, TemperatureLog, LOG_CAPACITY, SENTINEL};
pub use protocol::*;
pub use state::{DeviceState, ResendDebounce, Station};
pub use stats::Summary;
pub use types::{Command, ControlByte, Reply, TemperatureUnit};
