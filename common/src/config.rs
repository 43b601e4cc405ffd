use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BIND_HOST: &str = "WATCHDOG_BIND_HOST";
pub const ENV_SERIAL_PATH: &str = "WATCHDOG_SERIAL_PATH";
pub const ENV_SERIAL_BAUD: &str = "WATCHDOG_SERIAL_BAUD";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "WATCHDOG_REQUEST_TIMEOUT_MS";
pub const ENV_WRITE_TIMEOUT_MS: &str = "WATCHDOG_WRITE_TIMEOUT_MS";
pub const ENV_SERIAL_RETRY_MS: &str = "WATCHDOG_SERIAL_RETRY_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expected exactly one argument (the listening port), got {0}")]
    WrongArity(usize),
    #[error("invalid port number {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub port: u16,
    pub bind_host: String,
    pub serial_path: String,
    pub baud_rate: u32,
    pub request_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub serial_retry_delay_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: 3002,
            bind_host: "0.0.0.0".to_string(),
            serial_path: "/dev/cu.usbmodem1451".to_string(),
            baud_rate: 9600,
            request_timeout_ms: 5_000,
            write_timeout_ms: 5_000,
            serial_retry_delay_ms: 2_000,
        }
    }
}

impl BridgeConfig {
    /// Builds the config from the command line arguments, program name
    /// excluded. The only accepted argument is the listening port.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let [port] = args.as_slice() else {
            return Err(ConfigError::WrongArity(args.len()));
        };

        let port = match port.trim().parse::<u16>() {
            Ok(port) if port != 0 => port,
            _ => return Err(ConfigError::InvalidPort(port.clone())),
        };

        Ok(Self {
            port,
            ..Self::default()
        })
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_BIND_HOST).filter(|value| !value.trim().is_empty()) {
            self.bind_host = host;
        }
        if let Some(path) = lookup(ENV_SERIAL_PATH).filter(|value| !value.trim().is_empty()) {
            self.serial_path = path;
        }
        if let Some(baud) = lookup(ENV_SERIAL_BAUD).and_then(|value| value.parse::<u32>().ok()) {
            self.baud_rate = baud;
        }
        if let Some(ms) = lookup(ENV_REQUEST_TIMEOUT_MS).and_then(|value| value.parse::<u64>().ok()) {
            self.request_timeout_ms = ms;
        }
        if let Some(ms) = lookup(ENV_WRITE_TIMEOUT_MS).and_then(|value| value.parse::<u64>().ok()) {
            self.write_timeout_ms = ms;
        }
        if let Some(ms) = lookup(ENV_SERIAL_RETRY_MS).and_then(|value| value.parse::<u64>().ok()) {
            self.serial_retry_delay_ms = ms;
        }
    }

    pub fn sanitize(&mut self) {
        self.baud_rate = self.baud_rate.clamp(300, 4_000_000);
        self.request_timeout_ms = self.request_timeout_ms.clamp(100, 60_000);
        self.write_timeout_ms = self.write_timeout_ms.clamp(100, 60_000);
        self.serial_retry_delay_ms = self.serial_retry_delay_ms.clamp(10, 60_000);
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn serial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.serial_retry_delay_ms)
    }
}
