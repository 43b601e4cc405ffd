use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use watchdog_common::{classify_line, Event, LineFramer, MAX_SERIAL_LINE_BYTES};

use crate::{host::SharedStation, shutdown::ShutdownSignal};

/// Continuously reads the device stream into the shared station.
pub struct SerialIngestor<R> {
    reader: R,
    station: SharedStation,
    framer: LineFramer,
    retry_delay: Duration,
}

impl<R> SerialIngestor<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, station: SharedStation, retry_delay: Duration) -> Self {
        Self {
            reader,
            station,
            framer: LineFramer::new(),
            retry_delay,
        }
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        let mut buf = [0u8; MAX_SERIAL_LINE_BYTES];
        info!("serial ingestor started");

        while !shutdown.is_triggered() {
            let read = tokio::select! {
                _ = shutdown.triggered() => break,
                read = self.reader.read(&mut buf) => read,
            };

            match read {
                Ok(0) => {
                    self.mark_device_error("serial stream closed").await;
                }
                Ok(len) => {
                    let lines = self.framer.push(&buf[..len]);
                    self.commit(lines).await;
                    continue;
                }
                Err(err) => {
                    self.mark_device_error(&format!("serial read failed: {err}"))
                        .await;
                }
            }

            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }

        info!("serial ingestor stopped");
    }

    async fn commit(&self, lines: Vec<String>) {
        let mut station = self.station.lock().await;
        if station.set_device_error(false) {
            info!("serial device recovered");
        }

        for line in lines {
            let event = classify_line(&line);
            match event {
                Event::Tripped => info!("motion trip reported by device"),
                Event::Reading(value) => debug!("reading {value}"),
                Event::Malformed => debug!("dropping malformed serial line {line:?}"),
            }
            station.apply_event(event);
        }
    }

    async fn mark_device_error(&mut self, reason: &str) {
        self.framer.reset();
        if self.station.lock().await.set_device_error(true) {
            warn!("{reason}; reporting device error until the next successful read");
        }
    }
}
