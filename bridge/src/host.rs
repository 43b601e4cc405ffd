use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, sync::Mutex};
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

use watchdog_common::{BridgeConfig, Station};

use crate::{
    device::DeviceController,
    dispatch::Dispatcher,
    ingest::SerialIngestor,
    shutdown::{spawn_console_quit, spawn_ctrl_c, Shutdown},
};

/// Log and device flags share this one lock.
pub type SharedStation = Arc<Mutex<Station>>;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = BridgeConfig::from_args(std::env::args().skip(1))
        .context("usage: watchdog-bridge <port>")?;
    config.apply_env();
    config.sanitize();

    let serial = tokio_serial::new(&config.serial_path, config.baud_rate)
        .open_native_async()
        .with_context(|| {
            format!(
                "failed to open serial device {} at {} baud",
                config.serial_path, config.baud_rate
            )
        })?;
    let (serial_reader, serial_writer) = tokio::io::split(serial);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind bridge listener at {addr}"))?;

    let station: SharedStation = Arc::new(Mutex::new(Station::default()));
    let shutdown = Shutdown::new();
    spawn_ctrl_c(shutdown.clone());
    spawn_console_quit(shutdown.clone());

    let ingestor = SerialIngestor::new(
        serial_reader,
        station.clone(),
        config.serial_retry_delay(),
    );
    let ingest_task = tokio::spawn(ingestor.run(shutdown.subscribe()));

    let controller = DeviceController::new(serial_writer, station.clone());
    let dispatcher = Dispatcher::new(listener, station, controller)
        .with_timeouts(config.request_timeout(), config.write_timeout());

    let bound = dispatcher
        .local_addr()
        .context("bridge listener has no local address")?;
    info!(
        "bridge listening on {bound}, device {} at {} baud; type q to quit",
        config.serial_path, config.baud_rate
    );
    dispatcher.run(shutdown.subscribe()).await;

    ingest_task.await.context("serial ingestor task panicked")?;
    info!("bridge stopped");
    Ok(())
}
