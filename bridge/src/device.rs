use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use watchdog_common::ControlByte;

use crate::host::SharedStation;

/// Sole writer to the sensor device. Every action that fires writes
/// exactly one control byte.
pub struct DeviceController<W> {
    writer: W,
    station: SharedStation,
}

impl<W> DeviceController<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, station: SharedStation) -> Self {
        Self { writer, station }
    }

    pub async fn toggle_unit(&mut self) -> bool {
        let fired = {
            let mut station = self.station.lock().await;
            let fired = station.press_unit_toggle();
            if fired {
                info!("display unit now {}", station.device().unit.as_str());
            }
            fired
        };

        if fired {
            self.emit(ControlByte::UnitToggle).await;
        }
        fired
    }

    pub async fn toggle_standby(&mut self) -> bool {
        let fired = {
            let mut station = self.station.lock().await;
            let fired = station.press_standby_toggle();
            if fired {
                info!("standby active: {}", station.device().standby_active);
            }
            fired
        };

        if fired {
            self.emit(ControlByte::StandbyToggle).await;
        }
        fired
    }

    pub async fn reset_alarm(&mut self) {
        self.station.lock().await.reset_alarm();
        info!("alarm reset");
        self.emit(ControlByte::AlarmReset).await;
    }

    pub async fn request_message(&mut self) {
        self.emit(ControlByte::DisplayMessage).await;
    }

    async fn emit(&mut self, control: ControlByte) {
        let byte = [control.as_byte()];
        let result = async {
            self.writer.write_all(&byte).await?;
            self.writer.flush().await
        }
        .await;

        if let Err(err) = result {
            warn!("failed to send {control:?} to device: {err}");
        }
    }
}
