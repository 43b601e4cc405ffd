use std::{io, net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{info, warn};

use watchdog_common::{
    Command, Reply, COMMAND_OFFSET, REPLY_ALARM_RESET, REPLY_MESSAGE_SENT, REQUEST_BUFFER_BYTES,
};

use crate::{device::DeviceController, host::SharedStation, shutdown::ShutdownSignal};

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Serves one client connection at a time: read a request, run its
/// command, write one JSON reply, close.
pub struct Dispatcher<W> {
    listener: TcpListener,
    station: SharedStation,
    controller: DeviceController<W>,
    request_timeout: Duration,
    write_timeout: Duration,
}

impl<W> Dispatcher<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(
        listener: TcpListener,
        station: SharedStation,
        controller: DeviceController<W>,
    ) -> Self {
        Self {
            listener,
            station,
            controller,
            request_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeouts(mut self, request_timeout: Duration, write_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.write_timeout = write_timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        while !shutdown.is_triggered() {
            let accepted = tokio::select! {
                _ = shutdown.triggered() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => self.serve(stream, peer).await,
                Err(err) => {
                    warn!("accept failed: {err}");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            }
        }

        info!("dispatcher stopped accepting connections");
    }

    async fn serve(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        let request =
            match tokio::time::timeout(self.request_timeout, read_request(&mut stream)).await {
                Ok(Ok(request)) => request,
                Ok(Err(err)) => {
                    warn!("failed to read request from {peer}: {err}");
                    return;
                }
                Err(_) => {
                    warn!("request from {peer} timed out");
                    return;
                }
            };

        let Some(command) = Command::from_request(&request) else {
            warn!(
                "ignoring unrecognized request from {peer}: {:?}",
                String::from_utf8_lossy(&request)
            );
            let _ = stream.shutdown().await;
            return;
        };

        info!("{peer} requested {command:?}");
        let reply = self.dispatch(command).await;

        let body = match reply.to_wire() {
            Ok(body) => body,
            Err(err) => {
                warn!("dropping reply to {peer}, serialization failed: {err}");
                return;
            }
        };

        match tokio::time::timeout(self.write_timeout, stream.write_all(&body)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("failed to send reply to {peer}: {err}"),
            Err(_) => warn!("reply to {peer} timed out"),
        }
        let _ = stream.shutdown().await;
    }

    async fn dispatch(&mut self, command: Command) -> Reply {
        match command {
            Command::ToggleUnit => {
                self.controller.toggle_unit().await;
                self.station.lock().await.latest_reply()
            }
            Command::LatestReading => self.station.lock().await.latest_reply(),
            Command::Stats => self.station.lock().await.stats_reply(),
            Command::RequestMessage => {
                self.controller.request_message().await;
                Reply::new(REPLY_MESSAGE_SENT)
            }
            Command::ResetAlarm => {
                self.controller.reset_alarm().await;
                Reply::new(REPLY_ALARM_RESET)
            }
            Command::ToggleStandby => {
                self.controller.toggle_standby().await;
                self.station.lock().await.standby_reply()
            }
            Command::TrippedStatus => self.station.lock().await.tripped_reply(),
        }
    }
}

/// Reads until the command byte has arrived, the peer stops sending, or
/// the buffer is full. Requests may arrive split across several reads.
async fn read_request<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; REQUEST_BUFFER_BYTES];
    let mut filled = 0;

    while filled <= COMMAND_OFFSET && filled < buf.len() {
        let len = stream.read(&mut buf[filled..]).await?;
        if len == 0 {
            break;
        }
        filled += len;
    }

    buf.truncate(filled);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tokio::{io::DuplexStream, sync::Mutex, task::JoinHandle};
    use watchdog_common::{Event, Station};

    use crate::{ingest::SerialIngestor, shutdown::Shutdown};

    struct Harness {
        addr: SocketAddr,
        station: SharedStation,
        device: DuplexStream,
        shutdown: Shutdown,
        handle: JoinHandle<()>,
    }

    impl Harness {
        async fn start() -> Self {
            let station: SharedStation = Arc::new(Mutex::new(Station::default()));
            let (bridge_side, device) = tokio::io::duplex(256);
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let dispatcher = Dispatcher::new(
                listener,
                station.clone(),
                DeviceController::new(bridge_side, station.clone()),
            )
            .with_timeouts(Duration::from_millis(300), Duration::from_millis(300));
            let addr = dispatcher.local_addr().unwrap();
            let shutdown = Shutdown::new();
            let handle = tokio::spawn(dispatcher.run(shutdown.subscribe()));

            Self {
                addr,
                station,
                device,
                shutdown,
                handle,
            }
        }

        async fn request(&self, code: char) -> String {
            send_raw(self.addr, format!("GET /{code} HTTP/1.1\r\n\r\n").as_bytes()).await
        }

        async fn readings(&self, values: &[f64]) {
            let mut station = self.station.lock().await;
            for value in values {
                station.apply_event(Event::Reading(*value));
            }
        }

        /// Stops the dispatcher and returns every byte sent to the device.
        async fn stop(mut self) -> Vec<u8> {
            self.shutdown.trigger();
            tokio::time::timeout(Duration::from_secs(1), self.handle)
                .await
                .expect("dispatcher did not stop")
                .unwrap();
            let mut sent = Vec::new();
            self.device.read_to_end(&mut sent).await.unwrap();
            sent
        }
    }

    async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        stream.shutdown().await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    fn name_of(reply: &str) -> String {
        serde_json::from_str::<Reply>(reply).unwrap().name
    }

    #[tokio::test]
    async fn empty_log_reports_no_data() {
        let harness = Harness::start().await;
        assert_eq!(
            harness.request('b').await,
            "{\"name\":\"No data available.\"}\n"
        );
        assert_eq!(name_of(&harness.request('d').await), "No data available.");
        harness.stop().await;
    }

    #[tokio::test]
    async fn stats_before_and_after_unit_toggle() {
        let harness = Harness::start().await;
        harness.readings(&[10.0, 20.0, 30.0]).await;

        assert_eq!(
            name_of(&harness.request('d').await),
            "H: 30.0 L: 10.0 AVG: 20.0"
        );
        assert_eq!(name_of(&harness.request('a').await), "30.0 C");
        assert_eq!(name_of(&harness.request('a').await), "30.0 C");
        assert_eq!(name_of(&harness.request('a').await), "86.0 F");
        assert_eq!(
            name_of(&harness.request('d').await),
            "H: 86.0 L: 50.0 AVG: 68.0"
        );
        assert_eq!(name_of(&harness.request('b').await), "86.0 F");

        assert_eq!(harness.stop().await, b"f".to_vec());
    }

    #[tokio::test]
    async fn standby_toggles_once_per_three_requests() {
        let harness = Harness::start().await;

        assert_eq!(name_of(&harness.request('s').await), "Standby disengaged.");
        assert_eq!(name_of(&harness.request('s').await), "Standby disengaged.");
        assert_eq!(name_of(&harness.request('s').await), "Standby engaged.");
        assert!(harness.station.lock().await.device().standby_active);

        assert_eq!(harness.stop().await, b"s".to_vec());
    }

    #[tokio::test]
    async fn trip_then_reset() {
        let harness = Harness::start().await;
        assert_eq!(name_of(&harness.request('t').await), "nottripped");

        harness.station.lock().await.apply_event(Event::Tripped);
        assert_eq!(name_of(&harness.request('t').await), "tripped");
        assert_eq!(name_of(&harness.request('r').await), "Alarm Reset");
        assert_eq!(name_of(&harness.request('t').await), "nottripped");
        assert_eq!(name_of(&harness.request('m').await), "Message Sent");

        assert_eq!(harness.stop().await, b"rm".to_vec());
    }

    #[tokio::test]
    async fn device_error_overrides_reading_commands() {
        let harness = Harness::start().await;
        harness.readings(&[21.0]).await;
        harness.station.lock().await.set_device_error(true);

        for code in ['a', 'b', 'd'] {
            assert_eq!(name_of(&harness.request(code).await), "Device error!");
        }
        assert_eq!(name_of(&harness.request('t').await), "nottripped");
        harness.stop().await;
    }

    #[tokio::test]
    async fn unknown_or_short_requests_close_without_reply() {
        let harness = Harness::start().await;

        assert_eq!(send_raw(harness.addr, b"GET /z HTTP/1.1\r\n\r\n").await, "");
        assert_eq!(send_raw(harness.addr, b"GET").await, "");
        assert_eq!(name_of(&harness.request('t').await), "nottripped");

        assert!(harness.stop().await.is_empty());
    }

    #[tokio::test]
    async fn request_split_across_writes_is_reassembled() {
        let harness = Harness::start().await;
        harness.readings(&[17.0]).await;

        let mut stream = TcpStream::connect(harness.addr).await.unwrap();
        stream.write_all(b"GET").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(b" /b").await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();

        assert_eq!(name_of(&reply), "17.0 C");
        harness.stop().await;
    }

    #[tokio::test]
    async fn silent_client_times_out_and_next_client_is_served() {
        let harness = Harness::start().await;

        let idle = TcpStream::connect(harness.addr).await.unwrap();
        assert_eq!(name_of(&harness.request('t').await), "nottripped");
        drop(idle);

        harness.stop().await;
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let harness = Harness::start().await;
        let addr = harness.addr;
        harness.stop().await;

        let refused = TcpStream::connect(addr).await;
        assert!(refused.is_err());
    }

    #[tokio::test]
    async fn concurrent_ingestion_never_tears_replies() {
        let harness = Harness::start().await;
        let (mut serial, bridge_side) = tokio::io::duplex(1024);
        let shutdown = Shutdown::new();
        let ingestor = tokio::spawn(
            SerialIngestor::new(bridge_side, harness.station.clone(), Duration::from_millis(10))
                .run(shutdown.subscribe()),
        );

        let writer = tokio::spawn(async move {
            for value in 0..200 {
                serial
                    .write_all(format!("{value}.5\n").as_bytes())
                    .await
                    .unwrap();
            }
            serial
        });

        for _ in 0..20 {
            let name = name_of(&harness.request('b').await);
            if name != "No data available." {
                let (value, unit) = name.split_once(' ').unwrap();
                let value: f64 = value.parse().unwrap();
                assert_eq!(unit, "C");
                assert_eq!(value.fract(), 0.5);
                assert!((0.0..200.0).contains(&value));
            }

            let stats = name_of(&harness.request('d').await);
            assert!(stats == "No data available." || stats.starts_with("H: "));
        }

        let _serial = writer.await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while harness.station.lock().await.log().latest() != Some(199.5) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("ingestor never caught up");
        assert_eq!(name_of(&harness.request('b').await), "199.5 C");

        shutdown.trigger();
        ingestor.await.unwrap();
        harness.stop().await;
    }
}
