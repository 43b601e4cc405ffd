use std::{io::BufRead, sync::Arc};

use tokio::sync::watch;
use tracing::{info, warn};

/// Operator stop request shared by every long-running loop.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown was requested. A dropped `Shutdown` counts
    /// as a request.
    pub async fn triggered(&mut self) {
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

pub fn spawn_ctrl_c(shutdown: Shutdown) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                shutdown.trigger();
            }
            Err(err) => warn!("failed to listen for ctrl-c: {err}"),
        }
    });
}

/// Watches stdin for the operator's `q` command. Runs on a plain thread
/// since a blocking stdin read cannot be cancelled.
pub fn spawn_console_quit(shutdown: Shutdown) {
    let spawned = std::thread::Builder::new()
        .name("console-quit".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) if is_quit_command(&line) => {
                        info!("quit requested from console");
                        shutdown.trigger();
                        return;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!("console read failed: {err}");
                        return;
                    }
                }
            }
        });

    if let Err(err) = spawned {
        warn!("failed to start console watcher: {err}");
    }
}

fn is_quit_command(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('q' | 'Q'))
}
