//! WebSocket client for the live occupancy feed.

use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use occupancy_types::OccupancySnapshot;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::seed::SeedClient;
use super::{SyncError, SyncEvent};
use crate::config::SyncConfig;

/// How a session with an open socket ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Server closed, stream ended or a read failed.
    Closed,
    /// Teardown was requested.
    Shutdown,
}

/// Event sender paired with the shutdown signal.
///
/// Every emit races the shutdown signal so a full channel can never keep
/// the task alive after teardown.
#[derive(Clone)]
struct EventSink {
    event_tx: mpsc::Sender<SyncEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl EventSink {
    /// Resolves once shutdown is requested or the client is dropped.
    async fn shutdown_requested(&mut self) {
        shutdown_signalled(&mut self.shutdown_rx).await;
    }

    async fn emit(&mut self, event: SyncEvent) {
        tokio::select! {
            biased;
            _ = shutdown_signalled(&mut self.shutdown_rx) => {}
            _ = self.event_tx.send(event) => {}
        }
    }
}

async fn shutdown_signalled(shutdown_rx: &mut watch::Receiver<bool>) {
    // A dropped sender also ends the wait.
    let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
}

/// Live feed client.
///
/// Owns at most one background task, which holds at most one socket.
/// Dropping the client without calling [`LiveSyncClient::stop`] still ends
/// the task at its next suspension point.
pub struct LiveSyncClient {
    config: SyncConfig,
    event_tx: Option<mpsc::Sender<SyncEvent>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl LiveSyncClient {
    /// Create a new client. Nothing happens until [`LiveSyncClient::start`].
    pub fn new(config: SyncConfig, event_tx: mpsc::Sender<SyncEvent>) -> Self {
        Self {
            config,
            event_tx: Some(event_tx),
            shutdown_tx: None,
            task: None,
        }
    }

    /// Spawn the sync task. A second call is a no-op.
    pub fn start(&mut self) -> Result<(), SyncError> {
        let Some(event_tx) = self.event_tx.take() else {
            return Ok(());
        };

        let seed = match &self.config.seed_url {
            Some(url) => Some(SeedClient::new(url.clone(), self.config.connect_timeout)?),
            None => None,
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sink = EventSink {
            event_tx,
            shutdown_rx,
        };

        self.shutdown_tx = Some(shutdown_tx);
        self.task = Some(tokio::spawn(Self::run(self.config.clone(), seed, sink)));

        info!(ws_url = %self.config.ws_url, "Live sync client started");
        Ok(())
    }

    /// Whether the background task is still alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Close the socket, cancel any pending reconnect or seed request and
    /// wait for the task to finish. No event is sent after this returns.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Live sync task ended abnormally");
            }
            info!("Live sync client stopped");
        }
    }

    /// Seed fetch and connection loop, side by side.
    async fn run(config: SyncConfig, seed: Option<SeedClient>, sink: EventSink) {
        let seed_sink = sink.clone();
        let seed_fut = async move {
            if let Some(seed) = seed {
                Self::seed_once(&seed, seed_sink).await;
            }
        };

        tokio::join!(seed_fut, Self::connection_loop(&config, sink));
    }

    /// Fetch the initial snapshot once; failures are only logged.
    async fn seed_once(seed: &SeedClient, mut sink: EventSink) {
        let result = tokio::select! {
            biased;
            _ = sink.shutdown_requested() => {
                debug!(url = seed.url(), "Initial snapshot fetch aborted");
                return;
            }
            result = seed.fetch() => result,
        };

        match result {
            Ok(snapshot) => {
                info!(url = seed.url(), last_updated = %snapshot.last_updated, "Initial snapshot fetched");
                sink.emit(SyncEvent::Seeded(snapshot)).await;
            }
            Err(e) => warn!(url = seed.url(), error = %e, "Initial snapshot fetch failed"),
        }
    }

    /// Connection loop with reconnection logic.
    async fn connection_loop(config: &SyncConfig, mut sink: EventSink) {
        let mut attempt = 0u32;

        loop {
            match Self::run_connection(config, &mut sink).await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed) => {
                    // The socket was open, so the failure streak starts over.
                    attempt = 0;
                    info!(ws_url = %config.ws_url, "Live feed closed");
                }
                Err(e) => {
                    warn!(error = %e, "Live feed connection failed");
                    sink.emit(SyncEvent::Error(e.to_string())).await;
                }
            }

            attempt = attempt.saturating_add(1);
            let Some(delay) = config.retry.delay_for(attempt) else {
                info!(attempt, "Retry policy exhausted, staying disconnected");
                sink.emit(SyncEvent::Disconnected).await;
                break;
            };

            debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
            sink.emit(SyncEvent::Reconnecting { attempt, delay }).await;

            tokio::select! {
                biased;
                _ = sink.shutdown_requested() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run a single WebSocket connection.
    async fn run_connection(
        config: &SyncConfig,
        sink: &mut EventSink,
    ) -> Result<SessionEnd, SyncError> {
        let connect = tokio::time::timeout(config.connect_timeout, connect_async(config.ws_url.as_str()));

        let (ws_stream, _) = tokio::select! {
            biased;
            _ = sink.shutdown_requested() => return Ok(SessionEnd::Shutdown),
            result = connect => match result {
                Ok(Ok(pair)) => pair,
                Ok(Err(source)) => {
                    return Err(SyncError::Connect {
                        url: config.ws_url.clone(),
                        source,
                    })
                }
                Err(_) => {
                    return Err(SyncError::ConnectTimeout {
                        url: config.ws_url.clone(),
                        timeout: config.connect_timeout,
                    })
                }
            },
        };

        info!(ws_url = %config.ws_url, "Live feed connected");
        sink.emit(SyncEvent::Connected).await;

        let (mut write, mut read) = ws_stream.split();

        loop {
            let msg = tokio::select! {
                biased;
                _ = sink.shutdown_requested() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
                msg = read.next() => msg,
            };

            match msg {
                Some(Ok(Message::Text(text))) => {
                    Self::handle_text_message(&text, sink).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Server closed the live feed");
                    return Ok(SessionEnd::Closed);
                }
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Live feed read failed");
                    sink.emit(SyncEvent::Error(e.to_string())).await;
                    return Ok(SessionEnd::Closed);
                }
                None => return Ok(SessionEnd::Closed),
            }
        }
    }

    /// Validate a text frame and forward it, or drop it with a warning.
    async fn handle_text_message(text: &str, sink: &mut EventSink) {
        let received_at = Instant::now();

        match OccupancySnapshot::from_json(text) {
            Ok(snapshot) => {
                if !snapshot.is_consistent() {
                    debug!(
                        total = snapshot.total,
                        occupied = snapshot.occupied,
                        empty = snapshot.empty,
                        "Snapshot counts disagree, showing server values"
                    );
                }
                debug!(
                    seats = snapshot.seats.len(),
                    last_updated = %snapshot.last_updated,
                    "Snapshot received"
                );
                sink.emit(SyncEvent::Snapshot {
                    snapshot,
                    received_at,
                })
                .await;
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Ignoring invalid frame");
                sink.emit(SyncEvent::Rejected(e.to_string())).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let (tx, _rx) = mpsc::channel(4);
        let mut client = LiveSyncClient::new(SyncConfig::default(), tx);
        client.stop().await;
        assert!(!client.is_running());
    }

    #[tokio::test]
    async fn test_emit_gives_up_on_full_channel_after_shutdown() {
        let (event_tx, _rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sink = EventSink {
            event_tx,
            shutdown_rx,
        };

        sink.emit(SyncEvent::Connected).await;
        shutdown_tx.send(true).unwrap();

        // Channel is full; without the shutdown race this would hang.
        tokio::time::timeout(Duration::from_secs(1), sink.emit(SyncEvent::Disconnected))
            .await
            .expect("emit should not block after shutdown");
    }

    #[tokio::test]
    async fn test_dropped_client_counts_as_shutdown() {
        let (event_tx, _rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sink = EventSink {
            event_tx,
            shutdown_rx,
        };
        drop(shutdown_tx);

        tokio::time::timeout(Duration::from_secs(1), sink.shutdown_requested())
            .await
            .expect("dropped sender should release waiters");
    }
}
