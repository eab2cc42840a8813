//! Live network telemetry.
//!
//! [`NetworkPublisher`] is the [`DataReceiver`] attached to the logger; it
//! pushes every table onto a Tokio broadcast channel and never blocks the
//! control loop.  [`PublisherServer`] runs on a separate Tokio runtime and
//! streams those tables as JSON text frames to every connected WebSocket
//! client (dashboards, log viewers).
//!
//! # Usage
//!
//! ```rust,no_run
//! use fieldloop_logging::{NetworkPublisher, PublisherServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let publisher = NetworkPublisher::default();
//!     PublisherServer::new(publisher.clone())
//!         .run()
//!         .await
//!         .expect("publisher server failed");
//! }
//! ```

use std::net::SocketAddr;

use fieldloop_types::{FieldError, LogTable};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::receiver::DataReceiver;

/// Default TCP port for the telemetry WebSocket server.
pub const DEFAULT_PUBLISHER_PORT: u16 = 5810;

/// Number of tables buffered for slow clients before they start lagging.
const DEFAULT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// NetworkPublisher
// ---------------------------------------------------------------------------

/// Broadcasts every logged table.  Clone it cheaply – all clones share the
/// same channel.
#[derive(Clone, Debug)]
pub struct NetworkPublisher {
    sender: broadcast::Sender<LogTable>,
}

impl NetworkPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogTable> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NetworkPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl DataReceiver for NetworkPublisher {
    fn name(&self) -> &str {
        "network_publisher"
    }

    fn put_table(&mut self, table: &LogTable) -> Result<(), FieldError> {
        // No connected clients is the normal case, not an error.
        let _ = self.sender.send(table.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PublisherServer
// ---------------------------------------------------------------------------

/// WebSocket server bridging a [`NetworkPublisher`] to remote clients.
pub struct PublisherServer {
    publisher: NetworkPublisher,
    port: u16,
}

impl PublisherServer {
    /// Create a server for `publisher` on [`DEFAULT_PUBLISHER_PORT`].
    pub fn new(publisher: NetworkPublisher) -> Self {
        Self {
            publisher,
            port: DEFAULT_PUBLISHER_PORT,
        }
    }

    /// Override the listening port (builder-style).  Port `0` picks a free
    /// port; read it back from [`BoundServer::local_addr`].
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Bind the listener without accepting connections yet.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Io`] if the TCP listener cannot bind.
    pub async fn bind(self) -> Result<BoundServer, FieldError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| FieldError::Io {
            path: addr.to_string(),
            details: e.to_string(),
        })?;
        let local_addr = listener.local_addr().map_err(|e| FieldError::Io {
            path: addr.to_string(),
            details: e.to_string(),
        })?;
        info!(%local_addr, "telemetry publisher listening");
        Ok(BoundServer {
            listener,
            local_addr,
            publisher: self.publisher,
        })
    }

    /// Bind and serve forever.
    pub async fn run(self) -> Result<(), FieldError> {
        self.bind().await?.serve().await
    }
}

/// A [`PublisherServer`] whose listener is bound.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    publisher: NetworkPublisher,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept clients until the task is dropped.
    pub async fn serve(self) -> Result<(), FieldError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let tables = self.publisher.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, peer, tables).await {
                            warn!(%peer, error = %e, "telemetry client error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "telemetry accept error"),
            }
        }
    }
}

async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    mut tables: broadcast::Receiver<LogTable>,
) -> Result<(), FieldError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| FieldError::Serialization(format!("WS handshake from {peer}: {e}")))?;
    debug!(%peer, "telemetry client connected");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            result = tables.recv() => {
                match result {
                    Ok(table) => {
                        let json = serde_json::to_string(&table)
                            .map_err(|e| FieldError::Serialization(e.to_string()))?;
                        if ws_tx.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%peer, skipped = n, "telemetry client lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    debug!(%peer, "telemetry client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldloop_types::LogValue;
    use std::time::Duration;

    fn sample_table() -> LogTable {
        let mut t = LogTable::new(20_000);
        t.put("DriverStation/Phase", "Teleop");
        t
    }

    #[test]
    fn default_port_is_5810() {
        let server = PublisherServer::new(NetworkPublisher::default());
        assert_eq!(server.port(), DEFAULT_PUBLISHER_PORT);
    }

    #[test]
    fn with_port_overrides_default() {
        let server = PublisherServer::new(NetworkPublisher::default()).with_port(5999);
        assert_eq!(server.port(), 5999);
    }

    #[test]
    fn put_table_without_subscribers_is_ok() {
        let mut publisher = NetworkPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        assert!(publisher.put_table(&sample_table()).is_ok());
    }

    #[tokio::test]
    async fn subscribers_receive_published_tables() {
        let mut publisher = NetworkPublisher::default();
        let mut rx = publisher.subscribe();
        publisher.put_table(&sample_table()).unwrap();
        let got = rx.recv().await.unwrap();
        assert_eq!(
            got.get("DriverStation/Phase"),
            Some(&LogValue::Text("Teleop".to_string()))
        );
    }

    #[tokio::test]
    async fn websocket_client_receives_json_tables() {
        let publisher = NetworkPublisher::default();
        let bound = PublisherServer::new(publisher.clone())
            .with_port(0)
            .bind()
            .await
            .expect("bind");
        let port = bound.local_addr().port();
        tokio::spawn(bound.serve());

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{port}"))
            .await
            .expect("connect");

        // The server subscribes per client; keep publishing until the
        // subscription is live.
        let mut feeder = publisher.clone();
        let feed = tokio::spawn(async move {
            loop {
                let _ = feeder.put_table(&sample_table());
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a table")
            .expect("stream ended")
            .expect("ws error");
        feed.abort();

        let text = msg.into_text().expect("text frame");
        let table: LogTable = serde_json::from_str(text.as_str()).expect("json table");
        assert_eq!(table.timestamp_us, 20_000);
    }
}
