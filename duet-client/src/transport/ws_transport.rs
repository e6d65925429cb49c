use crate::config::ClientConfig;
use crate::provider::{SignalTransport, TransportEvent, TransportEventSink};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use duet_core::SignalEnvelope;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;

/// How a connected session ended.
enum SessionEnd {
    /// `close()` was called or every sender is gone.
    Shutdown,
    Lost,
}

/// WebSocket connection to the relay with an outgoing queue and bounded,
/// fixed-delay reconnects.
///
/// Each session starts outside any room, so nothing but `join-room` is
/// written until a `join-room` went out on it; earlier envelopes are held.
pub struct WsSignalTransport {
    url: String,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    ready: Arc<AtomicBool>,
    outgoing_tx: mpsc::UnboundedSender<SignalEnvelope>,
    outgoing_rx: Mutex<Option<mpsc::UnboundedReceiver<SignalEnvelope>>>,
    shutdown: watch::Sender<bool>,
}

impl WsSignalTransport {
    pub fn new(url: impl Into<String>, reconnect_attempts: u32, reconnect_delay: Duration) -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = watch::channel(false);
        Self {
            url: url.into(),
            reconnect_attempts,
            reconnect_delay,
            ready: Arc::new(AtomicBool::new(false)),
            outgoing_tx,
            outgoing_rx: Mutex::new(Some(outgoing_rx)),
            shutdown,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.relay_url.clone(),
            config.reconnect_attempts,
            config.reconnect_delay,
        )
    }
}

#[async_trait]
impl SignalTransport for WsSignalTransport {
    async fn open(&self, events: TransportEventSink) -> Result<()> {
        let Some(outgoing) = self.outgoing_rx.lock().await.take() else {
            bail!("transport to {} was already opened", self.url);
        };
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            bail!("relay url must be ws:// or wss://, got {}", self.url);
        }

        let worker = Worker {
            url: self.url.clone(),
            reconnect_attempts: self.reconnect_attempts,
            reconnect_delay: self.reconnect_delay,
            ready: self.ready.clone(),
            events,
            shutdown: self.shutdown.subscribe(),
        };
        tokio::spawn(worker.run(outgoing));
        Ok(())
    }

    fn send(&self, envelope: SignalEnvelope) {
        if !self.is_ready() {
            debug!("Relay not ready, queueing {}", envelope.kind());
        }
        if self.outgoing_tx.send(envelope).is_err() {
            debug!("Transport stopped, dropping envelope");
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn close(&self) {
        self.ready.store(false, Ordering::Release);
        let _ = self.shutdown.send(true);
    }
}

struct Worker {
    url: String,
    reconnect_attempts: u32,
    reconnect_delay: Duration,
    ready: Arc<AtomicBool>,
    events: TransportEventSink,
    shutdown: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self, mut outgoing: mpsc::UnboundedReceiver<SignalEnvelope>) {
        let mut attempt = 0;
        let mut held = VecDeque::new();

        loop {
            if *self.shutdown.borrow() {
                return;
            }

            match self.connect().await {
                Ok(socket) => {
                    info!("Connected to relay {}", self.url);
                    attempt = 0;
                    self.ready.store(true, Ordering::Release);
                    let _ = self.events.send(TransportEvent::Connected);

                    let end = self.pump(socket, &mut outgoing, &mut held).await;
                    self.ready.store(false, Ordering::Release);
                    if let SessionEnd::Shutdown = end {
                        info!("Relay transport closed");
                        return;
                    }

                    warn!("Connection to relay {} lost", self.url);
                    let _ = self.events.send(TransportEvent::Disconnected);
                }
                Err(e) => warn!("Relay connection failed: {:#}", e),
            }

            attempt += 1;
            if attempt > self.reconnect_attempts {
                let reason = format!(
                    "relay {} unreachable after {} reconnect attempts",
                    self.url, self.reconnect_attempts
                );
                let _ = self.events.send(TransportEvent::Failed(reason));
                return;
            }

            let _ = self.events.send(TransportEvent::Reconnecting { attempt });
            tokio::select! {
                _ = tokio::time::sleep(self.reconnect_delay) => {}
                _ = self.shutdown.changed() => return,
            }
        }
    }

    async fn connect(&mut self) -> Result<Socket> {
        tokio::select! {
            connected = connect_async(self.url.as_str()) => {
                let (socket, _) = connected.with_context(|| format!("connecting to {}", self.url))?;
                Ok(socket)
            }
            _ = self.shutdown.changed() => bail!("transport closed while connecting"),
        }
    }

    /// Move frames both ways until the socket drops or we are told to stop.
    async fn pump(
        &mut self,
        socket: Socket,
        outgoing: &mut mpsc::UnboundedReceiver<SignalEnvelope>,
        held: &mut VecDeque<SignalEnvelope>,
    ) -> SessionEnd {
        let (mut sink, mut stream) = socket.split();
        let mut joined = false;

        loop {
            tokio::select! {
                envelope = outgoing.recv() => {
                    let Some(envelope) = envelope else {
                        let _ = sink.close().await;
                        return SessionEnd::Shutdown;
                    };
                    let is_join = matches!(envelope, SignalEnvelope::JoinRoom { .. });
                    if !joined && !is_join {
                        debug!("Holding {} until join-room is sent", envelope.kind());
                        held.push_back(envelope);
                        continue;
                    }
                    if write(&mut sink, &envelope).await.is_err() {
                        return SessionEnd::Lost;
                    }

                    if is_join && !joined {
                        joined = true;
                        while let Some(envelope) = held.pop_front() {
                            if write(&mut sink, &envelope).await.is_err() {
                                held.push_front(envelope);
                                return SessionEnd::Lost;
                            }
                        }
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<SignalEnvelope>(text.as_str()) {
                            Ok(envelope) => {
                                let _ = self.events.send(TransportEvent::Message(envelope));
                            }
                            Err(e) => warn!("Ignoring malformed frame from relay: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return SessionEnd::Lost,
                    Some(Ok(_)) => {}
                },

                _ = self.shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            }
        }
    }
}

/// Encoding failures are logged and skipped; only a dead socket is an error.
async fn write(sink: &mut SocketSink, envelope: &SignalEnvelope) -> Result<(), ()> {
    let json = match serde_json::to_string(envelope) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode {}: {}", envelope.kind(), e);
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
