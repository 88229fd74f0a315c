// realtime/client.rs
//
// Socket.IO client over a plain WebSocket transport. One spawned task per
// connection: handshake, heartbeat, event pump and reconnect with backoff.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::config::{ConsoleConfig, ReconnectPolicy};
use crate::Error;

use super::events::{ChannelEvent, HandshakeAuth};
use super::packet::{EnginePacket, OpenHandshake, SocketPacket};
use super::{ChannelCommand, ChannelHandle, EventSink, RealtimeConnector};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// Where to connect: the engine.io websocket endpoint plus the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketTarget {
    pub ws_url: String,
    pub namespace: String,
}

impl SocketTarget {
    /// `http://host:3055/atendimento` becomes
    /// `ws://host:3055/socket.io/?EIO=4&transport=websocket` on namespace `/atendimento`.
    pub fn from_url(url: &Url) -> Result<Self, Error> {
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(Error::Connection(format!("unsupported socket scheme '{}'", other))),
        };

        let path = url.path().trim_end_matches('/');
        let namespace = if path.is_empty() { "/".to_string() } else { path.to_string() };

        let mut ws = url.clone();
        ws.set_scheme(scheme)
            .map_err(|_| Error::Connection(format!("cannot use scheme '{}' for {}", scheme, url)))?;
        ws.set_path("/socket.io/");
        ws.set_query(Some("EIO=4&transport=websocket"));
        ws.set_fragment(None);

        Ok(Self { ws_url: ws.to_string(), namespace })
    }
}

pub struct SocketIoConnector {
    target: SocketTarget,
    reconnect: ReconnectPolicy,
    handshake_timeout: Duration,
}

impl SocketIoConnector {
    pub fn new(target: SocketTarget, reconnect: ReconnectPolicy, handshake_timeout: Duration) -> Self {
        Self { target, reconnect, handshake_timeout }
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, Error> {
        let target = SocketTarget::from_url(&config.socket_url)?;
        Ok(Self::new(target, config.reconnect.clone(), config.handshake_timeout))
    }

    pub fn target(&self) -> &SocketTarget {
        &self.target
    }
}

impl RealtimeConnector for SocketIoConnector {
    fn connect(&self, auth: HandshakeAuth, sink: EventSink) -> ChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(
            self.target.clone(),
            auth,
            sink,
            rx,
            self.reconnect.clone(),
            self.handshake_timeout,
        ));
        ChannelHandle::new(tx, Some(task))
    }
}

/// How one connection attempt ended.
#[derive(Debug)]
enum SessionEnd {
    /// We asked to leave.
    Closed,
    /// Namespace refused the handshake. Retrying with the same auth is pointless.
    Rejected(String),
    /// Server kicked us out of the namespace.
    ServerDisconnect,
    Failed { connected: bool, reason: String },
}

async fn run_channel(
    target: SocketTarget,
    auth: HandshakeAuth,
    sink: EventSink,
    mut commands: mpsc::UnboundedReceiver<ChannelCommand>,
    policy: ReconnectPolicy,
    handshake_timeout: Duration,
) {
    let mut attempt: u32 = 0;
    loop {
        let end = run_session(&target, &auth, &sink, &mut commands, handshake_timeout).await;
        match end {
            SessionEnd::Closed => {
                info!("[Realtime] channel #{} closed", sink.connection_id());
                return;
            }
            SessionEnd::Rejected(message) => {
                warn!("[Realtime] namespace {} refused connection: {}", target.namespace, message);
                sink.send(ChannelEvent::ConnectError { message });
                return;
            }
            SessionEnd::ServerDisconnect => {
                warn!("[Realtime] server disconnected us from {}", target.namespace);
                sink.send(ChannelEvent::Disconnected { reason: "io server disconnect".into() });
                return;
            }
            SessionEnd::Failed { connected, reason } => {
                error!("[Realtime] channel #{} failed: {}", sink.connection_id(), reason);
                let delivered = if connected {
                    attempt = 0;
                    sink.send(ChannelEvent::Disconnected { reason })
                } else {
                    sink.send(ChannelEvent::ConnectError { message: reason })
                };
                if !delivered {
                    return;
                }
            }
        }

        if !policy.enabled {
            return;
        }
        let delay = policy.delay_for(attempt);
        attempt = attempt.saturating_add(1);
        info!("[Realtime] reconnecting in {:?} (attempt {})", delay, attempt);
        if !wait_before_retry(&mut commands, delay).await {
            return;
        }
    }
}

/// Sleeps through the backoff. Emits that arrive meanwhile are dropped.
/// Returns false if the console asked to disconnect or went away.
async fn wait_before_retry(commands: &mut mpsc::UnboundedReceiver<ChannelCommand>, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return true,
            cmd = commands.recv() => match cmd {
                Some(ChannelCommand::Emit(evt)) => {
                    warn!("[Realtime] not connected; dropping '{}'", evt.name());
                }
                Some(ChannelCommand::Disconnect) | None => return false,
            }
        }
    }
}

async fn run_session(
    target: &SocketTarget,
    auth: &HandshakeAuth,
    sink: &EventSink,
    commands: &mut mpsc::UnboundedReceiver<ChannelCommand>,
    handshake_timeout: Duration,
) -> SessionEnd {
    // 1) websocket upgrade
    let ws = match timeout(handshake_timeout, connect_async(target.ws_url.as_str())).await {
        Ok(Ok((ws, _))) => ws,
        Ok(Err(e)) => return SessionEnd::Failed { connected: false, reason: format!("connect error: {}", e) },
        Err(_) => return SessionEnd::Failed { connected: false, reason: "connect timeout".into() },
    };
    let (mut write, mut read) = ws.split();

    // 2) engine open + namespace connect
    let open = match timeout(handshake_timeout, handshake(&mut write, &mut read, target, auth)).await {
        Ok(Ok(open)) => open,
        Ok(Err(end)) => return end,
        Err(_) => return SessionEnd::Failed { connected: false, reason: "handshake timeout".into() },
    };
    info!("[Realtime] connected to {} (sid={})", target.namespace, open.sid);
    if !sink.send(ChannelEvent::Connected) {
        let _ = write.close().await;
        return SessionEnd::Closed;
    }

    // 3) pump until something ends the session. Only inbound frames push the
    //    silence deadline; our own emits do not prove the server is alive.
    let silence = Duration::from_millis(open.ping_interval + open.ping_timeout);
    let mut last_inbound = Instant::now();
    loop {
        tokio::select! {
            _ = sleep_until(last_inbound + silence) => {
                return SessionEnd::Failed { connected: true, reason: "ping timeout".into() };
            }
            frame = read.next() => {
                let msg = match frame {
                    None => return SessionEnd::Failed { connected: true, reason: "transport close".into() },
                    Some(Err(e)) => return SessionEnd::Failed { connected: true, reason: format!("transport error: {}", e) },
                    Some(Ok(msg)) => msg,
                };
                last_inbound = Instant::now();
                if msg.is_close() {
                    return SessionEnd::Failed { connected: true, reason: "transport close".into() };
                }
                let Message::Text(txt) = msg else { continue };
                if let Some(end) = handle_frame(&txt, &mut write, target, sink).await {
                    return end;
                }
            }
            cmd = commands.recv() => match cmd {
                Some(ChannelCommand::Emit(evt)) => {
                    let packet = SocketPacket::Event {
                        namespace: target.namespace.clone(),
                        id: None,
                        name: evt.name().to_string(),
                        args: evt.args(),
                    };
                    if let Err(e) = send_text(&mut write, packet.to_frame()).await {
                        return SessionEnd::Failed { connected: true, reason: format!("write failed: {}", e) };
                    }
                }
                Some(ChannelCommand::Disconnect) | None => {
                    let leave = SocketPacket::Disconnect { namespace: target.namespace.clone() };
                    let _ = send_text(&mut write, leave.to_frame()).await;
                    let _ = write.close().await;
                    return SessionEnd::Closed;
                }
            }
        }
    }
}

async fn handshake(
    write: &mut WsWrite,
    read: &mut WsRead,
    target: &SocketTarget,
    auth: &HandshakeAuth,
) -> Result<OpenHandshake, SessionEnd> {
    let open = loop {
        let txt = next_text(read).await?;
        match EnginePacket::decode(&txt) {
            Ok(EnginePacket::Open(open)) => break open,
            Ok(other) => debug!("[Realtime] ignoring {:?} before open", other),
            Err(e) => warn!("[Realtime] {}", e),
        }
    };

    let connect = SocketPacket::Connect {
        namespace: target.namespace.clone(),
        data: serde_json::to_value(auth).ok(),
    };
    send_text(write, connect.to_frame())
        .await
        .map_err(|e| SessionEnd::Failed { connected: false, reason: format!("write failed: {}", e) })?;

    loop {
        let txt = next_text(read).await?;
        match EnginePacket::decode(&txt) {
            Ok(EnginePacket::Ping(data)) => {
                send_text(write, EnginePacket::Pong(data).encode())
                    .await
                    .map_err(|e| SessionEnd::Failed { connected: false, reason: format!("write failed: {}", e) })?;
            }
            Ok(EnginePacket::Message(body)) => match SocketPacket::decode(&body) {
                Ok(SocketPacket::Connect { namespace, .. }) if namespace == target.namespace => return Ok(open),
                Ok(SocketPacket::ConnectError { namespace, data }) if namespace == target.namespace => {
                    return Err(SessionEnd::Rejected(connect_error_message(data)));
                }
                Ok(other) => debug!("[Realtime] ignoring {:?} during handshake", other),
                Err(e) => warn!("[Realtime] {}", e),
            },
            Ok(EnginePacket::Close) => {
                return Err(SessionEnd::Failed { connected: false, reason: "server closed during handshake".into() });
            }
            Ok(_) => {}
            Err(e) => warn!("[Realtime] {}", e),
        }
    }
}

async fn next_text(read: &mut WsRead) -> Result<String, SessionEnd> {
    loop {
        match read.next().await {
            Some(Ok(Message::Text(txt))) => return Ok(txt.as_str().to_string()),
            Some(Ok(msg)) if msg.is_close() => {
                return Err(SessionEnd::Failed { connected: false, reason: "transport close".into() });
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                return Err(SessionEnd::Failed { connected: false, reason: format!("transport error: {}", e) });
            }
            None => return Err(SessionEnd::Failed { connected: false, reason: "transport close".into() }),
        }
    }
}

async fn handle_frame(txt: &str, write: &mut WsWrite, target: &SocketTarget, sink: &EventSink) -> Option<SessionEnd> {
    let packet = match EnginePacket::decode(txt) {
        Ok(p) => p,
        Err(e) => {
            warn!("[Realtime] {}", e);
            return None;
        }
    };
    match packet {
        EnginePacket::Ping(data) => {
            trace!("[Realtime] ping");
            if let Err(e) = send_text(write, EnginePacket::Pong(data).encode()).await {
                return Some(SessionEnd::Failed { connected: true, reason: format!("write failed: {}", e) });
            }
        }
        EnginePacket::Close => {
            return Some(SessionEnd::Failed { connected: true, reason: "transport close".into() });
        }
        EnginePacket::Message(body) => match SocketPacket::decode(&body) {
            Ok(pkt) if pkt.namespace() != target.namespace => {
                trace!("[Realtime] packet for other namespace {}", pkt.namespace());
            }
            Ok(SocketPacket::Event { name, args, .. }) => {
                debug!("[Realtime] <= {}", name);
                match ChannelEvent::from_named(&name, &args) {
                    Some(event) => {
                        if !sink.send(event) {
                            return Some(SessionEnd::Closed);
                        }
                    }
                    None => debug!("[Realtime] unhandled event '{}'", name),
                }
            }
            Ok(SocketPacket::Disconnect { .. }) => return Some(SessionEnd::ServerDisconnect),
            Ok(SocketPacket::ConnectError { data, .. }) => {
                return Some(SessionEnd::Rejected(connect_error_message(data)));
            }
            Ok(other) => trace!("[Realtime] ignoring {:?}", other),
            Err(e) => warn!("[Realtime] {}", e),
        },
        _ => {}
    }
    None
}

fn connect_error_message(data: Option<Value>) -> String {
    match data {
        Some(Value::String(s)) => s,
        Some(v) => v
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| v.to_string()),
        None => "connection refused".to_string(),
    }
}

async fn send_text(write: &mut WsWrite, text: String) -> Result<(), Error> {
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| Error::Connection(e.to_string()))
}
