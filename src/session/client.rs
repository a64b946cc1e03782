//! Websocket client for the multiworld server.
//!
//! [`RemoteSession`] owns the socket and the [`SessionState`]; it runs as one
//! task. Other tasks talk to it through a cloneable [`SessionHandle`]: an
//! outbound mailbox, a control channel, and a watch channel of snapshots.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::backoff::ReconnectBackoff;
use super::error::SessionError;
use super::message::{decode_packets, encode_packets, ClientMessage, ConnectRequest, ServerMessage};
use super::state::{SessionControl, SessionSnapshot, SessionState};
use crate::core::{MessageSink, ProtocolError, DEFAULT_SERVER_PORT, HANDSHAKE_TIMEOUT};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Session configuration.
#[derive(Clone)]
pub struct SessionConfig {
    /// Server address, `host[:port]` with an optional `ws://`/`wss://` scheme.
    pub server: String,
    /// Slot name.
    pub slot_name: String,
    /// Room password.
    pub password: Option<String>,
    /// Time allowed from socket open to `Connected`.
    pub handshake_timeout: Duration,
    /// Connect as soon as the task starts.
    pub connect_on_start: bool,
    /// Reconnect delays.
    pub backoff: ReconnectBackoff,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server", &self.server)
            .field("slot_name", &self.slot_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("handshake_timeout", &self.handshake_timeout)
            .field("connect_on_start", &self.connect_on_start)
            .finish_non_exhaustive()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            slot_name: String::new(),
            password: None,
            handshake_timeout: HANDSHAKE_TIMEOUT,
            connect_on_start: true,
            backoff: ReconnectBackoff::default(),
        }
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Start from defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server address.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.server = server.into();
        self
    }

    /// Set the slot name.
    pub fn slot_name(mut self, name: impl Into<String>) -> Self {
        self.config.slot_name = name.into();
        self
    }

    /// Set the room password.
    pub fn password(mut self, password: Option<String>) -> Self {
        self.config.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Set the handshake timeout.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Connect immediately or wait for an operator `/connect`.
    pub fn connect_on_start(mut self, enabled: bool) -> Self {
        self.config.connect_on_start = enabled;
        self
    }

    /// Set the reconnect schedule.
    pub fn backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Finish.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Cloneable handle to a running [`RemoteSession`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    outbound: mpsc::UnboundedSender<ClientMessage>,
    control: mpsc::UnboundedSender<SessionControl>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Ask the session to (re)connect, optionally to a new address.
    pub fn connect(&self, address: Option<String>) -> Result<(), SessionError> {
        self.control
            .send(SessionControl::Connect(address))
            .map_err(|_| SessionError::Closed)
    }

    /// Ask the session to go offline.
    pub fn disconnect(&self) -> Result<(), SessionError> {
        self.control
            .send(SessionControl::Disconnect)
            .map_err(|_| SessionError::Closed)
    }

    /// Control channel, for the operator command surface.
    pub fn control(&self) -> mpsc::UnboundedSender<SessionControl> {
        self.control.clone()
    }

    /// New receiver of session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }
}

impl MessageSink for SessionHandle {
    fn send(&self, message: ClientMessage) -> Result<(), SessionError> {
        self.outbound.send(message).map_err(|_| SessionError::Closed)
    }
}

/// Why a connection ended without an error.
enum Exit {
    Shutdown,
    Disconnect,
    Reconnect(Option<String>),
}

/// What woke an offline wait.
enum Wake {
    Elapsed,
    Connect(Option<String>),
    Disconnect,
    Shutdown,
}

/// The session task.
pub struct RemoteSession {
    config: SessionConfig,
    address: String,
    uuid: String,
    state: SessionState,
    backoff: ReconnectBackoff,
    outbound: mpsc::UnboundedReceiver<ClientMessage>,
    outbound_open: bool,
    control: mpsc::UnboundedReceiver<SessionControl>,
    control_open: bool,
    snapshots: watch::Sender<SessionSnapshot>,
    shutdown: watch::Receiver<bool>,
}

impl RemoteSession {
    /// Create the task and its handle. Nothing happens until [`run`](Self::run).
    pub fn new(config: SessionConfig, shutdown: watch::Receiver<bool>) -> (Self, SessionHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let state = SessionState::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let session = Self {
            address: config.server.clone(),
            uuid: format!("{:032x}", rand::random::<u128>()),
            backoff: config.backoff.clone(),
            config,
            state,
            outbound: outbound_rx,
            outbound_open: true,
            control: control_rx,
            control_open: true,
            snapshots: snapshot_tx,
            shutdown,
        };
        let handle = SessionHandle {
            outbound: outbound_tx,
            control: control_tx,
            snapshots: snapshot_rx,
        };
        (session, handle)
    }

    /// Run until shutdown.
    ///
    /// Lost connections are retried with backoff. A refused slot or an
    /// operator `/disconnect` leaves the session offline until `/connect`.
    pub async fn run(mut self) {
        let mut online = self.config.connect_on_start;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            if !online {
                match self.wait_offline(None).await {
                    Wake::Connect(address) => {
                        self.retarget(address);
                        online = true;
                    }
                    Wake::Shutdown => break,
                    Wake::Elapsed | Wake::Disconnect => {}
                }
                continue;
            }

            let address = self.address.clone();
            let outcome = self.connect_and_serve(&address).await;
            self.go_offline();

            match outcome {
                Ok(Exit::Shutdown) => break,
                Ok(Exit::Disconnect) => {
                    info!("disconnected by operator");
                    online = false;
                }
                Ok(Exit::Reconnect(address)) => {
                    self.retarget(address);
                }
                Err(err) if !err.is_retryable() => {
                    error!(error = %err, "not reconnecting; use /connect to try again");
                    online = false;
                }
                Err(err) => {
                    let delay = self.backoff.next_delay();
                    warn!(
                        error = %err,
                        attempt = self.backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "connection failed, retrying"
                    );
                    match self.wait_offline(Some(delay)).await {
                        Wake::Elapsed => {}
                        Wake::Connect(address) => self.retarget(address),
                        Wake::Disconnect => online = false,
                        Wake::Shutdown => break,
                    }
                }
            }
        }

        self.go_offline();
        debug!("session task stopped");
    }

    fn retarget(&mut self, address: Option<String>) {
        if let Some(address) = address {
            self.address = address;
        }
        self.backoff.reset();
    }

    async fn open_socket(&self, address: &str) -> Result<Socket, SessionError> {
        let mut last_err = SessionError::InvalidAddress(address.to_string());
        for url in normalize_address(address)? {
            debug!(%url, "opening websocket");
            match tokio::time::timeout(self.config.handshake_timeout, connect_async(url.as_str())).await {
                Ok(Ok((socket, _response))) => return Ok(socket),
                Ok(Err(err)) => {
                    debug!(%url, error = %err, "websocket connect failed");
                    last_err = err.into();
                }
                Err(_) => last_err = SessionError::HandshakeTimeout,
            }
        }
        Err(last_err)
    }

    async fn connect_and_serve(&mut self, address: &str) -> Result<Exit, SessionError> {
        info!(server = %address, slot = %self.config.slot_name, "connecting");
        self.state.begin_connecting();
        self.publish();

        let socket = self.open_socket(address).await?;
        let (mut write, mut read) = socket.split();

        let handshake = tokio::time::sleep(self.config.handshake_timeout);
        tokio::pin!(handshake);

        loop {
            let connected = self.state.phase().is_connected();
            tokio::select! {
                _ = &mut handshake, if !connected => {
                    return Err(SessionError::HandshakeTimeout);
                }
                frame = read.next() => {
                    self.on_frame(&mut write, frame).await?;
                }
                message = self.outbound.recv(), if self.outbound_open && connected => match message {
                    Some(message) => self.forward(&mut write, message).await?,
                    None => self.outbound_open = false,
                },
                control = self.control.recv(), if self.control_open => match control {
                    Some(SessionControl::Disconnect) => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(Exit::Disconnect);
                    }
                    Some(SessionControl::Connect(address)) => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(Exit::Reconnect(address));
                    }
                    None => self.control_open = false,
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(Exit::Shutdown);
                    }
                }
            }
        }
    }

    async fn on_frame(
        &mut self,
        write: &mut SplitSink<Socket, Message>,
        frame: Option<Result<Message, tokio_tungstenite::tungstenite::Error>>,
    ) -> Result<(), SessionError> {
        match frame {
            Some(Ok(Message::Text(text))) => {
                for reply in self.handle_frame(&text)? {
                    send_packet(write, &reply).await?;
                }
                Ok(())
            }
            Some(Ok(Message::Close(_))) | None => {
                Err(SessionError::ConnectionLost("closed by server".into()))
            }
            Some(Ok(_)) => Ok(()),
            Some(Err(err)) => Err(err.into()),
        }
    }

    /// Apply one text frame, returning the packets to answer with.
    fn handle_frame(&mut self, text: &str) -> Result<Vec<ClientMessage>, SessionError> {
        let packets = match decode_packets(text) {
            Ok(packets) => packets,
            Err(err) => {
                warn!(error = %err, "ignoring malformed frame");
                return Ok(Vec::new());
            }
        };

        let mut replies = Vec::new();
        let mut changed = false;
        for packet in packets {
            let message = match packet {
                Ok(message) => message,
                Err(err) => {
                    warn!(error = %err, "ignoring malformed packet");
                    continue;
                }
            };
            let cmd = message.cmd();

            match message {
                ServerMessage::ConnectionRefused(refused) => {
                    return Err(SessionError::Refused(refused.errors));
                }
                ServerMessage::RoomInfo(info) => {
                    debug!(seed = %info.seed_name, "room info");
                    self.state.apply(ServerMessage::RoomInfo(info))?;
                    replies.push(ClientMessage::Connect(ConnectRequest::new(
                        self.config.slot_name.clone(),
                        self.config.password.as_deref(),
                        self.uuid.clone(),
                    )));
                }
                message => match self.state.apply(message) {
                    Ok(did_change) => {
                        changed |= did_change;
                        if cmd == "Connected" {
                            self.backoff.reset();
                            let snapshot = self.state.snapshot();
                            info!(
                                generation = snapshot.generation,
                                checked = snapshot.acknowledged_locations.len(),
                                "slot connected"
                            );
                        }
                    }
                    Err(err @ ProtocolError::IndexGap { .. }) => {
                        warn!(error = %err, "item list out of step, requesting sync");
                        replies.push(ClientMessage::Sync);
                    }
                    Err(err) => warn!(cmd, error = %err, "ignoring packet"),
                },
            }
        }

        if changed {
            self.publish();
        }
        Ok(replies)
    }

    async fn forward(
        &mut self,
        write: &mut SplitSink<Socket, Message>,
        message: ClientMessage,
    ) -> Result<(), SessionError> {
        send_packet(write, &message).await?;
        if message.is_goal() && self.state.mark_goal_reached() {
            info!("goal reported to server");
            self.publish();
        }
        Ok(())
    }

    /// Forget server state and drop anything queued for the old connection.
    fn go_offline(&mut self) {
        let mut dropped = 0usize;
        while let Ok(message) = self.outbound.try_recv() {
            debug!(cmd = message.cmd(), "dropping queued packet");
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, "outbound mailbox drained");
        }
        self.state.reset();
        self.publish();
    }

    async fn wait_offline(&mut self, delay: Option<Duration>) -> Wake {
        let sleep = async {
            match delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Wake::Elapsed,
                message = self.outbound.recv(), if self.outbound_open => match message {
                    Some(message) => debug!(cmd = message.cmd(), "not connected, dropping packet"),
                    None => self.outbound_open = false,
                },
                control = self.control.recv(), if self.control_open => match control {
                    Some(SessionControl::Connect(address)) => return Wake::Connect(address),
                    Some(SessionControl::Disconnect) => return Wake::Disconnect,
                    None => self.control_open = false,
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return Wake::Shutdown;
                    }
                }
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}

async fn send_packet(
    write: &mut SplitSink<Socket, Message>,
    message: &ClientMessage,
) -> Result<(), SessionError> {
    let text = encode_packets(std::slice::from_ref(message))?;
    debug!(cmd = message.cmd(), "sending");
    write.send(Message::Text(text)).await?;
    Ok(())
}

/// Websocket URLs to try for a user-supplied address, in order.
///
/// An address without a scheme tries `wss://` first, then `ws://`. A missing
/// port becomes the default server port.
pub fn normalize_address(address: &str) -> Result<Vec<String>, SessionError> {
    let trimmed = address.trim();
    let (schemes, rest): (&[&str], &str) = if let Some(rest) = trimmed.strip_prefix("wss://") {
        (&["wss"], rest)
    } else if let Some(rest) = trimmed.strip_prefix("ws://") {
        (&["ws"], rest)
    } else {
        (&["wss", "ws"], trimmed)
    };

    let host = rest.trim_end_matches('/');
    if host.is_empty() || host.contains("://") {
        return Err(SessionError::InvalidAddress(address.to_string()));
    }
    // IPv6 hosts need brackets, otherwise the port is ambiguous.
    if !host.starts_with('[') && host.matches(':').count() > 1 {
        return Err(SessionError::InvalidAddress(address.to_string()));
    }

    let host = if has_port(host) {
        host.to_string()
    } else {
        format!("{host}:{DEFAULT_SERVER_PORT}")
    };
    Ok(schemes.iter().map(|scheme| format!("{scheme}://{host}")).collect())
}

fn has_port(host: &str) -> bool {
    if let Some(end) = host.rfind(']') {
        return host[end + 1..].starts_with(':');
    }
    match host.rsplit_once(':') {
        Some((_, port)) => port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPhase;

    fn session() -> (RemoteSession, SessionHandle, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = SessionConfigBuilder::new()
            .server("localhost")
            .slot_name("Tav")
            .build();
        let (session, handle) = RemoteSession::new(config, shutdown_rx);
        (session, handle, shutdown_tx)
    }

    #[test]
    fn test_normalize_address_without_scheme() {
        assert_eq!(
            normalize_address("archipelago.gg").unwrap(),
            vec!["wss://archipelago.gg:38281", "ws://archipelago.gg:38281"]
        );
        assert_eq!(
            normalize_address("localhost:1234").unwrap(),
            vec!["wss://localhost:1234", "ws://localhost:1234"]
        );
    }

    #[test]
    fn test_normalize_address_with_scheme() {
        assert_eq!(
            normalize_address("ws://127.0.0.1:38281/").unwrap(),
            vec!["ws://127.0.0.1:38281"]
        );
        assert_eq!(
            normalize_address("wss://[::1]").unwrap(),
            vec!["wss://[::1]:38281"]
        );
    }

    #[test]
    fn test_normalize_address_rejects_empty() {
        assert!(normalize_address("  ").is_err());
        assert!(normalize_address("ws://").is_err());
    }

    #[test]
    fn test_normalize_address_rejects_bare_ipv6() {
        for bare in ["::1", "ws://::1", "fe80::1:38281"] {
            assert!(matches!(
                normalize_address(bare),
                Err(SessionError::InvalidAddress(a)) if a == bare
            ));
        }
        assert_eq!(
            normalize_address("[::1]:1234").unwrap(),
            vec!["wss://[::1]:1234", "ws://[::1]:1234"]
        );
    }

    #[test]
    fn test_room_info_answers_with_connect() {
        let (mut session, _handle, _shutdown) = session();
        let replies = session
            .handle_frame(r#"[{"cmd": "RoomInfo", "seed_name": "S"}]"#)
            .unwrap();

        assert_eq!(replies.len(), 1);
        match &replies[0] {
            ClientMessage::Connect(request) => {
                assert_eq!(request.name, "Tav");
                assert_eq!(request.uuid.len(), 32);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_refusal_is_an_error() {
        let (mut session, _handle, _shutdown) = session();
        let err = session
            .handle_frame(r#"[{"cmd": "ConnectionRefused", "errors": ["InvalidSlot"]}]"#)
            .unwrap_err();
        assert!(matches!(err, SessionError::Refused(errors) if errors == ["InvalidSlot"]));
    }

    #[test]
    fn test_connected_and_items_are_published() {
        let (mut session, handle, _shutdown) = session();
        session.state.begin_connecting();
        session
            .handle_frame(
                r#"[{"cmd": "Connected", "team": 0, "slot": 1, "checked_locations": [3], "slot_data": {"goal": 0}},
                    {"cmd": "ReceivedItems", "index": 0, "items": [{"item": 1, "location": 1, "player": 1, "flags": 0}]}]"#,
            )
            .unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Synced);
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.received_items, vec![1]);
        assert!(snapshot.acknowledged_locations.contains(&3));
    }

    #[test]
    fn test_index_gap_requests_sync() {
        let (mut session, handle, _shutdown) = session();
        session
            .handle_frame(r#"[{"cmd": "Connected", "team": 0, "slot": 1}]"#)
            .unwrap();
        let replies = session
            .handle_frame(
                r#"[{"cmd": "ReceivedItems", "index": 4, "items": [{"item": 1, "location": 1, "player": 1}]}]"#,
            )
            .unwrap();

        assert_eq!(replies, vec![ClientMessage::Sync]);
        assert!(handle.snapshot().received_items.is_empty());
    }

    #[test]
    fn test_go_offline_drains_mailbox_and_resets() {
        let (mut session, handle, _shutdown) = session();
        session
            .handle_frame(r#"[{"cmd": "Connected", "team": 0, "slot": 1, "checked_locations": [3]}]"#)
            .unwrap();
        handle.send(ClientMessage::Sync).unwrap();
        handle.send(ClientMessage::goal()).unwrap();

        session.go_offline();
        assert!(session.outbound.try_recv().is_err());
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Disconnected);
        assert!(snapshot.acknowledged_locations.is_empty());
    }

    type ServerSocket = WebSocketStream<TcpStream>;

    async fn accept(listener: &tokio::net::TcpListener) -> ServerSocket {
        let (stream, _) = listener.accept().await.unwrap();
        tokio_tungstenite::accept_async(stream).await.unwrap()
    }

    async fn send_frame(socket: &mut ServerSocket, frame: &str) {
        socket.send(Message::Text(frame.to_string())).await.unwrap();
    }

    /// Next packet the client sent, as JSON.
    async fn recv_packet(socket: &mut ServerSocket) -> serde_json::Value {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let Message::Text(text) = message {
                let mut packets: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
                assert_eq!(packets.len(), 1);
                return packets.remove(0);
            }
        }
    }

    async fn wait_snapshot(
        snapshots: &mut watch::Receiver<SessionSnapshot>,
        ready: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        tokio::time::timeout(Duration::from_secs(5), snapshots.wait_for(ready))
            .await
            .unwrap()
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_run_over_socket_reports_goal_and_reconnects() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = SessionConfigBuilder::new()
            .server(format!("ws://{}", listener.local_addr().unwrap()))
            .slot_name("Tav")
            .handshake_timeout(Duration::from_secs(5))
            .backoff(ReconnectBackoff::new(
                Duration::from_millis(10),
                Duration::from_millis(50),
                2,
            ))
            .build();
        let (session, handle) = RemoteSession::new(config, shutdown_rx);
        let mut snapshots = handle.subscribe();
        let task = tokio::spawn(session.run());

        let mut server = accept(&listener).await;
        send_frame(&mut server, r#"[{"cmd": "RoomInfo", "seed_name": "S1"}]"#).await;
        let connect = recv_packet(&mut server).await;
        assert_eq!(connect["cmd"], "Connect");
        assert_eq!(connect["name"], "Tav");
        assert_eq!(connect["items_handling"], 7);

        // Queued while the handshake is open; held until Connected.
        handle
            .send(ClientMessage::LocationChecks { locations: vec![1] })
            .unwrap();
        handle.send(ClientMessage::goal()).unwrap();
        assert!(
            tokio::time::timeout(Duration::from_millis(100), server.next())
                .await
                .is_err()
        );

        send_frame(
            &mut server,
            r#"[{"cmd": "Connected", "team": 0, "slot": 1, "checked_locations": [], "slot_data": {"goal": 0}}]"#,
        )
        .await;
        let checks = recv_packet(&mut server).await;
        assert_eq!(checks["cmd"], "LocationChecks");
        assert_eq!(checks["locations"], serde_json::json!([1]));
        let status = recv_packet(&mut server).await;
        assert_eq!(status["cmd"], "StatusUpdate");
        assert_eq!(status["status"], 30);

        let snapshot = wait_snapshot(&mut snapshots, |s| s.goal_reached).await;
        assert_eq!(snapshot.generation, 1);

        // Connection lost without a close frame.
        drop(server);
        let cleared = wait_snapshot(&mut snapshots, |s| !s.phase.is_connected()).await;
        assert!(!cleared.goal_reached);
        assert!(cleared.acknowledged_locations.is_empty());
        assert!(cleared.slot.is_none());

        let mut server = accept(&listener).await;
        send_frame(&mut server, r#"[{"cmd": "RoomInfo", "seed_name": "S1"}]"#).await;
        assert_eq!(recv_packet(&mut server).await["cmd"], "Connect");
        send_frame(
            &mut server,
            r#"[{"cmd": "Connected", "team": 0, "slot": 1, "checked_locations": [1], "slot_data": {"goal": 0}}]"#,
        )
        .await;

        let snapshot = wait_snapshot(&mut snapshots, |s| {
            s.generation == 2 && s.phase.is_connected()
        })
        .await;
        assert_eq!(snapshot.acknowledged_locations, std::collections::BTreeSet::from([1]));
        assert!(!snapshot.goal_reached);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_while_offline() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = SessionConfigBuilder::new()
            .server("localhost")
            .slot_name("Tav")
            .connect_on_start(false)
            .build();
        let (session, handle) = RemoteSession::new(config, shutdown_rx);

        let task = tokio::spawn(session.run());
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.disconnect().is_err());
    }
}
