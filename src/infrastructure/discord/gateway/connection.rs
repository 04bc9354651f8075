use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::codec::{EventParser, GatewayCodec};
use super::constants::{
    CONNECTION_TIMEOUT, GATEWAY_QUERY, GATEWAY_URL, GatewayIntents, GatewayOpcode,
    IDENTIFY_TIMEOUT,
};
use super::error::{GatewayError, GatewayResult};
use super::events::DispatchEvent;
use super::heartbeat::Heartbeat;
use super::payloads::{GatewayMessage, GatewayPayload};
use super::state::{ConnectionState, SessionState};
use crate::domain::ports::GatewayEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

/// Frame transport underneath a gateway session.
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()>;
    async fn disconnect(&mut self) -> GatewayResult<()>;
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>>;
    fn is_connected(&self) -> bool;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: GatewayCodec,
    connected: bool,
}

impl WebSocketConnection {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            codec: GatewayCodec::new(),
            connected: false,
        }
    }

    fn not_connected() -> GatewayError {
        GatewayError::connection_failed("websocket is not connected")
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()> {
        let url = gateway_url.map_or_else(
            || GATEWAY_URL.to_string(),
            |base| format!("{}{GATEWAY_QUERY}", base.trim_end_matches('/')),
        );

        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url.as_str()))
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;
        self.codec.reset();

        debug!(url = %url, "WebSocket connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        self.codec.reset();
        debug!("WebSocket connection closed");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or_else(Self::not_connected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))
    }

    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let reader = self.reader.as_mut().ok_or_else(Self::not_connected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(json) = self.codec.decode_binary(&data)? {
                        return EventParser::parse_message(&json).map(Some);
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    return EventParser::parse_message(&text).map(Some);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );
                    return Err(GatewayError::closed(code, reason));
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::websocket(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::closed(1006, "Stream ended"));
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Drives one gateway connection: handshake, heartbeats and dispatch.
///
/// Resume data lives in the [`SessionState`] handed in by the caller and is
/// returned by [`into_session`](Self::into_session) once the connection ends.
pub struct GatewayConnectionHandler {
    connection: Box<dyn GatewayConnection>,
    state: ConnectionState,
    session: SessionState,
    heartbeat: Option<Heartbeat>,
    token: String,
    intents: GatewayIntents,
    event_tx: mpsc::UnboundedSender<GatewayEvent>,
    shutdown: watch::Receiver<bool>,
}

impl GatewayConnectionHandler {
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        token: String,
        intents: GatewayIntents,
        session: SessionState,
        event_tx: mpsc::UnboundedSender<GatewayEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            connection,
            state: ConnectionState::Disconnected,
            session,
            heartbeat: None,
            token,
            intents,
            event_tx,
            shutdown,
        }
    }

    /// Opens the socket and completes Identify or Resume.
    pub async fn connect(&mut self) -> GatewayResult<()> {
        self.state = ConnectionState::Connecting;

        let resume_url = if self.session.can_resume() {
            self.session.resume_gateway_url().map(String::from)
        } else {
            None
        };
        self.connection.connect(resume_url.as_deref()).await?;

        self.state = ConnectionState::WaitingForHello;
        self.await_hello().await?;

        if let Some((session_id, sequence)) = self.session.resume_point() {
            self.state = ConnectionState::Resuming;
            let payload = GatewayPayload::resume(&self.token, session_id, sequence);
            debug!(session_id = %session_id, sequence, "Sending Resume");
            self.connection.send(&payload).await?;
        } else {
            self.state = ConnectionState::Identifying;
            let payload = GatewayPayload::identify(&self.token, self.intents.as_u32());
            debug!(intents = self.intents.as_u32(), "Sending Identify");
            self.connection.send(&payload).await?;
        }

        self.await_session().await
    }

    async fn await_hello(&mut self) -> GatewayResult<()> {
        let message = timeout(IDENTIFY_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Hello"))??
            .ok_or_else(|| GatewayError::protocol("Expected Hello message"))?;

        let opcode = GatewayOpcode::from_u8(message.op);
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let data = message
            .d
            .ok_or_else(|| GatewayError::protocol("Hello missing data"))?;
        let hello = EventParser::parse_hello(&data)?;

        debug!(interval_ms = hello.heartbeat_interval, "Received Hello");
        self.heartbeat = Some(Heartbeat::new(hello.heartbeat_interval));
        Ok(())
    }

    /// Processes frames until READY or RESUMED; replayed dispatches are forwarded.
    async fn await_session(&mut self) -> GatewayResult<()> {
        while self.state.is_handshaking() {
            let operation = self.state.to_string();
            let message = timeout(IDENTIFY_TIMEOUT, self.connection.receive())
                .await
                .map_err(|_| GatewayError::timeout(operation))??;

            if let Some(message) = message {
                self.handle_message(message).await?;
            }
        }
        Ok(())
    }

    /// Runs until the connection fails or shutdown is requested.
    pub async fn run(&mut self) -> GatewayResult<()> {
        let mut ticker = self
            .heartbeat
            .as_ref()
            .map(Heartbeat::ticker)
            .ok_or_else(|| GatewayError::protocol("Heartbeat interval unknown"))?;

        loop {
            tokio::select! {
                result = self.connection.receive() => {
                    if let Some(message) = result? {
                        self.handle_message(message).await?;
                    }
                }

                _ = ticker.tick() => {
                    self.send_heartbeat(false).await?;
                }

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        self.state = ConnectionState::ShuttingDown;
                        self.connection.disconnect().await?;
                        return Err(GatewayError::ShuttingDown);
                    }
                }
            }
        }
    }

    async fn send_heartbeat(&mut self, requested: bool) -> GatewayResult<()> {
        let sequence = self.session.sequence();
        let heartbeat = self
            .heartbeat
            .as_mut()
            .ok_or_else(|| GatewayError::protocol("Heartbeat interval unknown"))?;

        let payload = if requested {
            heartbeat.beat_now(sequence)
        } else {
            heartbeat.beat(sequence)?
        };

        trace!(sequence = ?sequence, requested, "Sending heartbeat");
        self.connection.send(&payload).await
    }

    async fn handle_message(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.session.observe_sequence(message.s);

        let opcode = GatewayOpcode::from_u8(message.op);
        match opcode {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = message.t.as_deref() {
                    trace!(event = event_type, "Dispatch received");
                    self.handle_dispatch(event_type, message.d);
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                if let Some(heartbeat) = self.heartbeat.as_mut() {
                    let latency = heartbeat.on_ack();
                    trace!(latency_ms = ?latency.map(|l| l.as_millis()), "Heartbeat acknowledged");
                }
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                self.send_heartbeat(true).await?;
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(GatewayError::closed(4000, "Reconnect requested"));
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                warn!(resumable, "Session invalidated");

                if !resumable {
                    self.session.clear();
                }
                return Err(GatewayError::SessionInvalidated { resumable });
            }
            _ => {
                debug!(opcode = ?opcode, raw = message.op, "Unhandled opcode");
            }
        }

        Ok(())
    }

    fn handle_dispatch(&mut self, event_type: &str, data: Option<serde_json::Value>) {
        let event = match EventParser::parse_dispatch(event_type, data) {
            Ok(event) => event,
            Err(e) => {
                warn!(event = event_type, error = %e, "Failed to parse dispatch event");
                return;
            }
        };

        match &event {
            DispatchEvent::Ready {
                session_id,
                resume_gateway_url,
                ..
            } => {
                self.session
                    .start(session_id.clone(), resume_gateway_url.clone());
                self.state = ConnectionState::Connected;
                info!(session_id = %session_id, "Gateway session established");
            }
            DispatchEvent::Resumed => {
                self.state = ConnectionState::Connected;
                info!("Gateway session resumed");
            }
            DispatchEvent::Unknown { event_type } => {
                trace!(event = %event_type, "Ignoring dispatch");
            }
            other => trace!(event = other.event_name(), "Forwarding dispatch"),
        }

        for domain_event in event.into_gateway_events() {
            let _ = self.event_tx.send(domain_event);
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn into_session(self) -> SessionState {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{Value, json};

    struct ScriptedConnection {
        inbound: VecDeque<GatewayResult<GatewayMessage>>,
        sent: Arc<Mutex<Vec<Value>>>,
        hang_when_drained: bool,
    }

    #[async_trait]
    impl GatewayConnection for ScriptedConnection {
        async fn connect(&mut self, _gateway_url: Option<&str>) -> GatewayResult<()> {
            Ok(())
        }

        async fn disconnect(&mut self) -> GatewayResult<()> {
            Ok(())
        }

        async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
            self.sent.lock().push(serde_json::to_value(payload).unwrap());
            Ok(())
        }

        async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
            match self.inbound.pop_front() {
                Some(next) => next.map(Some),
                None if self.hang_when_drained => std::future::pending().await,
                None => Err(GatewayError::closed(1000, "script ended")),
            }
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn frame(op: u8, t: Option<&str>, s: Option<u64>, d: Value) -> GatewayResult<GatewayMessage> {
        Ok(GatewayMessage {
            op,
            d: Some(d),
            s,
            t: t.map(String::from),
        })
    }

    fn hello() -> GatewayResult<GatewayMessage> {
        frame(10, None, None, json!({"heartbeat_interval": 45_000}))
    }

    fn ready(seq: u64) -> GatewayResult<GatewayMessage> {
        frame(
            0,
            Some("READY"),
            Some(seq),
            json!({
                "session_id": "sess",
                "resume_gateway_url": "wss://resume.test",
                "user": {"id": "99"}
            }),
        )
    }

    fn message_create(seq: u64, id: &str) -> GatewayResult<GatewayMessage> {
        frame(
            0,
            Some("MESSAGE_CREATE"),
            Some(seq),
            json!({"id": id, "channel_id": "5", "attachments": []}),
        )
    }

    struct Harness {
        handler: GatewayConnectionHandler,
        sent: Arc<Mutex<Vec<Value>>>,
        events: mpsc::UnboundedReceiver<GatewayEvent>,
        shutdown: watch::Sender<bool>,
    }

    fn harness(session: SessionState, script: Vec<GatewayResult<GatewayMessage>>) -> Harness {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let connection = ScriptedConnection {
            inbound: script.into(),
            sent: sent.clone(),
            hang_when_drained: false,
        };
        let (event_tx, events) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Harness {
            handler: GatewayConnectionHandler::new(
                Box::new(connection),
                "token".to_string(),
                GatewayIntents::default_bot(),
                session,
                event_tx,
                shutdown_rx,
            ),
            sent,
            events,
            shutdown: shutdown_tx,
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<GatewayEvent>) -> Vec<GatewayEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_identify_then_dispatch() {
        let mut h = harness(
            SessionState::new(),
            vec![hello(), ready(1), message_create(2, "700")],
        );

        h.handler.connect().await.unwrap();
        assert!(h.handler.state().is_connected());
        assert_eq!(h.sent.lock()[0]["op"], 2);

        let err = h.handler.run().await.unwrap_err();
        assert!(err.should_reconnect());

        let events = drain(&mut h.events);
        assert!(matches!(&events[0], GatewayEvent::Ready { user_id, .. } if user_id == "99"));
        assert!(matches!(&events[1], GatewayEvent::MessageCreate { .. }));
        assert_eq!(h.handler.into_session().resume_point(), Some(("sess", 2)));
    }

    #[tokio::test]
    async fn test_resume_forwards_replayed_events() {
        let mut session = SessionState::new();
        session.start("sess".into(), Some("wss://resume.test".into()));
        session.observe_sequence(Some(4));

        let mut h = harness(
            session,
            vec![
                hello(),
                message_create(5, "701"),
                frame(0, Some("RESUMED"), Some(6), Value::Null),
            ],
        );

        h.handler.connect().await.unwrap();

        let sent = h.sent.lock().clone();
        assert_eq!(sent[0]["op"], 6);
        assert_eq!(sent[0]["d"]["seq"], 4);

        let events = drain(&mut h.events);
        assert!(matches!(events[0], GatewayEvent::MessageCreate { .. }));
        assert!(matches!(events[1], GatewayEvent::Resumed));
        assert_eq!(h.handler.session().sequence(), Some(6));
    }

    #[tokio::test]
    async fn test_server_heartbeat_request_is_answered() {
        let mut h = harness(
            SessionState::new(),
            vec![hello(), ready(3), frame(1, None, None, Value::Null)],
        );

        h.handler.connect().await.unwrap();
        let _ = h.handler.run().await;

        let sent = h.sent.lock().clone();
        let beat = sent.iter().find(|p| p["op"] == 1).expect("heartbeat sent");
        assert_eq!(beat["d"], 3);
    }

    #[tokio::test]
    async fn test_invalid_session_clears_resume_data() {
        let mut session = SessionState::new();
        session.start("stale".into(), None);
        session.observe_sequence(Some(10));

        let mut h = harness(session, vec![hello(), frame(9, None, None, json!(false))]);

        let err = h.handler.connect().await.unwrap_err();
        assert!(matches!(err, GatewayError::SessionInvalidated { resumable: false }));
        assert!(!h.handler.session().can_resume());
    }

    #[tokio::test]
    async fn test_reconnect_request_ends_run() {
        let mut h = harness(
            SessionState::new(),
            vec![hello(), ready(1), frame(7, None, None, Value::Null)],
        );

        h.handler.connect().await.unwrap();
        let err = h.handler.run().await.unwrap_err();
        assert!(err.should_reconnect());
        assert!(err.can_resume());
    }

    #[tokio::test]
    async fn test_missing_hello_is_rejected() {
        let mut h = harness(SessionState::new(), vec![ready(1)]);
        let err = h.handler.connect().await.unwrap_err();
        assert!(matches!(err, GatewayError::UnexpectedOpcode { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_stops_run() {
        let mut h = harness(SessionState::new(), vec![hello(), ready(1)]);
        h.handler.connect().await.unwrap();

        h.handler.connection = Box::new(ScriptedConnection {
            inbound: VecDeque::new(),
            sent: h.sent.clone(),
            hang_when_drained: true,
        });
        h.shutdown.send(true).unwrap();

        let err = h.handler.run().await.unwrap_err();
        assert!(matches!(err, GatewayError::ShuttingDown));
        assert_eq!(h.handler.state(), ConnectionState::ShuttingDown);
    }

    #[test]
    fn test_websocket_connection_initial_state() {
        let conn = WebSocketConnection::new();
        assert!(!conn.is_connected());
    }
}
