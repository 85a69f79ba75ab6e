// ABOUTME: Chat session client for the WebSocket chat protocol
// ABOUTME: Handles authentication handshake, fire-and-forget sends, and the receive loop

use crate::error::{make_error_from_value, Error};
use crate::protocol::classify;
use crate::protocol::keys;
use crate::protocol::messages::{self, ChatMessage, Credentials};
use crate::transport::{websocket, FrameSink, FrameSource, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// State of an established session.
///
/// Connecting and authenticating happen inside [`Connector`], which returns
/// no [`Session`] on failure, so a session starts out `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Authenticated, sending and receiving
    Ready,
    /// A send faulted; later sends are dropped
    Failed,
}

/// Opens transports and runs the authentication handshake
#[derive(Debug, Clone)]
pub struct Connector {
    endpoint: String,
    handshake_timeout: Option<Duration>,
}

impl Connector {
    /// Connector for `endpoint` with no handshake timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handshake_timeout: None,
        }
    }

    /// Fail with [`Error::Timeout`] if the server does not answer the
    /// credentials within `timeout`.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// WebSocket URL this connector opens
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Connect over WebSocket and authenticate
    pub async fn connect(&self, credentials: Credentials) -> Result<Session, Error> {
        log::debug!("Connecting to {}", self.endpoint);

        let transport = websocket::connect(&self.endpoint).await.map_err(|e| {
            log::error!("Failed to connect to {}: {}", self.endpoint, e);
            e
        })?;

        self.handshake(credentials, transport).await
    }

    /// Authenticate over an already open transport.
    ///
    /// Sends the credentials frame, then consumes exactly one response. On
    /// any failure the transport is closed and no session is returned.
    pub async fn handshake(
        &self,
        credentials: Credentials,
        transport: Transport,
    ) -> Result<Session, Error> {
        let (mut sink, mut source) = transport.into_parts();

        log::debug!(
            "Authenticating as {} on {}",
            credentials.username,
            self.endpoint
        );

        match self
            .authenticate(&credentials, sink.as_mut(), source.as_mut())
            .await
        {
            Ok(chats) => {
                log::info!(
                    "Authenticated as {} on {} ({} backlog messages)",
                    credentials.username,
                    self.endpoint,
                    chats.len()
                );
                Ok(Session::new(
                    credentials.username,
                    self.endpoint.clone(),
                    chats,
                    sink,
                    source,
                ))
            }
            Err(e) => {
                log::warn!("Authentication on {} failed: {}", self.endpoint, e);
                if let Err(close_err) = sink.close().await {
                    log::debug!(
                        "Error closing transport after failed handshake: {}",
                        close_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
        sink: &mut dyn FrameSink,
        source: &mut dyn FrameSource,
    ) -> Result<Vec<ChatMessage>, Error> {
        sink.send(messages::credentials_frame(credentials)).await?;

        let response = match self.handshake_timeout {
            Some(timeout) => tokio::time::timeout(timeout, source.receive())
                .await
                .map_err(|_| Error::Timeout)??,
            None => source.receive().await?,
        };

        parse_auth_response(&response)
    }
}

/// Decode the handshake response into the backlog
fn parse_auth_response(raw: &str) -> Result<Vec<ChatMessage>, Error> {
    let data: Value = serde_json::from_str(raw).map_err(|_| Error::IncorrectFormat)?;

    if !classify::is_auth_success_message(&data) {
        return Err(make_error_from_value(classify::message_type(&data)));
    }

    let Some(entries) = data.get(keys::CHATS).and_then(Value::as_array) else {
        return Err(Error::IncorrectFormat);
    };

    entries
        .iter()
        .map(|entry| ChatMessage::from_json(entry).map_err(|_| Error::IncorrectFormat))
        .collect()
}

type SharedSource = Arc<tokio::sync::Mutex<Box<dyn FrameSource>>>;

/// An authenticated chat session
pub struct Session {
    username: String,
    endpoint: String,
    chats: Vec<ChatMessage>,

    /// Frames waiting for the writer task
    outbound: UnboundedSender<String>,
    writer: JoinHandle<()>,
    send_fault: Arc<Mutex<Option<Error>>>,

    /// Receive half, held by at most one running receive loop
    inbound: SharedSource,
}

impl Session {
    /// Connect to `endpoint` over WebSocket and authenticate
    pub async fn start(username: &str, password: &str, endpoint: &str) -> Result<Self, Error> {
        Connector::new(endpoint)
            .connect(Credentials::new(username, password))
            .await
    }

    fn new(
        username: String,
        endpoint: String,
        chats: Vec<ChatMessage>,
        sink: Box<dyn FrameSink>,
        source: Box<dyn FrameSource>,
    ) -> Self {
        let (outbound, queue) = unbounded_channel();
        let send_fault = Arc::new(Mutex::new(None));
        let writer = tokio::spawn(drain_outbound(sink, queue, Arc::clone(&send_fault)));

        Self {
            username,
            endpoint,
            chats,
            outbound,
            writer,
            send_fault,
            inbound: Arc::new(tokio::sync::Mutex::new(source)),
        }
    }

    /// Username the session authenticated as
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Endpoint the session is connected to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Backlog delivered by the server at authentication
    pub fn chats(&self) -> &[ChatMessage] {
        &self.chats
    }

    /// `Failed` once the writer has hit a transport fault
    pub fn state(&self) -> SessionState {
        if self.send_fault.lock().is_some() {
            SessionState::Failed
        } else {
            SessionState::Ready
        }
    }

    /// The transport error that stopped the writer, if any
    pub fn send_fault(&self) -> Option<Error> {
        self.send_fault.lock().clone()
    }

    /// Send a message to all users
    pub fn send_group_message(&self, msg: &str) {
        self.send_message(msg, None);
    }

    /// Send a message to a specific user
    pub fn send_direct_message(&self, msg: &str, dest: &str) {
        self.send_message(msg, Some(dest));
    }

    /// Queue a chat frame and return without waiting for the transport
    fn send_message(&self, msg: &str, dest: Option<&str>) {
        let message = ChatMessage {
            src: self.username.clone(),
            dst: dest.map(str::to_string),
            msg: msg.to_string(),
        };

        if self.outbound.send(messages::chat_frame(&message)).is_err() {
            log::warn!("Dropping chat message from {}: sender stopped", self.username);
        }
    }

    /// Build a receive loop that hands every inbound chat message to
    /// `on_chat_received`. Nothing is received until [`ReceiveLoop::run`].
    pub fn make_receive_loop<F>(&self, on_chat_received: F) -> ReceiveLoop<F>
    where
        F: FnMut(ChatMessage) + Send,
    {
        ReceiveLoop {
            source: Arc::clone(&self.inbound),
            on_chat_received,
        }
    }

    /// Flush queued sends and close the outbound direction.
    ///
    /// Returns the send fault, if one occurred. A running receive loop is
    /// not stopped; it ends once the peer closes its side.
    pub async fn close(self) -> Result<(), Error> {
        let Session {
            username,
            outbound,
            writer,
            send_fault,
            ..
        } = self;

        drop(outbound);
        if let Err(e) = writer.await {
            log::error!("Sender task for {} ended abnormally: {}", username, e);
        }

        let fault = send_fault.lock().take();
        fault.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("endpoint", &self.endpoint)
            .field("chats", &self.chats.len())
            .field("state", &self.state())
            .finish()
    }
}

/// Writer task: drains the outbound queue until the session closes or a send fails
async fn drain_outbound(
    mut sink: Box<dyn FrameSink>,
    mut queue: UnboundedReceiver<String>,
    send_fault: Arc<Mutex<Option<Error>>>,
) {
    while let Some(frame) = queue.recv().await {
        if let Err(e) = sink.send(frame).await {
            log::error!("Failed to send chat frame: {}", e);
            *send_fault.lock() = Some(e);
            return;
        }
    }

    if let Err(e) = sink.close().await {
        log::debug!("Error closing outbound transport: {}", e);
    }
    log::debug!("Outbound queue closed");
}

/// Long-running inbound frame processor for a [`Session`]
pub struct ReceiveLoop<F> {
    source: SharedSource,
    on_chat_received: F,
}

impl<F> ReceiveLoop<F>
where
    F: FnMut(ChatMessage) + Send,
{
    /// Receive and dispatch frames until a fatal error.
    ///
    /// Chat frames go to the callback in arrival order; other well-formed
    /// frames are dropped. A frame that is not a typed JSON mapping ends the
    /// loop with `Incorrect format`, and transport faults end it as-is. If
    /// another loop of the same session is running, this waits for it to end.
    pub async fn run(&mut self) -> Result<Infallible, Error> {
        let mut source = self.source.lock().await;

        loop {
            let raw = source.receive().await?;
            log::trace!("Raw frame: {}", raw);

            let frame = messages::parse_envelope(&raw)?;
            if !classify::is_chat_message(&frame) {
                log::debug!(
                    "Ignoring frame of type {}",
                    classify::message_type(&frame).unwrap_or(&Value::Null)
                );
                continue;
            }

            (self.on_chat_received)(ChatMessage::from_json(&frame)?);
        }
    }
}
