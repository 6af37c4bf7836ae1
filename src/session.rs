use std::sync::{Arc, Mutex};

use crate::error::{ConnectError, SessionError};
use crate::session::engine::{Engine, Flow, Signal};
use crate::session::persist::{ConversationStore, PersistenceBridge};
use crate::transport;
use crate::types::{
    CaptureOptions, ConnectionState, ConversationHandle, SessionCredential, TurnState,
};

pub(crate) mod dispatch;
pub(crate) mod engine;
pub mod persist;
pub(crate) mod transcript;
pub(crate) mod turn;

const SIGNALING_URL_ENV: &str = "SOLACE_SIGNALING_URL";
const MEDIA_URL_ENV: &str = "SOLACE_MEDIA_URL";
const DEFAULT_SIGNALING_URL: &str = "https://realtime.solace.chat/v1/calls";
const DEFAULT_MEDIA_URL: &str = "wss://realtime.solace.chat/v1/media";

/// Caller-facing callback surface. Every method fires on the single
/// serialized engine task, so implementations may hold plain mutable state.
/// All methods default to no-ops; implement what you need.
pub trait SessionObserver: Send + 'static {
    fn on_connect(&mut self) {}
    fn on_disconnect(&mut self) {}
    fn on_error(&mut self, _error: &SessionError) {}
    fn on_user_transcript(&mut self, _text: &str, _is_final: bool) {}
    fn on_assistant_transcript(&mut self, _text: &str, _is_final: bool) {}
    fn on_speaking_start(&mut self) {}
    fn on_speaking_end(&mut self) {}
    fn on_turn_complete(&mut self) {}
    fn on_conversation_created(&mut self, _conversation: &ConversationHandle) {}
}

/// Point-in-time copy of the session state. External readers only ever see
/// these copies; the live state belongs to the engine task.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub connection: ConnectionState,
    pub turn: TurnState,
    /// Engine-gated playback level for the visualizer: nonzero only while
    /// the assistant is speaking.
    pub amplitude: f32,
    pub conversation: Option<ConversationHandle>,
}

/// Configuration for one voice session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    signaling_url: String,
    media_url: String,
    conversation: Option<ConversationHandle>,
    capture: CaptureOptions,
    input_device: Option<String>,
    output_device: Option<String>,
    queue_capacity: usize,
}

pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::new(),
        }
    }

    pub fn with_signaling_url(mut self, url: &str) -> Self {
        self.config.signaling_url = url.to_string();
        self
    }

    pub fn with_media_url(mut self, url: &str) -> Self {
        self.config.media_url = url.to_string();
        self
    }

    /// Binds this session to an existing conversation, e.g. when
    /// reconnecting. Without it the conversation is created lazily on the
    /// first completed turn.
    pub fn with_conversation(mut self, conversation: ConversationHandle) -> Self {
        self.config.conversation = Some(conversation);
        self
    }

    pub fn with_capture_options(mut self, capture: CaptureOptions) -> Self {
        self.config.capture = capture;
        self
    }

    pub fn with_input_device(mut self, name: &str) -> Self {
        self.config.input_device = Some(name.to_string());
        self
    }

    pub fn with_output_device(mut self, name: &str) -> Self {
        self.config.output_device = Some(name.to_string());
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self {
            signaling_url: std::env::var(SIGNALING_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_SIGNALING_URL.to_string()),
            media_url: std::env::var(MEDIA_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_MEDIA_URL.to_string()),
            conversation: None,
            capture: CaptureOptions::default(),
            input_device: None,
            output_device: None,
            queue_capacity: 256,
        }
    }

    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    pub fn signaling_url(&self) -> &str {
        &self.signaling_url
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub fn conversation(&self) -> Option<&ConversationHandle> {
        self.conversation.as_ref()
    }

    pub fn capture(&self) -> CaptureOptions {
        self.capture
    }

    pub fn input_device(&self) -> Option<&str> {
        self.input_device.as_deref()
    }

    pub fn output_device(&self) -> Option<&str> {
        self.output_device.as_deref()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one live voice session.
///
/// Dropping the handle tears the session down the same way `disconnect()`
/// does; the engine task notices the closed queue and runs the same path.
pub struct VoiceSession {
    signal_tx: tokio::sync::mpsc::Sender<Signal>,
    snapshot: Arc<Mutex<SessionSnapshot>>,
    task: tokio::task::JoinHandle<()>,
}

impl VoiceSession {
    /// Establishes the session: audio capture, signaling handshake, media
    /// socket, and the engine task, in that order. The credential is
    /// consumed: on any error the caller must acquire a fresh one.
    pub async fn connect<O: SessionObserver>(
        config: SessionConfig,
        credential: SessionCredential,
        observer: O,
        store: Arc<dyn ConversationStore>,
    ) -> Result<VoiceSession, ConnectError> {
        let (signal_tx, signal_rx) = tokio::sync::mpsc::channel(config.queue_capacity);
        let snapshot = Arc::new(Mutex::new(SessionSnapshot {
            connection: ConnectionState::Connecting,
            turn: TurnState::Idle,
            amplitude: 0.0,
            conversation: config.conversation.clone(),
        }));

        let transport = transport::connect(&config, &credential, signal_tx.clone()).await?;
        let bridge = PersistenceBridge::spawn(store, config.conversation.clone(), signal_tx.clone());
        let engine = Engine::new(
            observer,
            bridge.sender(),
            transport.client_sender(),
            snapshot.clone(),
        );

        let task = tokio::spawn(run_session(engine, signal_rx, transport, bridge));
        Ok(VoiceSession {
            signal_tx,
            snapshot,
            task,
        })
    }

    /// Requests teardown. Safe to call from any state and any number of
    /// times; after the first teardown the engine is gone and the request is
    /// simply dropped. Never waits for a `response.done` that may not come.
    pub async fn disconnect(&self) {
        let _ = self.signal_tx.send(Signal::Disconnect).await;
    }

    /// Waits until teardown, including the persistence drain, has finished.
    pub async fn closed(self) {
        let _ = self.task.await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        match self.snapshot.lock() {
            Ok(snapshot) => snapshot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

async fn run_session<O: SessionObserver>(
    mut engine: Engine<O>,
    mut signal_rx: tokio::sync::mpsc::Receiver<Signal>,
    mut transport: transport::LiveTransport,
    bridge: PersistenceBridge,
) {
    // The transport is up; this is the first and only place on_connect fires.
    engine.handle(Signal::Connected);

    loop {
        // A closed queue means the handle was dropped; same path as an
        // explicit disconnect.
        let signal = match signal_rx.recv().await {
            Some(signal) => signal,
            None => Signal::Disconnect,
        };
        if engine.handle(signal) == Flow::Shutdown {
            break;
        }
    }

    transport.shutdown().await;
    // Turns completed right before teardown still reach the store.
    bridge.finish().await;
    engine.finish_disconnect();
}
