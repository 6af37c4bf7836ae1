use std::sync::{Arc, Mutex};

use crate::error::SessionError;
use crate::session::dispatch;
use crate::session::persist::PersistJob;
use crate::session::transcript::TranscriptBuffer;
use crate::session::turn::{TurnInput, TurnMachine, TurnStep};
use crate::session::{SessionObserver, SessionSnapshot};
use crate::types::events::client::ResponseCancelEvent;
use crate::types::{ClientEvent, ConnectionState, ConversationHandle, ServerEvent, TurnState};

/// Everything that can reach the session state, funneled through one queue.
///
/// Producers (the socket recv task, the playback callback, the persistence
/// worker, `disconnect()`) only ever enqueue. The engine task is the single
/// writer for turn and connection state, which is what makes every callback
/// fire on one serialized task.
#[derive(Debug)]
pub(crate) enum Signal {
    /// Transport finished connecting; the session is live.
    Connected,
    /// One inbound side-channel frame, still undecoded.
    Record(String),
    /// Playback activity from the output device callback: the RMS level of
    /// the window just played, 0.0 when the remote track is silent.
    Playback { level: f32 },
    /// The persistence worker lazily created the conversation.
    ConversationCreated(ConversationHandle),
    /// User-initiated teardown.
    Disconnect,
    /// The transport dropped out from under us.
    TransportClosed(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Shutdown,
}

pub(crate) struct Engine<O: SessionObserver> {
    observer: O,
    turn: TurnMachine,
    transcripts: TranscriptBuffer,
    persist_tx: tokio::sync::mpsc::Sender<PersistJob>,
    client_tx: Option<tokio::sync::mpsc::Sender<ClientEvent>>,
    snapshot: Arc<Mutex<SessionSnapshot>>,
    last_response_id: Option<String>,
    /// Remote audio is currently being played back.
    track_active: bool,
    /// We told the caller the assistant is speaking and have not yet told
    /// them it stopped.
    speaking_audible: bool,
    connect_fired: bool,
    disconnect_fired: bool,
    closing: bool,
    closed_by_error: bool,
}

impl<O: SessionObserver> Engine<O> {
    pub(crate) fn new(
        observer: O,
        persist_tx: tokio::sync::mpsc::Sender<PersistJob>,
        client_tx: Option<tokio::sync::mpsc::Sender<ClientEvent>>,
        snapshot: Arc<Mutex<SessionSnapshot>>,
    ) -> Self {
        Self {
            observer,
            turn: TurnMachine::new(),
            transcripts: TranscriptBuffer::new(),
            persist_tx,
            client_tx,
            snapshot,
            last_response_id: None,
            track_active: false,
            speaking_audible: false,
            connect_fired: false,
            disconnect_fired: false,
            closing: false,
            closed_by_error: false,
        }
    }

    pub(crate) fn handle(&mut self, signal: Signal) -> Flow {
        if self.closing {
            return Flow::Shutdown;
        }
        match signal {
            Signal::Connected => {
                if !self.connect_fired {
                    self.connect_fired = true;
                    self.turn.apply(TurnInput::Connected);
                    self.update_snapshot(|s| s.connection = ConnectionState::Connected);
                    self.sync_turn();
                    self.observer.on_connect();
                }
                Flow::Continue
            }
            Signal::Record(frame) => {
                for event in dispatch::decode_records(&frame) {
                    self.route(event);
                }
                Flow::Continue
            }
            Signal::Playback { level } => {
                self.on_playback(level);
                Flow::Continue
            }
            Signal::ConversationCreated(handle) => {
                self.update_snapshot(|s| s.conversation = Some(handle.clone()));
                self.observer.on_conversation_created(&handle);
                Flow::Continue
            }
            Signal::Disconnect => self.begin_close(None),
            Signal::TransportClosed(reason) => {
                let reason = reason.unwrap_or_else(|| "connection lost".to_string());
                self.begin_close(Some(SessionError::TransportClosed(reason)))
            }
        }
    }

    /// Routes one decoded side-channel event. This is the dispatcher's
    /// closed-set match: the `Unhandled` arm is a guaranteed no-op.
    fn route(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::SpeechStarted(_) => {
                tracing::debug!("user speech started");
                // Barge-in: the user is talking over the assistant. Ask the
                // server to truncate the in-flight response; the resulting
                // `response.cancelled` is what moves the turn machine.
                if self.turn.state() == TurnState::Speaking {
                    self.send_client_event(ClientEvent::ResponseCancel(cancel_event(
                        self.last_response_id.as_deref(),
                    )));
                }
            }
            ServerEvent::SpeechStopped(_) => {
                tracing::debug!("user speech stopped");
            }
            ServerEvent::BufferCommitted(_) => {
                if let TurnStep::Entered(TurnState::Thinking) =
                    self.turn.apply(TurnInput::BufferCommitted)
                {
                    self.sync_turn();
                }
            }
            ServerEvent::UserTranscriptDelta(ev) => {
                // Diagnostics only; partial user text is never buffered.
                self.observer.on_user_transcript(ev.delta(), false);
            }
            ServerEvent::UserTranscriptCompleted(ev) => {
                self.transcripts.set_user_final(ev.transcript());
                self.observer.on_user_transcript(ev.transcript(), true);
            }
            ServerEvent::ResponseCreated(ev) => {
                tracing::debug!("response created: {}", ev.response_id());
                self.last_response_id = Some(ev.response_id().to_string());
            }
            ServerEvent::AssistantTranscriptDelta(ev) => {
                self.assistant_evidence();
                self.transcripts.push_assistant_delta(ev.delta());
                self.observer.on_assistant_transcript(ev.delta(), false);
            }
            ServerEvent::AssistantTranscriptDone(ev) => {
                self.assistant_evidence();
                self.transcripts.set_assistant_final(ev.transcript());
                self.observer.on_assistant_transcript(ev.transcript(), true);
            }
            // Both mean "assistant stopped producing audio". They can repeat
            // within a turn and end only the audible indication; the turn
            // itself waits for `response.done`.
            ServerEvent::ResponseAudioDone(_) | ServerEvent::OutputAudioStopped(_) => {
                self.end_audible_speaking();
            }
            ServerEvent::ResponseDone(_) => {
                self.complete_turn();
            }
            ServerEvent::ResponseFailed(ev) => {
                tracing::warn!("response failed: {}", ev.error().message());
                self.abort_turn();
            }
            ServerEvent::ResponseCancelled(_) => {
                tracing::debug!("response cancelled");
                self.abort_turn();
            }
            ServerEvent::Error(ev) => {
                let error = SessionError::Server(ev.error().message().to_string());
                tracing::warn!("{}", error);
                self.observer.on_error(&error);
            }
            ServerEvent::Unhandled => {
                tracing::debug!("ignoring unhandled side-channel event");
            }
        }
    }

    fn on_playback(&mut self, level: f32) {
        if level > 0.0 {
            if !self.track_active {
                self.track_active = true;
                tracing::debug!("remote audio track active");
            }
            self.assistant_evidence();
        } else if self.track_active {
            self.track_active = false;
            tracing::debug!("remote audio track drained");
            self.end_audible_speaking();
        }
        let amplitude = if self.turn.state() == TurnState::Speaking {
            level
        } else {
            0.0
        };
        self.update_snapshot(|s| s.amplitude = amplitude);
    }

    /// The assistant is responding: move Thinking -> Speaking and raise the
    /// audible-speaking indication, both at most once per audible stretch.
    fn assistant_evidence(&mut self) {
        if let TurnStep::Entered(TurnState::Speaking) =
            self.turn.apply(TurnInput::AssistantEvidence)
        {
            self.sync_turn();
        }
        if self.turn.state() == TurnState::Speaking && !self.speaking_audible {
            self.speaking_audible = true;
            self.observer.on_speaking_start();
        }
    }

    fn end_audible_speaking(&mut self) {
        if self.speaking_audible {
            self.speaking_audible = false;
            self.observer.on_speaking_end();
        }
        self.update_snapshot(|s| s.amplitude = 0.0);
    }

    /// `response.done`: dispatch persistence, then and only then leave
    /// Speaking. Exactly one job per turn: the buffer was taken, so a
    /// straggling duplicate final cannot produce a second append pair.
    fn complete_turn(&mut self) {
        match self.turn.state() {
            TurnState::Thinking | TurnState::Speaking => {
                self.dispatch_persist();
                self.turn.apply(TurnInput::ResponseDone);
                self.sync_turn();
                self.end_audible_speaking();
                self.last_response_id = None;
                self.observer.on_turn_complete();
            }
            _ => {
                tracing::debug!("response done outside an active turn, ignoring");
            }
        }
    }

    /// `response.failed` / `response.cancelled`: drop the whole turn. A
    /// partial assistant reply is never persisted.
    fn abort_turn(&mut self) {
        match self.turn.state() {
            TurnState::Thinking | TurnState::Speaking => {
                self.transcripts.clear();
                self.turn.apply(TurnInput::ResponseAborted);
                self.sync_turn();
                self.end_audible_speaking();
                self.last_response_id = None;
            }
            _ => {}
        }
    }

    fn dispatch_persist(&mut self) {
        let (user_text, assistant_text) = self.transcripts.take();
        if user_text.is_empty() && assistant_text.is_empty() {
            return;
        }
        let job = PersistJob {
            user_text,
            assistant_text,
        };
        // Fire-and-forget: the engine never waits on the store.
        if let Err(e) = self.persist_tx.try_send(job) {
            tracing::warn!("failed to queue completed turn for persistence: {}", e);
        }
    }

    fn begin_close(&mut self, error: Option<SessionError>) -> Flow {
        self.closing = true;
        // Dropping our side-channel sender is part of closing it.
        self.client_tx = None;
        self.update_snapshot(|s| s.connection = ConnectionState::Closing);
        if let Some(error) = error {
            self.closed_by_error = true;
            tracing::warn!("{}", error);
            self.observer.on_error(&error);
        }
        self.turn.apply(TurnInput::Disconnected);
        self.sync_turn();
        self.transcripts.clear();
        self.track_active = false;
        self.speaking_audible = false;
        Flow::Shutdown
    }

    /// Called by the session runner after transport teardown finished.
    /// Fires `on_disconnect` exactly once no matter how often teardown runs.
    pub(crate) fn finish_disconnect(&mut self) {
        if self.disconnect_fired {
            return;
        }
        self.disconnect_fired = true;
        let final_state = if self.closed_by_error {
            ConnectionState::Error
        } else {
            ConnectionState::Closed
        };
        self.update_snapshot(|s| {
            s.connection = final_state;
            s.amplitude = 0.0;
        });
        self.observer.on_disconnect();
    }

    fn send_client_event(&self, event: ClientEvent) {
        if let Some(tx) = &self.client_tx {
            if let Err(e) = tx.try_send(event) {
                tracing::warn!("failed to send client event: {}", e);
            }
        }
    }

    fn sync_turn(&self) {
        let turn = self.turn.state();
        self.update_snapshot(|s| {
            s.turn = turn;
            if turn != TurnState::Speaking {
                s.amplitude = 0.0;
            }
        });
    }

    fn update_snapshot(&self, apply: impl FnOnce(&mut SessionSnapshot)) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            apply(&mut snapshot);
        }
    }
}

fn cancel_event(response_id: Option<&str>) -> ResponseCancelEvent {
    match response_id {
        Some(id) => ResponseCancelEvent::new().with_response_id(id),
        None => ResponseCancelEvent::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl SessionObserver for Recorder {
        fn on_connect(&mut self) {
            self.events.push("connect".to_string());
        }
        fn on_disconnect(&mut self) {
            self.events.push("disconnect".to_string());
        }
        fn on_error(&mut self, error: &SessionError) {
            self.events.push(format!("error:{}", error));
        }
        fn on_user_transcript(&mut self, text: &str, is_final: bool) {
            self.events.push(format!("user[{}]:{}", is_final, text));
        }
        fn on_assistant_transcript(&mut self, text: &str, is_final: bool) {
            self.events.push(format!("assistant[{}]:{}", is_final, text));
        }
        fn on_speaking_start(&mut self) {
            self.events.push("speaking_start".to_string());
        }
        fn on_speaking_end(&mut self) {
            self.events.push("speaking_end".to_string());
        }
        fn on_turn_complete(&mut self) {
            self.events.push("turn_complete".to_string());
        }
        fn on_conversation_created(&mut self, conversation: &ConversationHandle) {
            self.events.push(format!("conversation:{}", conversation));
        }
    }

    struct Harness {
        engine: Engine<Recorder>,
        persist_rx: tokio::sync::mpsc::Receiver<PersistJob>,
        client_rx: tokio::sync::mpsc::Receiver<ClientEvent>,
        snapshot: Arc<Mutex<SessionSnapshot>>,
    }

    impl Harness {
        fn new() -> Self {
            let (persist_tx, persist_rx) = tokio::sync::mpsc::channel(8);
            let (client_tx, client_rx) = tokio::sync::mpsc::channel(8);
            let snapshot = Arc::new(Mutex::new(SessionSnapshot {
                connection: ConnectionState::Connecting,
                turn: TurnState::Idle,
                amplitude: 0.0,
                conversation: None,
            }));
            let engine = Engine::new(
                Recorder::default(),
                persist_tx,
                Some(client_tx),
                snapshot.clone(),
            );
            Self {
                engine,
                persist_rx,
                client_rx,
                snapshot,
            }
        }

        fn connected() -> Self {
            let mut harness = Self::new();
            harness.engine.handle(Signal::Connected);
            harness
        }

        fn record(&mut self, json: &str) {
            self.engine.handle(Signal::Record(json.to_string()));
        }

        fn turn(&self) -> TurnState {
            self.engine.turn.state()
        }

        fn observed(&self) -> &[String] {
            &self.engine.observer.events
        }

        fn count(&self, entry: &str) -> usize {
            self.observed().iter().filter(|e| *e == entry).count()
        }

        fn snapshot(&self) -> SessionSnapshot {
            self.snapshot.lock().unwrap().clone()
        }
    }

    #[test]
    fn scripted_turn_persists_one_user_and_one_assistant_message() {
        let mut h = Harness::connected();
        assert_eq!(h.turn(), TurnState::Listening);

        h.record(r#"{"type":"input_audio_buffer.speech_started","event_id":"ev_1","audio_start_ms":120}"#);
        h.record(r#"{"type":"input_audio_buffer.speech_stopped","event_id":"ev_2","audio_end_ms":2120}"#);
        assert_eq!(h.turn(), TurnState::Listening);

        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_3","item_id":"item_1"}"#);
        assert_eq!(h.turn(), TurnState::Thinking);

        h.record(r#"{"type":"conversation.item.input_audio_transcription.completed","event_id":"ev_4","item_id":"item_1","transcript":"I feel anxious today"}"#);
        h.record(r#"{"type":"response.created","event_id":"ev_5","response_id":"resp_1"}"#);

        for (i, delta) in ["I ", "hear ", "you."].iter().enumerate() {
            h.record(&format!(
                r#"{{"type":"response.audio_transcript.delta","event_id":"ev_{}","response_id":"resp_1","delta":"{}"}}"#,
                6 + i,
                delta
            ));
        }
        assert_eq!(h.turn(), TurnState::Speaking);
        assert_eq!(h.count("speaking_start"), 1);

        // The final repeats the streamed content and arrives together with
        // response.done; that must not duplicate anything.
        h.record(r#"{"type":"response.audio_transcript.done","event_id":"ev_9","response_id":"resp_1","transcript":"I hear you."}"#);
        h.record(r#"{"type":"response.done","event_id":"ev_10","response_id":"resp_1"}"#);

        assert_eq!(h.turn(), TurnState::Listening);
        assert_eq!(h.count("turn_complete"), 1);

        let job = h.persist_rx.try_recv().expect("one persistence job");
        assert_eq!(job.user_text, "I feel anxious today");
        assert_eq!(job.assistant_text, "I hear you.");
        assert!(h.persist_rx.try_recv().is_err(), "exactly one job");
        assert!(h.engine.transcripts.is_empty(), "buffer reset after persistence");
    }

    #[test]
    fn response_failure_discards_partial_assistant_transcript() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        h.record(r#"{"type":"conversation.item.input_audio_transcription.completed","event_id":"ev_2","item_id":"item_1","transcript":"tell me more"}"#);
        h.record(r#"{"type":"response.audio_transcript.delta","event_id":"ev_3","response_id":"resp_1","delta":"Well"}"#);
        assert_eq!(h.turn(), TurnState::Speaking);

        h.record(r#"{"type":"response.failed","event_id":"ev_4","response_id":"resp_1","error":{"message":"overloaded"}}"#);
        assert_eq!(h.turn(), TurnState::Listening);
        assert!(h.persist_rx.try_recv().is_err(), "nothing persisted");
        assert!(h.engine.transcripts.is_empty(), "buffer cleared");
    }

    #[test]
    fn unknown_event_types_do_not_disturb_valid_transitions() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"rate_limits.updated","event_id":"ev_1","limits":[1,2,3]}"#);
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_2","item_id":"item_1"}"#);
        h.record(r#"{"type":"totally.new.event","event_id":"ev_3","payload":{"deep":true}}"#);
        assert_eq!(h.turn(), TurnState::Thinking);
        assert!(
            !h.observed().iter().any(|e| e.starts_with("error:")),
            "unknown events never reach the error callback"
        );
    }

    #[test]
    fn server_error_event_is_surfaced_and_session_stays_open() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"error","event_id":"ev_1","error":{"code":"session_expired_soon","message":"wrapping up"}}"#);
        assert_eq!(h.count("error:server error: wrapping up"), 1);
        assert_eq!(h.turn(), TurnState::Listening);
        assert_eq!(h.snapshot().connection, ConnectionState::Connected);
    }

    #[test]
    fn disconnect_is_idempotent_and_fires_once() {
        let mut h = Harness::connected();
        assert_eq!(h.engine.handle(Signal::Disconnect), Flow::Shutdown);
        h.engine.finish_disconnect();
        assert_eq!(h.engine.handle(Signal::Disconnect), Flow::Shutdown);
        h.engine.finish_disconnect();

        assert_eq!(h.count("disconnect"), 1);
        assert_eq!(h.turn(), TurnState::Idle);
        assert_eq!(h.snapshot().connection, ConnectionState::Closed);
    }

    #[test]
    fn disconnect_while_connecting_fires_exactly_one_callback() {
        let mut h = Harness::new();
        assert_eq!(h.engine.handle(Signal::Disconnect), Flow::Shutdown);
        h.engine.finish_disconnect();
        // A late Connected signal from the transport must not revive the session.
        assert_eq!(h.engine.handle(Signal::Connected), Flow::Shutdown);
        assert_eq!(h.count("disconnect"), 1);
        assert_eq!(h.count("connect"), 0);
    }

    #[test]
    fn remote_track_activity_drives_speaking_but_never_completes_the_turn() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        assert_eq!(h.turn(), TurnState::Thinking);

        h.engine.handle(Signal::Playback { level: 0.4 });
        assert_eq!(h.turn(), TurnState::Speaking);
        assert_eq!(h.count("speaking_start"), 1);
        assert_eq!(h.snapshot().amplitude, 0.4);

        // Track drains: audible indication ends, the turn does not.
        h.engine.handle(Signal::Playback { level: 0.0 });
        assert_eq!(h.count("speaking_end"), 1);
        assert_eq!(h.turn(), TurnState::Speaking);
        assert_eq!(h.snapshot().amplitude, 0.0);

        h.record(r#"{"type":"response.done","event_id":"ev_2","response_id":"resp_1"}"#);
        assert_eq!(h.turn(), TurnState::Listening);
    }

    #[test]
    fn audio_done_hints_may_repeat_without_side_effects() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        h.record(r#"{"type":"response.audio_transcript.delta","event_id":"ev_2","response_id":"resp_1","delta":"Hi"}"#);

        h.record(r#"{"type":"response.audio.done","event_id":"ev_3","response_id":"resp_1"}"#);
        h.record(r#"{"type":"output_audio_buffer.speech_stopped","event_id":"ev_4"}"#);
        h.record(r#"{"type":"response.audio.done","event_id":"ev_5","response_id":"resp_1"}"#);

        assert_eq!(h.count("speaking_end"), 1);
        assert_eq!(h.turn(), TurnState::Speaking, "hints never exit Speaking");
    }

    #[test]
    fn amplitude_is_gated_to_the_speaking_state() {
        let mut h = Harness::connected();
        // Trailing audio while Listening must not leak into the amplitude
        // signal or raise a speaking callback.
        h.engine.handle(Signal::Playback { level: 0.8 });
        assert_eq!(h.snapshot().amplitude, 0.0);
        assert_eq!(h.count("speaking_start"), 0);
        assert_eq!(h.turn(), TurnState::Listening);
    }

    #[test]
    fn barge_in_requests_response_cancel() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        h.record(r#"{"type":"response.created","event_id":"ev_2","response_id":"resp_1"}"#);
        h.record(r#"{"type":"response.audio_transcript.delta","event_id":"ev_3","response_id":"resp_1","delta":"Let me"}"#);
        assert_eq!(h.turn(), TurnState::Speaking);

        h.record(r#"{"type":"input_audio_buffer.speech_started","event_id":"ev_4","audio_start_ms":5000}"#);
        match h.client_rx.try_recv() {
            Ok(ClientEvent::ResponseCancel(cancel)) => {
                assert_eq!(cancel.response_id(), Some("resp_1"))
            }
            other => panic!("expected a response.cancel, got {:?}", other),
        }

        // Server confirms the truncation.
        h.record(r#"{"type":"response.cancelled","event_id":"ev_5","response_id":"resp_1"}"#);
        assert_eq!(h.turn(), TurnState::Listening);
        assert!(h.persist_rx.try_recv().is_err(), "truncated turn not persisted");
    }

    #[test]
    fn transport_loss_surfaces_one_error_then_one_disconnect() {
        let mut h = Harness::connected();
        assert_eq!(
            h.engine
                .handle(Signal::TransportClosed(Some("tls reset".to_string()))),
            Flow::Shutdown
        );
        h.engine.finish_disconnect();

        assert_eq!(h.count("error:transport closed: tls reset"), 1);
        assert_eq!(h.count("disconnect"), 1);
        assert_eq!(h.snapshot().connection, ConnectionState::Error);
    }

    #[test]
    fn next_turn_starts_with_an_empty_buffer() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        h.record(r#"{"type":"conversation.item.input_audio_transcription.completed","event_id":"ev_2","item_id":"item_1","transcript":"first"}"#);
        h.record(r#"{"type":"response.done","event_id":"ev_3","response_id":"resp_1"}"#);
        let _ = h.persist_rx.try_recv().expect("first turn persisted");

        // Before the next Listening -> Thinking transition the buffer is empty.
        assert!(h.engine.transcripts.is_empty());
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_4","item_id":"item_2"}"#);
        assert_eq!(h.turn(), TurnState::Thinking);
        assert_eq!(h.engine.transcripts.user_text(), "");
    }

    #[test]
    fn turn_without_any_text_persists_nothing() {
        let mut h = Harness::connected();
        h.record(r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#);
        h.record(r#"{"type":"response.done","event_id":"ev_2","response_id":"resp_1"}"#);
        assert_eq!(h.turn(), TurnState::Listening);
        assert!(h.persist_rx.try_recv().is_err());
        assert_eq!(h.count("turn_complete"), 1);
    }

    #[test]
    fn conversation_creation_reaches_observer_and_snapshot() {
        let mut h = Harness::connected();
        h.engine.handle(Signal::ConversationCreated(ConversationHandle::new(
            "conv_7",
        )));
        assert_eq!(h.count("conversation:conv_7"), 1);
        assert_eq!(
            h.snapshot().conversation,
            Some(ConversationHandle::new("conv_7"))
        );
    }
}
