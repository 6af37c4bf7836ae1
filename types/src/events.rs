pub mod client;
mod server;

use client::*;
use server::*;

pub use server::ErrorDetails;

/// Events this engine sends over the side-channel.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "response.cancel")]
    ResponseCancel(ResponseCancelEvent),
}

/// The closed set of side-channel events this engine consumes.
///
/// Decoded from record-delimited JSON. Anything with a `type` outside this
/// set lands on `Unhandled`, which every consumer treats as a no-op; that is
/// what keeps newer servers from breaking older clients.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted(SpeechStartedEvent),
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped(SpeechStoppedEvent),
    /// Authoritative "user turn ended" signal; `speech_stopped` is not.
    #[serde(rename = "input_audio_buffer.committed")]
    BufferCommitted(BufferCommittedEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.delta")]
    UserTranscriptDelta(UserTranscriptDeltaEvent),
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    UserTranscriptCompleted(UserTranscriptCompletedEvent),
    #[serde(rename = "response.created")]
    ResponseCreated(ResponseCreatedEvent),
    #[serde(rename = "response.audio_transcript.delta")]
    AssistantTranscriptDelta(AssistantTranscriptDeltaEvent),
    #[serde(rename = "response.audio_transcript.done")]
    AssistantTranscriptDone(AssistantTranscriptDoneEvent),
    /// Assistant stopped producing audio. May repeat within a turn and never
    /// completes it; only `response.done` does.
    #[serde(rename = "response.audio.done")]
    ResponseAudioDone(ResponseAudioDoneEvent),
    #[serde(rename = "output_audio_buffer.speech_stopped")]
    OutputAudioStopped(OutputAudioStoppedEvent),
    /// Authoritative turn completion.
    #[serde(rename = "response.done")]
    ResponseDone(ResponseDoneEvent),
    #[serde(rename = "response.failed")]
    ResponseFailed(ResponseFailedEvent),
    #[serde(rename = "response.cancelled")]
    ResponseCancelled(ResponseCancelledEvent),
    #[serde(rename = "error")]
    Error(ServerErrorEvent),
    #[serde(other)]
    Unhandled,
}
