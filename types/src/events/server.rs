/// Payload of the generic `error` event and of `response.failed`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    message: String,
}

impl ErrorDetails {
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `input_audio_buffer.speech_started` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SpeechStartedEvent {
    event_id: String,
    /// Milliseconds into the session when speech was detected
    audio_start_ms: i64,
}

impl SpeechStartedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_start_ms(&self) -> i64 {
        self.audio_start_ms
    }
}

/// `input_audio_buffer.speech_stopped` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SpeechStoppedEvent {
    event_id: String,
    /// Milliseconds into the session when speech stopped
    audio_end_ms: i64,
}

impl SpeechStoppedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn audio_end_ms(&self) -> i64 {
        self.audio_end_ms
    }
}

/// `input_audio_buffer.committed` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BufferCommittedEvent {
    event_id: String,
    /// The user utterance item the committed audio will become
    item_id: String,
}

impl BufferCommittedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

/// `conversation.item.input_audio_transcription.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserTranscriptDeltaEvent {
    event_id: String,
    item_id: String,
    delta: String,
}

impl UserTranscriptDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `conversation.item.input_audio_transcription.completed` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserTranscriptCompletedEvent {
    event_id: String,
    item_id: String,
    /// The full transcribed user utterance
    transcript: String,
}

impl UserTranscriptCompletedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `response.created` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCreatedEvent {
    event_id: String,
    response_id: String,
}

impl ResponseCreatedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }
}

/// `response.audio_transcript.delta` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssistantTranscriptDeltaEvent {
    event_id: String,
    response_id: String,
    /// Incremental assistant text
    delta: String,
}

impl AssistantTranscriptDeltaEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn delta(&self) -> &str {
        &self.delta
    }
}

/// `response.audio_transcript.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssistantTranscriptDoneEvent {
    event_id: String,
    response_id: String,
    /// The authoritative full assistant transcript for this response
    transcript: String,
}

impl AssistantTranscriptDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}

/// `response.audio.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseAudioDoneEvent {
    event_id: String,
    response_id: String,
}

impl ResponseAudioDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }
}

/// `output_audio_buffer.speech_stopped` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OutputAudioStoppedEvent {
    event_id: String,
}

impl OutputAudioStoppedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }
}

/// `response.done` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseDoneEvent {
    event_id: String,
    response_id: String,
}

impl ResponseDoneEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }
}

/// `response.failed` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseFailedEvent {
    event_id: String,
    response_id: String,
    error: ErrorDetails,
}

impl ResponseFailedEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}

/// `response.cancelled` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ResponseCancelledEvent {
    event_id: String,
    response_id: String,
}

impl ResponseCancelledEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }
}

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServerErrorEvent {
    event_id: String,
    error: ErrorDetails,
}

impl ServerErrorEvent {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn error(&self) -> &ErrorDetails {
        &self.error
    }
}
