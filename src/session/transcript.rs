/// Per-turn transcript accumulation. Exactly one buffer is open per
/// connection; it is taken (and thereby reset) when the turn completes and
/// cleared outright when a response fails or is cancelled.
#[derive(Debug, Default)]
pub(crate) struct TranscriptBuffer {
    user_text: String,
    assistant_text: String,
}

impl TranscriptBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Final user transcripts overwrite; the recognizer re-sends the whole
    /// utterance, so concatenating finals would duplicate it. Partials never
    /// land here at all.
    pub(crate) fn set_user_final(&mut self, transcript: &str) {
        self.user_text = transcript.trim().to_string();
    }

    /// Assistant text streams in as increments.
    pub(crate) fn push_assistant_delta(&mut self, delta: &str) {
        self.assistant_text.push_str(delta);
    }

    /// The final assistant transcript replaces whatever accumulated, so a
    /// final that repeats the streamed content cannot double it.
    pub(crate) fn set_assistant_final(&mut self, transcript: &str) {
        self.assistant_text = transcript.to_string();
    }

    pub(crate) fn user_text(&self) -> &str {
        &self.user_text
    }

    pub(crate) fn assistant_text(&self) -> &str {
        &self.assistant_text
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.user_text.is_empty() && self.assistant_text.is_empty()
    }

    /// Takes both texts and leaves the buffer empty for the next turn.
    pub(crate) fn take(&mut self) -> (String, String) {
        (
            std::mem::take(&mut self.user_text),
            std::mem::take(&mut self.assistant_text),
        )
    }

    pub(crate) fn clear(&mut self) {
        self.user_text.clear();
        self.assistant_text.clear();
    }
}
