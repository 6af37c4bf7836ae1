use crate::types::TurnState;

/// Inputs that can move the turn machine. Everything else the session sees
/// is deliberately not a turn input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnInput {
    /// Transport reached the connected state.
    Connected,
    /// `input_audio_buffer.committed`: the user utterance is complete.
    BufferCommitted,
    /// First sign of the assistant responding: remote audio becoming active
    /// or the first assistant transcript event, whichever lands first.
    AssistantEvidence,
    /// `response.done`: the single authoritative turn completion.
    ResponseDone,
    /// `response.failed` or `response.cancelled`.
    ResponseAborted,
    /// Connection teardown, user- or server-initiated.
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnStep {
    Entered(TurnState),
    Ignored,
}

/// The conversational turn-taking machine.
///
/// Only the session engine task applies inputs, so transitions are serialized
/// by construction. Remote audio ending is never an input here: the only way
/// out of Speaking is `ResponseDone` or `ResponseAborted`, because track end
/// and transcript completion can race or go missing entirely.
#[derive(Debug)]
pub(crate) struct TurnMachine {
    state: TurnState,
}

impl TurnMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: TurnState::Idle,
        }
    }

    pub(crate) fn state(&self) -> TurnState {
        self.state
    }

    pub(crate) fn apply(&mut self, input: TurnInput) -> TurnStep {
        use TurnInput::*;
        use TurnState::*;

        let next = match (self.state, input) {
            (Idle, Connected) => Some(Listening),
            (Listening, BufferCommitted) => Some(Thinking),
            (Thinking, AssistantEvidence) => Some(Speaking),
            // A response can complete without the assistant ever producing
            // audio or transcript; `response.done` still ends the turn.
            (Thinking | Speaking, ResponseDone) => Some(Listening),
            (Thinking | Speaking, ResponseAborted) => Some(Listening),
            (_, Disconnected) => Some(Idle),
            _ => None,
        };

        match next {
            Some(state) if state != self.state => {
                tracing::debug!("turn state {:?} -> {:?}", self.state, state);
                self.state = state;
                TurnStep::Entered(state)
            }
            Some(_) => TurnStep::Ignored,
            None => TurnStep::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(state: TurnState) -> TurnMachine {
        let mut machine = TurnMachine::new();
        match state {
            TurnState::Idle => {}
            TurnState::Listening => {
                machine.apply(TurnInput::Connected);
            }
            TurnState::Thinking => {
                machine.apply(TurnInput::Connected);
                machine.apply(TurnInput::BufferCommitted);
            }
            TurnState::Speaking => {
                machine.apply(TurnInput::Connected);
                machine.apply(TurnInput::BufferCommitted);
                machine.apply(TurnInput::AssistantEvidence);
            }
        }
        assert_eq!(machine.state(), state);
        machine
    }

    #[test]
    fn happy_path_turn_cycle() {
        let mut machine = TurnMachine::new();
        assert_eq!(
            machine.apply(TurnInput::Connected),
            TurnStep::Entered(TurnState::Listening)
        );
        assert_eq!(
            machine.apply(TurnInput::BufferCommitted),
            TurnStep::Entered(TurnState::Thinking)
        );
        assert_eq!(
            machine.apply(TurnInput::AssistantEvidence),
            TurnStep::Entered(TurnState::Speaking)
        );
        assert_eq!(
            machine.apply(TurnInput::ResponseDone),
            TurnStep::Entered(TurnState::Listening)
        );
    }

    #[test]
    fn speaking_only_exits_on_done_or_abort() {
        let mut machine = machine_in(TurnState::Speaking);
        // These must all be no-ops: audio ending never completes a turn.
        assert_eq!(machine.apply(TurnInput::Connected), TurnStep::Ignored);
        assert_eq!(machine.apply(TurnInput::BufferCommitted), TurnStep::Ignored);
        assert_eq!(
            machine.apply(TurnInput::AssistantEvidence),
            TurnStep::Ignored
        );
        assert_eq!(machine.state(), TurnState::Speaking);

        assert_eq!(
            machine.apply(TurnInput::ResponseAborted),
            TurnStep::Entered(TurnState::Listening)
        );
    }

    #[test]
    fn undefined_inputs_are_ignored_in_every_state() {
        for (state, input) in [
            (TurnState::Idle, TurnInput::BufferCommitted),
            (TurnState::Idle, TurnInput::AssistantEvidence),
            (TurnState::Idle, TurnInput::ResponseDone),
            (TurnState::Idle, TurnInput::ResponseAborted),
            (TurnState::Listening, TurnInput::AssistantEvidence),
            (TurnState::Listening, TurnInput::ResponseDone),
            (TurnState::Listening, TurnInput::ResponseAborted),
            (TurnState::Thinking, TurnInput::BufferCommitted),
        ] {
            let mut machine = machine_in(state);
            assert_eq!(machine.apply(input), TurnStep::Ignored, "{state:?}/{input:?}");
            assert_eq!(machine.state(), state);
        }
    }

    #[test]
    fn disconnect_resets_from_any_state() {
        for state in [
            TurnState::Idle,
            TurnState::Listening,
            TurnState::Thinking,
            TurnState::Speaking,
        ] {
            let mut machine = machine_in(state);
            machine.apply(TurnInput::Disconnected);
            assert_eq!(machine.state(), TurnState::Idle);
        }
    }

    #[test]
    fn failed_response_returns_to_listening_from_thinking() {
        let mut machine = machine_in(TurnState::Thinking);
        assert_eq!(
            machine.apply(TurnInput::ResponseAborted),
            TurnStep::Entered(TurnState::Listening)
        );
    }
}
