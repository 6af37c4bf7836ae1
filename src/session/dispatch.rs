use crate::types::ServerEvent;

/// Decodes one side-channel frame into protocol events.
///
/// A frame carries one or more newline-delimited JSON records. Unknown
/// `type` values decode to `ServerEvent::Unhandled` and flow through as
/// guaranteed no-ops; records that fail to decode at all are dropped
/// per-record. Neither case is ever fatal; a malformed record must not
/// desynchronize the turn machine.
pub(crate) fn decode_records(frame: &str) -> Vec<ServerEvent> {
    frame
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(decode_record)
        .collect()
}

fn decode_record(raw: &str) -> Option<ServerEvent> {
    match serde_json::from_str::<ServerEvent>(raw) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("dropping malformed side-channel record: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_event_decodes() {
        let events = decode_records(
            r#"{"type":"input_audio_buffer.committed","event_id":"ev_1","item_id":"item_1"}"#,
        );
        assert!(matches!(events.as_slice(), [ServerEvent::BufferCommitted(_)]));
    }

    #[test]
    fn unknown_type_becomes_unhandled_not_an_error() {
        let events = decode_records(r#"{"type":"session.heartbeat","event_id":"ev_2"}"#);
        assert!(matches!(events.as_slice(), [ServerEvent::Unhandled]));
    }

    #[test]
    fn malformed_record_is_dropped_without_affecting_neighbors() {
        let frame = concat!(
            r#"{"type":"input_audio_buffer.speech_started","event_id":"ev_1","audio_start_ms":10}"#,
            "\n",
            r#"{"type":"input_audio_buffer.committed","event_id":"ev_2"}"#, // missing item_id
            "\n",
            r#"{"type":"response.created","event_id":"ev_3","response_id":"resp_1"}"#,
        );
        let events = decode_records(frame);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ServerEvent::SpeechStarted(_)));
        assert!(matches!(events[1], ServerEvent::ResponseCreated(_)));
    }

    #[test]
    fn non_json_noise_is_dropped() {
        assert!(decode_records("not json at all").is_empty());
        assert!(decode_records("").is_empty());
        assert!(decode_records("\n\n").is_empty());
    }
}
