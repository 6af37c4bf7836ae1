/// Capture-side audio processing requested from the device/driver stack and
/// advertised to the remote endpoint in the local description.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct CaptureOptions {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

/// Negotiated audio parameters for one direction of the media stream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AudioCaps {
    format: String,
    sample_rate: u32,
    channels: u16,
}

impl AudioCaps {
    pub fn pcm16(sample_rate: u32) -> Self {
        Self {
            format: "pcm16".to_string(),
            sample_rate,
            channels: 1,
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// The local session description POSTed to the signaling endpoint.
///
/// Opaque to everything outside the transport; the remote endpoint is the
/// only other party that interprets it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LocalDescription {
    kind: String,
    audio: AudioCaps,
    processing: CaptureOptions,
}

impl LocalDescription {
    pub fn offer(audio: AudioCaps, processing: CaptureOptions) -> Self {
        Self {
            kind: "offer".to_string(),
            audio,
            processing,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn audio(&self) -> &AudioCaps {
        &self.audio
    }

    pub fn processing(&self) -> &CaptureOptions {
        &self.processing
    }
}

/// The remote session description returned by a 2xx signaling response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RemoteDescription {
    kind: String,
    session_id: String,
    audio: AudioCaps,
}

impl RemoteDescription {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn audio(&self) -> &AudioCaps {
        &self.audio
    }

    pub fn is_answer(&self) -> bool {
        self.kind == "answer"
    }
}
