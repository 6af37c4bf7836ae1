use crate::error::ConnectError;
use crate::session::engine::Signal;
use crate::session::SessionConfig;
use crate::signaling::SignalingClient;
use crate::types::{AudioCaps, ClientEvent, LocalDescription, SessionCredential};
use crate::utils;

pub(crate) mod audio;
pub(crate) mod channel;

use ringbuf::traits::Split;

/// Resampler chunk size on the playback path.
const PLAYBACK_RESAMPLE_CHUNK: usize = 100;

/// One live media transport: audio pipelines, socket, and wire pumps.
///
/// Owned by the session task. The credential used to build it is gone by the
/// time this exists; reconnecting means a fresh credential and a fresh one
/// of these.
pub(crate) struct LiveTransport {
    channel: channel::MediaChannel,
    pipelines: audio::Pipelines,
    capture_pump: Option<tokio::task::JoinHandle<()>>,
    playback_feed: Option<tokio::task::JoinHandle<()>>,
}

/// Turns a valid credential into a live bidirectional audio+event session.
///
/// Order matters and follows the session contract: local audio first, then
/// the transport object with its side-channel, then the authenticated
/// description exchange, then the wire pumps. Any failure tears down what
/// already started; nothing leaks into a second attempt.
pub(crate) async fn connect(
    config: &SessionConfig,
    credential: &SessionCredential,
    signal_tx: tokio::sync::mpsc::Sender<Signal>,
) -> Result<LiveTransport, ConnectError> {
    if credential.is_expired() {
        return Err(ConnectError::HandshakeFailed(
            "credential expired before the handshake began".to_string(),
        ));
    }

    // (a) Exclusive ownership of the local audio path for this connection.
    let setup = audio::discover_devices(
        config.input_device().map(str::to_string),
        config.output_device().map(str::to_string),
    )?;
    let input_rate = setup.input_sample_rate();
    let output_rate = setup.output_sample_rate();

    let ring = utils::audio::shared_buffer(output_rate as usize * audio::OUTPUT_LATENCY_MS / 1000);
    let (playback_producer, playback_consumer) = ring.split();
    let (mic_tx, mic_rx) = tokio::sync::mpsc::channel::<Vec<f32>>(64);

    let activity_tx = signal_tx.clone();
    let mut pipelines =
        tokio::task::spawn_blocking(move || audio::start(setup, mic_tx, playback_consumer, activity_tx))
            .await
            .map_err(|e| ConnectError::Transport(format!("audio startup task failed: {}", e)))??;

    // (b) + (c) The transport object; its text frames are the side-channel.
    let (playback_bytes_tx, playback_bytes_rx) = tokio::sync::mpsc::channel::<Vec<u8>>(64);
    let mut media = match channel::MediaChannel::open(
        config.media_url(),
        credential,
        signal_tx.clone(),
        playback_bytes_tx,
    )
    .await
    {
        Ok(media) => media,
        Err(e) => {
            pipelines.stop();
            return Err(e);
        }
    };

    // (d) Authenticated description exchange, bounded by the credential's
    // remaining validity. An expiry mid-handshake fails the attempt; the
    // stale credential is never retried.
    let offer = LocalDescription::offer(
        AudioCaps::pcm16(utils::audio::WIRE_SAMPLE_RATE as u32),
        config.capture(),
    );
    let signaling = SignalingClient::new(config.signaling_url());
    let remote = match tokio::time::timeout(
        credential.time_to_expiry(),
        signaling.exchange(credential, &offer),
    )
    .await
    {
        Ok(Ok(remote)) => remote,
        Ok(Err(e)) => {
            abort_partial(pipelines, media).await;
            return Err(e);
        }
        Err(_) => {
            abort_partial(pipelines, media).await;
            return Err(ConnectError::HandshakeFailed(
                "credential expired during the handshake".to_string(),
            ));
        }
    };

    if remote.audio().format() != "pcm16" {
        abort_partial(pipelines, media).await;
        return Err(ConnectError::HandshakeFailed(format!(
            "remote answered with unsupported audio format '{}'",
            remote.audio().format()
        )));
    }
    tracing::info!("remote description applied, session {}", remote.session_id());

    // (e) Wire pumps; from here on, remote audio feeding the playback path
    // is what the engine reads as "assistant audio available".
    let in_resampler = match utils::audio::create_resampler(
        input_rate,
        utils::audio::WIRE_SAMPLE_RATE,
        audio::INPUT_CHUNK_SIZE,
    ) {
        Ok(resampler) => resampler,
        Err(e) => {
            abort_partial(pipelines, media).await;
            return Err(ConnectError::Transport(e.to_string()));
        }
    };
    let out_resampler = match utils::audio::create_resampler(
        utils::audio::WIRE_SAMPLE_RATE,
        output_rate,
        PLAYBACK_RESAMPLE_CHUNK,
    ) {
        Ok(resampler) => resampler,
        Err(e) => {
            abort_partial(pipelines, media).await;
            return Err(ConnectError::Transport(e.to_string()));
        }
    };

    let audio_tx = match media.audio_sender() {
        Some(audio_tx) => audio_tx,
        None => {
            abort_partial(pipelines, media).await;
            return Err(ConnectError::Transport(
                "media channel closed during connect".to_string(),
            ));
        }
    };

    let capture_pump = audio::spawn_capture_pump(mic_rx, audio_tx, in_resampler);
    let playback_feed =
        audio::spawn_playback_feed(playback_bytes_rx, playback_producer, out_resampler);

    Ok(LiveTransport {
        channel: media,
        pipelines,
        capture_pump: Some(capture_pump),
        playback_feed: Some(playback_feed),
    })
}

impl LiveTransport {
    pub(crate) fn client_sender(&self) -> Option<tokio::sync::mpsc::Sender<ClientEvent>> {
        self.channel.client_sender()
    }

    /// Teardown order: event side-channel, then local track media, then the
    /// transport object. Every step is independently guarded; one failing
    /// step never blocks the rest, and running it twice is harmless.
    pub(crate) async fn shutdown(&mut self) {
        self.channel.close_side_channel();

        // Dropping the streams on their owning thread releases the capture
        // device before any new attempt can want it.
        if let Some(join) = self.pipelines.stop() {
            let _ = tokio::task::spawn_blocking(move || {
                let _ = join.join();
            })
            .await;
        }
        if let Some(pump) = self.capture_pump.take() {
            pump.abort();
        }
        if let Some(feed) = self.playback_feed.take() {
            feed.abort();
        }

        self.channel.shutdown().await;
    }
}

async fn abort_partial(mut pipelines: audio::Pipelines, mut media: channel::MediaChannel) {
    if let Some(join) = pipelines.stop() {
        let _ = tokio::task::spawn_blocking(move || {
            let _ = join.join();
        })
        .await;
    }
    media.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn expired_credential_fails_before_any_resource_is_acquired() {
        let now = Utc::now();
        let stale = SessionCredential::new(
            "tok",
            "sess_1",
            "companion-realtime",
            "warm",
            now - Duration::seconds(300),
            now - Duration::seconds(60),
        );
        let config = SessionConfig::new();
        let (signal_tx, _signal_rx) = tokio::sync::mpsc::channel(8);

        match connect(&config, &stale, signal_tx).await {
            Err(ConnectError::HandshakeFailed(reason)) => {
                assert!(reason.contains("expired"))
            }
            other => panic!("expected a handshake failure, got {:?}", other.map(|_| ())),
        }
    }
}
