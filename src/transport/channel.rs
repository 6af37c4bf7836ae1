use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

use crate::error::ConnectError;
use crate::session::engine::Signal;
use crate::types::{ClientEvent, SessionCredential};

const AUTHORIZATION_HEADER: &str = "Authorization";

/// The transport object: one socket carrying both media directions.
///
/// Text frames are the structured-event side-channel (record-delimited
/// JSON); binary frames are PCM16 audio: the remote track inbound, the
/// local track outbound. Dedicated send/recv tasks keep the socket off the
/// engine task entirely.
pub(crate) struct MediaChannel {
    client_tx: Option<tokio::sync::mpsc::Sender<ClientEvent>>,
    audio_tx: Option<tokio::sync::mpsc::Sender<Vec<u8>>>,
    send_handle: Option<tokio::task::JoinHandle<()>>,
    recv_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MediaChannel {
    pub(crate) async fn open(
        media_url: &str,
        credential: &SessionCredential,
        signal_tx: tokio::sync::mpsc::Sender<Signal>,
        playback_tx: tokio::sync::mpsc::Sender<Vec<u8>>,
    ) -> Result<Self, ConnectError> {
        let url = format!(
            "{}?model={}&call={}",
            media_url,
            credential.model(),
            credential.session_id()
        );
        let mut request = url
            .into_client_request()
            .map_err(|e| ConnectError::Transport(format!("bad media url: {}", e)))?;
        request.headers_mut().insert(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", credential.token().expose_secret())
                .parse()
                .map_err(|e| ConnectError::Transport(format!("bad auth header: {}", e)))?,
        );

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ConnectError::Transport(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (client_tx, mut client_rx) = tokio::sync::mpsc::channel::<ClientEvent>(64);
        let (audio_tx, mut audio_rx) = tokio::sync::mpsc::channel::<Vec<u8>>(64);

        let send_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = client_rx.recv() => match event {
                        Some(event) => match serde_json::to_string(&event) {
                            Ok(text) => {
                                if let Err(e) = write.send(Message::Text(text)).await {
                                    tracing::error!("failed to send event: {}", e);
                                    break;
                                }
                            }
                            Err(e) => tracing::error!("failed to serialize event: {}", e),
                        },
                        None => break,
                    },
                    frame = audio_rx.recv() => match frame {
                        Some(pcm) => {
                            if let Err(e) = write.send(Message::Binary(pcm)).await {
                                tracing::error!("failed to send audio frame: {}", e);
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            let _ = write.send(Message::Close(None)).await;
        });

        let recv_handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        let _ = signal_tx
                            .send(Signal::TransportClosed(Some(e.to_string())))
                            .await;
                        break;
                    }
                };
                match message {
                    Message::Text(frame) => {
                        if signal_tx.send(Signal::Record(frame)).await.is_err() {
                            break;
                        }
                    }
                    Message::Binary(frame) => {
                        // Never stall event delivery behind a full playback
                        // queue; late audio is worthless anyway.
                        if playback_tx.try_send(frame).is_err() {
                            tracing::warn!("playback queue full, dropping audio frame");
                        }
                    }
                    Message::Close(frame) => {
                        let reason = frame.map(|f| f.reason.into_owned());
                        let _ = signal_tx.send(Signal::TransportClosed(reason)).await;
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self {
            client_tx: Some(client_tx),
            audio_tx: Some(audio_tx),
            send_handle: Some(send_handle),
            recv_handle: Some(recv_handle),
        })
    }

    pub(crate) fn client_sender(&self) -> Option<tokio::sync::mpsc::Sender<ClientEvent>> {
        self.client_tx.clone()
    }

    pub(crate) fn audio_sender(&self) -> Option<tokio::sync::mpsc::Sender<Vec<u8>>> {
        self.audio_tx.clone()
    }

    /// Closes the event side-channel. First teardown step; the socket itself
    /// stays up until `shutdown`.
    pub(crate) fn close_side_channel(&mut self) {
        self.client_tx.take();
    }

    /// Closes the socket. The send task drains, emits a close frame and
    /// exits once every sender is gone; the recv task is cut loose.
    pub(crate) async fn shutdown(&mut self) {
        self.client_tx.take();
        self.audio_tx.take();
        if let Some(mut handle) = self.send_handle.take() {
            if tokio::time::timeout(std::time::Duration::from_millis(500), &mut handle)
                .await
                .is_err()
            {
                handle.abort();
            }
        }
        if let Some(handle) = self.recv_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for MediaChannel {
    fn drop(&mut self) {
        if let Some(handle) = self.send_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.recv_handle.take() {
            handle.abort();
        }
    }
}
