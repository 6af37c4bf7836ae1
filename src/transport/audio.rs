use std::collections::VecDeque;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use ringbuf::traits::{Consumer, Producer};
use rubato::Resampler;

use crate::error::ConnectError;
use crate::session::engine::Signal;
use crate::utils;

/// Microphone chunk size, in frames, fed to the input resampler.
pub(crate) const INPUT_CHUNK_SIZE: usize = 1024;
/// Playback chunk size, in frames, pulled by the output stream.
pub(crate) const OUTPUT_CHUNK_SIZE: usize = 1024;
/// Depth of the playback ring buffer.
pub(crate) const OUTPUT_LATENCY_MS: usize = 1000;

/// Devices and stream configs resolved before the pipelines spin up.
pub(crate) struct DeviceSetup {
    input: cpal::Device,
    output: cpal::Device,
    input_config: StreamConfig,
    output_config: StreamConfig,
}

impl DeviceSetup {
    pub(crate) fn input_sample_rate(&self) -> f64 {
        self.input_config.sample_rate.0 as f64
    }

    pub(crate) fn output_sample_rate(&self) -> f64 {
        self.output_config.sample_rate.0 as f64
    }
}

/// Resolves capture and playback devices. Failing to reach the microphone is
/// the user-actionable `PermissionDenied`; a broken output path is not.
pub(crate) fn discover_devices(
    input_name: Option<String>,
    output_name: Option<String>,
) -> Result<DeviceSetup, ConnectError> {
    let input = utils::device::get_or_default_input(input_name)
        .map_err(|e| ConnectError::PermissionDenied(e.to_string()))?;
    let input_config = input
        .default_input_config()
        .map_err(|e| ConnectError::PermissionDenied(e.to_string()))?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };

    let output = utils::device::get_or_default_output(output_name)
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    let output_config = output
        .default_output_config()
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };

    Ok(DeviceSetup {
        input,
        output,
        input_config,
        output_config,
    })
}

/// Capture and playback streams, alive on their own thread.
///
/// cpal streams cannot change threads, so a dedicated thread owns both for
/// the life of the connection and drops them on stop, which is also what
/// releases the capture device for the next connection attempt.
pub(crate) struct Pipelines {
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl Pipelines {
    /// Signals the audio thread to drop both streams and hands the join
    /// handle to the caller, who decides whether to wait.
    pub(crate) fn stop(&mut self) -> Option<std::thread::JoinHandle<()>> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.thread.take()
    }
}

impl Drop for Pipelines {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

/// Builds and starts both streams. Blocking (device I/O plus a readiness
/// wait); call it through `spawn_blocking`.
pub(crate) fn start(
    setup: DeviceSetup,
    mic_tx: tokio::sync::mpsc::Sender<Vec<f32>>,
    playback_rx: ringbuf::HeapCons<f32>,
    signal_tx: tokio::sync::mpsc::Sender<Signal>,
) -> Result<Pipelines, ConnectError> {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), ConnectError>>();
    let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

    let thread = std::thread::Builder::new()
        .name("voice-audio".to_string())
        .spawn(move || match build_streams(setup, mic_tx, playback_rx, signal_tx) {
            Ok(streams) => {
                let _ = ready_tx.send(Ok(()));
                let _ = stop_rx.recv();
                drop(streams);
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        })
        .map_err(|e| ConnectError::Transport(format!("failed to spawn audio thread: {}", e)))?;

    match ready_rx.recv_timeout(std::time::Duration::from_secs(5)) {
        Ok(Ok(())) => Ok(Pipelines {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ConnectError::Transport(
            "audio pipelines did not start in time".to_string(),
        )),
    }
}

fn build_streams(
    setup: DeviceSetup,
    mic_tx: tokio::sync::mpsc::Sender<Vec<f32>>,
    mut playback_rx: ringbuf::HeapCons<f32>,
    signal_tx: tokio::sync::mpsc::Sender<Signal>,
) -> Result<(cpal::Stream, cpal::Stream), ConnectError> {
    let input_channel_count = setup.input_config.channels as usize;
    tracing::info!("input stream config: {:?}", &setup.input_config);

    // Mixes the capture frame down to mono and hands it to the pump task.
    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let audio = if input_channel_count > 1 {
            data.chunks(input_channel_count)
                .map(|c| c.iter().sum::<f32>() / input_channel_count as f32)
                .collect::<Vec<f32>>()
        } else {
            data.to_vec()
        };
        if let Err(e) = mic_tx.try_send(audio) {
            tracing::warn!("failed to send capture frame to pump: {:?}", e);
        }
    };

    let input_stream = setup
        .input
        .build_input_stream(
            &setup.input_config,
            input_data_fn,
            move |err| tracing::error!("an error occurred on the input stream: {}", err),
            None,
        )
        .map_err(|e| ConnectError::PermissionDenied(e.to_string()))?;
    input_stream
        .play()
        .map_err(|e| ConnectError::PermissionDenied(e.to_string()))?;

    let output_channel_count = setup.output_config.channels as usize;
    tracing::info!("output stream config: {:?}", &setup.output_config);

    // Pulls remote-track samples from the ring buffer and reports playback
    // activity into the signal queue: a fully silent window means the track
    // drained, anything else carries its RMS level.
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let frames = data.len() / output_channel_count.max(1);
        let mut mono = Vec::with_capacity(frames);
        let mut silence = 0usize;
        let mut sample_index = 0;
        while sample_index < data.len() {
            let sample = playback_rx.try_pop().unwrap_or(0.0);
            if sample == 0.0 {
                silence += 1;
            }
            mono.push(sample);
            // Left channel (ch:0).
            if sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // Right channel (ch:1), if it exists.
            if output_channel_count > 1 && sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // Ignore other channels.
            sample_index += output_channel_count.saturating_sub(2);
        }

        let level = if silence == mono.len() {
            0.0
        } else {
            utils::audio::rms(&mono)
        };
        if let Err(e) = signal_tx.try_send(Signal::Playback { level }) {
            tracing::debug!("failed to send playback activity: {:?}", e);
        }
    };

    let output_stream = setup
        .output
        .build_output_stream(
            &setup.output_config,
            output_data_fn,
            move |err| tracing::error!("an error occurred on the output stream: {}", err),
            None,
        )
        .map_err(|e| ConnectError::Transport(e.to_string()))?;
    output_stream
        .play()
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    Ok((input_stream, output_stream))
}

/// Buffers mic frames to fixed chunks, resamples them to the wire rate and
/// ships them as binary frames. Ends when the capture stream drops.
pub(crate) fn spawn_capture_pump(
    mut mic_rx: tokio::sync::mpsc::Receiver<Vec<f32>>,
    audio_tx: tokio::sync::mpsc::Sender<Vec<u8>>,
    mut resampler: rubato::FastFixedIn<f32>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut buffer: VecDeque<f32> = VecDeque::with_capacity(INPUT_CHUNK_SIZE * 2);
        while let Some(frame) = mic_rx.recv().await {
            buffer.extend(frame);
            let mut resampled: Vec<f32> = vec![];
            while buffer.len() >= INPUT_CHUNK_SIZE {
                let chunk: Vec<f32> = buffer.drain(..INPUT_CHUNK_SIZE).collect();
                if let Ok(chunks) = resampler.process(&[chunk.as_slice()], None) {
                    if let Some(samples) = chunks.first() {
                        resampled.extend(samples.iter().copied());
                    }
                }
            }
            if !resampled.is_empty() {
                let frame = utils::audio::f32_to_pcm16(&resampled);
                if audio_tx.send(frame).await.is_err() {
                    break;
                }
            }
        }
    })
}

/// Decodes inbound binary frames, resamples them to the device rate and
/// pushes them into the playback ring buffer.
pub(crate) fn spawn_playback_feed(
    mut bytes_rx: tokio::sync::mpsc::Receiver<Vec<u8>>,
    mut producer: ringbuf::HeapProd<f32>,
    mut resampler: rubato::FastFixedIn<f32>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = bytes_rx.recv().await {
            let samples = utils::audio::pcm16_to_f32(&frame);
            let chunk_size = resampler.input_frames_next();
            for chunk in utils::audio::split_for_chunks(&samples, chunk_size) {
                if let Ok(resampled) = resampler.process(&[chunk.as_slice()], None) {
                    if let Some(resampled) = resampled.first() {
                        for sample in resampled {
                            if producer.try_push(*sample).is_err() {
                                tracing::warn!("playback buffer full, dropping sample");
                            }
                        }
                    }
                }
            }
        }
    })
}
