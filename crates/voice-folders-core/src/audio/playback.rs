use crate::{
    AdapterError, AdapterFuture, AudioPlaybackAdapter, CompletionCallback, PlaybackHandle,
    ResourceHandle,
    audio::{Resampler, join_worker, wav},
};

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        mpsc as std_mpsc,
    },
    thread::JoinHandle,
};

use cpal::{
    StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

type SharedCallback = Arc<Mutex<Option<CompletionCallback>>>;

enum VoiceSignal {
    Stop,
    Ended,
}

/// One running output stream.
struct Voice {
    signal_tx: std_mpsc::Sender<VoiceSignal>,
    worker: JoinHandle<()>,
}

impl Voice {
    async fn halt(self) {
        let _ = self.signal_tx.send(VoiceSignal::Stop);
        if let Err(e) = join_worker(self.worker).await {
            error!("Playback thread did not stop cleanly: {}", e);
        }
    }
}

/// A decoded resource ready for output at the device rate.
struct LoadedClip {
    resource: ResourceHandle,
    samples: Arc<Vec<f32>>,
    callback: SharedCallback,
    voice: Option<Voice>,
}

/// WAV playback through the default cpal output device.
///
/// Loading decodes the whole file and resamples it to the device rate.
/// Each `play` starts a fresh output stream on its own thread from the
/// first sample; reaching the last sample fires the completion callback.
pub struct CpalPlaybackAdapter {
    clips: Arc<Mutex<HashMap<u64, LoadedClip>>>,
    next_handle: AtomicU64,
}

impl CpalPlaybackAdapter {
    /// Create an adapter with nothing loaded.
    pub fn new() -> Self {
        Self {
            clips: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
        }
    }

    fn clips(&self) -> MutexGuard<'_, HashMap<u64, LoadedClip>> {
        lock_clips(&self.clips)
    }

    /// Stop the voice of `handle`, if any.
    async fn halt(&self, handle: PlaybackHandle) -> Result<(), AdapterError> {
        let voice = self
            .clips()
            .get_mut(&handle.0)
            .ok_or(AdapterError::UnknownHandle(handle.0))?
            .voice
            .take();

        if let Some(voice) = voice {
            voice.halt().await;
        }

        Ok(())
    }
}

impl Default for CpalPlaybackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlaybackAdapter for CpalPlaybackAdapter {
    #[instrument(skip(self))]
    fn load(&self, resource: &ResourceHandle) -> AdapterFuture<'_, PlaybackHandle> {
        let resource = resource.clone();

        Box::pin(async move {
            let path = PathBuf::from(resource.as_str());

            let samples = tokio::task::spawn_blocking(move || {
                let output_rate = default_output_config()?.sample_rate;
                let clip = wav::read_clip(&path)?;

                if clip.sample_rate == output_rate {
                    return Ok(clip.samples);
                }
                Resampler::new(clip.sample_rate, output_rate)?.resample(&clip.samples)
            })
            .await
            .map_err(|e| AdapterError::Failed(format!("Playback load task failed: {}", e)))??;

            let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
            let frames = samples.len();

            self.clips().insert(
                id,
                LoadedClip {
                    resource: resource.clone(),
                    samples: Arc::new(samples),
                    callback: Arc::new(Mutex::new(None)),
                    voice: None,
                },
            );

            debug!(handle = id, resource = %resource, frames, "Clip loaded");

            Ok(PlaybackHandle(id))
        })
    }

    #[instrument(skip(self))]
    fn play(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()> {
        Box::pin(async move {
            self.halt(handle).await?;

            let (samples, callback) = {
                let clips = self.clips();
                let clip = clips
                    .get(&handle.0)
                    .ok_or(AdapterError::UnknownHandle(handle.0))?;
                (Arc::clone(&clip.samples), Arc::clone(&clip.callback))
            };

            let (ready_tx, ready_rx) = oneshot::channel();
            let (signal_tx, signal_rx) = std_mpsc::channel();
            let stream_signal = signal_tx.clone();

            let worker = std::thread::Builder::new()
                .name("voice-folders-playback".to_string())
                .spawn(move || {
                    run_voice(samples, callback, ready_tx, stream_signal, signal_rx);
                })
                .map_err(|e| AdapterError::Failed(format!("Failed to spawn playback thread: {}", e)))?;

            let voice = Voice { signal_tx, worker };

            match ready_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    voice.halt().await;
                    return Err(e);
                }
                Err(_) => {
                    voice.halt().await;
                    return Err(AdapterError::Failed(
                        "Playback thread exited before starting".to_string(),
                    ));
                }
            }

            let stale = match self.clips().get_mut(&handle.0) {
                Some(clip) => clip.voice.replace(voice),
                None => Some(voice),
            };
            if let Some(stale) = stale {
                warn!(handle = handle.0, "Replacing a voice started concurrently");
                tokio::spawn(stale.halt());
            }

            info!(handle = handle.0, "Playback started");

            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn stop(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()> {
        Box::pin(async move {
            self.halt(handle).await?;
            debug!(handle = handle.0, "Playback stopped");
            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn unload(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()> {
        Box::pin(async move {
            self.halt(handle).await?;

            let clip = self
                .clips()
                .remove(&handle.0)
                .ok_or(AdapterError::UnknownHandle(handle.0))?;

            debug!(handle = handle.0, resource = %clip.resource, "Clip unloaded");

            Ok(())
        })
    }

    fn on_completion(
        &self,
        handle: PlaybackHandle,
        callback: CompletionCallback,
    ) -> Result<(), AdapterError> {
        let clips = self.clips();
        let clip = clips
            .get(&handle.0)
            .ok_or(AdapterError::UnknownHandle(handle.0))?;

        *clip.callback.lock().unwrap_or_else(|e| e.into_inner()) = Some(callback);

        Ok(())
    }
}

/// Owns the cpal output stream for one `play`. Returns once the clip ends
/// or a stop is signalled; the callback only fires on a natural end.
fn run_voice(
    samples: Arc<Vec<f32>>,
    callback: SharedCallback,
    ready_tx: oneshot::Sender<Result<(), AdapterError>>,
    stream_signal: std_mpsc::Sender<VoiceSignal>,
    signal_rx: std_mpsc::Receiver<VoiceSignal>,
) {
    let opened = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AdapterError::DeviceNotAvailable("No output device found".to_string()))
        .and_then(|device| {
            let config = device.default_output_config().map_err(|e| {
                AdapterError::DeviceNotAvailable(format!("Failed to get output config: {}", e))
            })?;
            Ok((device, StreamConfig::from(config)))
        });

    let (device, config) = match opened {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let channels = usize::from(config.channels.max(1));
    let position = Arc::new(AtomicUsize::new(0));
    let ended = Arc::new(AtomicBool::new(false));

    let stream = {
        let samples = Arc::clone(&samples);
        let position = Arc::clone(&position);
        let ended = Arc::clone(&ended);

        device.build_output_stream(
            &config,
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = position.load(Ordering::Relaxed);
                for frame in out.chunks_mut(channels) {
                    let value = samples.get(pos).copied().unwrap_or(0.0);
                    frame.fill(value);
                    pos = pos.saturating_add(1);
                }
                position.store(pos, Ordering::Relaxed);

                if pos >= samples.len() && !ended.swap(true, Ordering::AcqRel) {
                    let _ = stream_signal.send(VoiceSignal::Ended);
                }
            },
            |err| {
                error!("Audio output stream error: {}", err);
            },
            None,
        )
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(AdapterError::Failed(format!(
                "Failed to build output stream: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(AdapterError::Failed(format!(
            "Failed to start output stream: {}",
            e
        ))));
        return;
    }

    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    let signal = signal_rx.recv();
    drop(stream);

    if let Ok(VoiceSignal::Ended) = signal {
        debug!(frames = samples.len(), "Playback reached end of clip");
        let callback = callback.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

fn default_output_config() -> Result<StreamConfig, AdapterError> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AdapterError::DeviceNotAvailable("No output device found".to_string()))?;

    let config = device.default_output_config().map_err(|e| {
        AdapterError::DeviceNotAvailable(format!("Failed to get output config: {}", e))
    })?;

    Ok(config.into())
}

fn lock_clips(
    clips: &Mutex<HashMap<u64, LoadedClip>>,
) -> MutexGuard<'_, HashMap<u64, LoadedClip>> {
    clips.lock().unwrap_or_else(|e| {
        error!("Clip table lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}
