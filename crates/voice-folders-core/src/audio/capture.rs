use crate::{
    AdapterError, AdapterFuture, AudioCaptureAdapter, CaptureHandle, CapturedAudio,
    PermissionStatus, QualityPreset, ResourceHandle,
    audio::{
        join_worker,
        wav::{self, Take, TakeWriter},
    },
};

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc as std_mpsc,
    },
    thread::JoinHandle,
    time::Duration,
};

use cpal::{
    StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How often the capture thread moves callback samples into the take file.
pub(crate) const DRAIN_INTERVAL: Duration = Duration::from_millis(250);

struct Recorder {
    preset: QualityPreset,
    target: PathBuf,
    stop_tx: std_mpsc::Sender<()>,
    worker: JoinHandle<Result<Take, AdapterError>>,
}

/// Microphone capture through the default cpal input device.
///
/// Each capture runs its input stream on a dedicated thread that streams
/// mono samples into a take file as they arrive, so a capture of any length
/// is kept whole. Stopping it encodes the take for the quality preset.
/// The resource handle of a finished capture is the file path.
pub struct CpalCaptureAdapter {
    recordings_dir: PathBuf,
    recorders: Mutex<HashMap<u64, Recorder>>,
    next_handle: AtomicU64,
}

impl CpalCaptureAdapter {
    /// Capture into WAV files under `recordings_dir`. The directory is
    /// created on first use.
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            recorders: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    fn recorders(&self) -> MutexGuard<'_, HashMap<u64, Recorder>> {
        self.recorders.lock().unwrap_or_else(|e| {
            error!("Recorder table lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl AudioCaptureAdapter for CpalCaptureAdapter {
    fn request_permission(&self) -> AdapterFuture<'_, PermissionStatus> {
        // Desktop hosts prompt (or refuse) when the stream is opened.
        Box::pin(async { Ok(PermissionStatus::Granted) })
    }

    #[instrument(skip(self))]
    fn start(&self, preset: QualityPreset) -> AdapterFuture<'_, CaptureHandle> {
        Box::pin(async move {
            let (ready_tx, ready_rx) = oneshot::channel();
            let (stop_tx, stop_rx) = std_mpsc::channel();

            let stem = Uuid::new_v4();
            let target = self.recordings_dir.join(format!("{}.wav", stem));
            let take_path = match preset {
                QualityPreset::High => target.clone(),
                QualityPreset::Low => self.recordings_dir.join(format!("{}.take.wav", stem)),
            };

            let worker = std::thread::Builder::new()
                .name("voice-folders-capture".to_string())
                .spawn(move || run_capture(take_path, ready_tx, stop_rx))
                .map_err(|e| AdapterError::Failed(format!("Failed to spawn capture thread: {}", e)))?;

            match ready_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    let _ = join_worker(worker).await;
                    return Err(e);
                }
                Err(_) => {
                    let _ = join_worker(worker).await;
                    return Err(AdapterError::Failed(
                        "Capture thread exited before starting".to_string(),
                    ));
                }
            }

            let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
            self.recorders().insert(
                id,
                Recorder {
                    preset,
                    target,
                    stop_tx,
                    worker,
                },
            );

            info!(handle = id, ?preset, "Audio capture started");

            Ok(CaptureHandle(id))
        })
    }

    #[instrument(skip(self))]
    fn stop(&self, handle: CaptureHandle) -> AdapterFuture<'_, CapturedAudio> {
        Box::pin(async move {
            let recorder = self
                .recorders()
                .remove(&handle.0)
                .ok_or(AdapterError::UnknownHandle(handle.0))?;

            // The worker also stops if the sender is gone.
            let _ = recorder.stop_tx.send(());

            let take = join_worker(recorder.worker).await??;
            let target = recorder.target;
            let preset = recorder.preset;

            let finalize = move || -> Result<(PathBuf, u64), AdapterError> {
                if take.frames == 0 {
                    if let Err(e) = take.discard() {
                        warn!("Failed to remove empty take: {}", e);
                    }
                    return Err(AdapterError::Failed("No audio was captured".to_string()));
                }

                let duration_secs = take.encode(&target, preset)?;
                Ok((target, duration_secs))
            };

            let (path, duration_secs) = tokio::task::spawn_blocking(finalize)
                .await
                .map_err(|e| AdapterError::Failed(format!("Capture finalize task failed: {}", e)))??;

            let captured = CapturedAudio {
                resource: ResourceHandle::new(path.to_string_lossy()),
                duration_secs,
            };

            info!(
                handle = handle.0,
                resource = %captured.resource,
                duration_secs = captured.duration_secs,
                "Audio capture stopped"
            );

            Ok(captured)
        })
    }
}

/// Owns the cpal input stream for one capture. Reports readiness once the
/// stream is playing, then streams samples into the take file at
/// `take_path` until told to stop.
fn run_capture(
    take_path: PathBuf,
    ready_tx: oneshot::Sender<Result<(), AdapterError>>,
    stop_rx: std_mpsc::Receiver<()>,
) -> Result<Take, AdapterError> {
    let host = cpal::default_host();

    let opened = host
        .default_input_device()
        .ok_or_else(|| AdapterError::DeviceNotAvailable("No microphone found".to_string()))
        .and_then(|device| {
            let config = device.default_input_config().map_err(|e| {
                AdapterError::DeviceNotAvailable(format!("Failed to get input config: {}", e))
            })?;
            Ok((device, StreamConfig::from(config)))
        });

    let (device, config) = match opened {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready_tx.send(Err(e.clone()));
            return Err(e);
        }
    };

    let channels = config.channels;
    let sample_rate = config.sample_rate;
    let pending = Arc::new(Mutex::new(Vec::<f32>::new()));
    let shutdown = Arc::new(AtomicBool::new(false));

    let stream = {
        let pending = Arc::clone(&pending);
        let shutdown = Arc::clone(&shutdown);

        device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if shutdown.load(Ordering::Acquire) {
                    return;
                }
                push_frames(&mut lock_pending(&pending), data, channels);
            },
            |err| {
                error!("Audio input stream error: {}", err);
            },
            None,
        )
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let e = match e {
                cpal::BuildStreamError::DeviceNotAvailable => {
                    AdapterError::DeviceNotAvailable("Input device disappeared".to_string())
                }
                other => AdapterError::Failed(format!("Failed to build input stream: {}", other)),
            };
            let _ = ready_tx.send(Err(e.clone()));
            return Err(e);
        }
    };

    let mut writer = match open_take(&take_path, sample_rate) {
        Ok(writer) => writer,
        Err(e) => {
            let _ = ready_tx.send(Err(e.clone()));
            return Err(e);
        }
    };

    if let Err(e) = stream.play() {
        let e = AdapterError::Failed(format!("Failed to start input stream: {}", e));
        drop(writer);
        let _ = std::fs::remove_file(&take_path);
        let _ = ready_tx.send(Err(e.clone()));
        return Err(e);
    }

    debug!(sample_rate, channels, take = %take_path.display(), "Input stream playing");

    if ready_tx.send(Ok(())).is_err() {
        warn!("Capture start abandoned by caller");
        drop(writer);
        let _ = std::fs::remove_file(&take_path);
        return Err(AdapterError::Failed("Capture start abandoned".to_string()));
    }

    let mut failure = None;
    loop {
        match stop_rx.recv_timeout(DRAIN_INTERVAL) {
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                if let Err(e) = drain_pending(&pending, &mut writer) {
                    error!("Take write failed, ending capture early: {}", e);
                    failure = Some(e);
                    break;
                }
            }
            Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    shutdown.store(true, Ordering::Release);
    drop(stream);

    if let Some(e) = failure {
        match writer.finish() {
            Ok(take) => warn!(take = %take.path.display(), frames = take.frames, "Partial take kept"),
            Err(finish_err) => error!("Failed to close partial take: {}", finish_err),
        }
        return Err(e);
    }

    drain_pending(&pending, &mut writer)?;

    debug!(frames = writer.frames(), "Captured audio samples");

    writer.finish()
}

fn open_take(path: &Path, sample_rate: u32) -> Result<TakeWriter, AdapterError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            AdapterError::Failed(format!("Failed to create recordings directory: {}", e))
        })?;
    }
    TakeWriter::create(path, sample_rate)
}

fn lock_pending(pending: &Mutex<Vec<f32>>) -> MutexGuard<'_, Vec<f32>> {
    pending.lock().unwrap_or_else(|e| {
        error!("Sample buffer lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

/// Downmix interleaved frames and queue them for the take file.
pub(crate) fn push_frames(buf: &mut Vec<f32>, data: &[f32], channels: u16) {
    buf.extend(wav::downmix(data, channels));
}

/// Move everything queued by the input callback into `writer`.
///
/// The lock is held only for the swap; encoding happens outside it.
pub(crate) fn drain_pending(
    pending: &Mutex<Vec<f32>>,
    writer: &mut TakeWriter,
) -> Result<(), AdapterError> {
    let chunk = std::mem::take(&mut *lock_pending(pending));
    writer.append(&chunk)
}
