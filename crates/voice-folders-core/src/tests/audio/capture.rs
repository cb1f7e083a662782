use crate::{
    AdapterError, AudioCaptureAdapter, CaptureHandle, CpalCaptureAdapter, PermissionStatus,
    QualityPreset,
    audio::{
        capture::{drain_pending, push_frames},
        join_worker,
        wav::{LOW_QUALITY_SAMPLE_RATE, TakeWriter, read_clip},
    },
};

use std::{sync::Mutex, time::Duration};

/// WHAT: Stereo frames are averaged into one mono sample each
/// WHY: Recordings are stored mono whatever the device layout
#[test]
fn given_stereo_frames_when_pushing_then_downmixed_to_mono() {
    // Given: An empty buffer and two stereo frames
    let mut buf = Vec::new();
    let frames = [1.0f32, 0.0, 0.5, 0.5];

    // When: Pushing them
    push_frames(&mut buf, &frames, 2);

    // Then: Two mono samples
    assert_eq!(buf.len(), 2);
    assert!((buf[0] - 0.5).abs() < f32::EPSILON);
    assert!((buf[1] - 0.5).abs() < f32::EPSILON);
}

/// WHAT: A capture longer than thirty minutes keeps every sample, first included
/// WHY: Long recordings must never lose their opening audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_thirty_one_minute_capture_when_streamed_then_every_sample_kept() {
    // Given: 31 minutes of 1kHz mono audio with a marked first sample
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.wav");
    let sample_rate = 1_000u32;
    let total = sample_rate as usize * 60 * 31;
    let pending = Mutex::new(Vec::new());
    let mut writer = TakeWriter::create(&path, sample_rate).unwrap();

    // When: Callback-sized chunks are queued and drained periodically
    let mut chunk = vec![0.1f32; 100];
    chunk[0] = 0.9;
    for i in 0..total / chunk.len() {
        push_frames(&mut pending.lock().unwrap(), &chunk, 1);
        chunk[0] = 0.1;
        if i % 25 == 0 {
            drain_pending(&pending, &mut writer).unwrap();
        }
    }
    drain_pending(&pending, &mut writer).unwrap();
    let take = writer.finish().unwrap();

    // Then: Nothing dropped and the opening sample survives
    assert_eq!(take.frames, total as u64);
    assert_eq!(take.duration_secs(), 60 * 31);
    let clip = read_clip(&path).unwrap();
    assert_eq!(clip.samples.len(), total);
    assert!((clip.samples[0] - 0.9).abs() < f32::EPSILON);
    assert!((clip.samples[1] - 0.1).abs() < f32::EPSILON);
}

/// WHAT: Draining moves queued samples out and leaves the queue empty
/// WHY: Samples must be written exactly once
#[test]
#[allow(clippy::unwrap_used)]
fn given_queued_samples_when_draining_twice_then_written_once() {
    // Given: Three queued samples
    let dir = tempfile::tempdir().unwrap();
    let mut writer = TakeWriter::create(&dir.path().join("t.wav"), 8_000).unwrap();
    let pending = Mutex::new(vec![0.1f32, 0.2, 0.3]);

    // When: Draining twice
    drain_pending(&pending, &mut writer).unwrap();
    drain_pending(&pending, &mut writer).unwrap();

    // Then: Three frames written, queue empty
    assert_eq!(writer.frames(), 3);
    assert!(pending.lock().unwrap().is_empty());
}

/// WHAT: A high quality take becomes the recording file unchanged
/// WHY: The capture rate and float samples are kept for High
#[test]
#[allow(clippy::unwrap_used)]
fn given_high_take_when_encoding_then_file_kept_at_capture_rate() {
    // Given: A two second take at 8kHz
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high.wav");
    let mut writer = TakeWriter::create(&path, 8_000).unwrap();
    writer.append(&[0.2f32; 16_000]).unwrap();
    let take = writer.finish().unwrap();

    // When: Encoding in place
    let duration = take.encode(&path, QualityPreset::High).unwrap();

    // Then: Same file, same rate
    assert_eq!(duration, 2);
    let spec = hound::WavReader::open(&path).unwrap().spec();
    assert_eq!(spec.sample_rate, 8_000);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
}

/// WHAT: A low quality take is re-encoded to 16kHz and the take removed
/// WHY: Only the final recording file should remain on disk
#[test]
#[allow(clippy::unwrap_used)]
fn given_low_take_when_encoding_then_16khz_file_and_take_removed() {
    // Given: A one second take at 48kHz
    let dir = tempfile::tempdir().unwrap();
    let take_path = dir.path().join("rec.take.wav");
    let target = dir.path().join("rec.wav");
    let mut writer = TakeWriter::create(&take_path, 48_000).unwrap();
    writer.append(&[0.25f32; 48_000]).unwrap();
    let take = writer.finish().unwrap();

    // When: Encoding into the target
    let duration = take.encode(&target, QualityPreset::Low).unwrap();

    // Then: 16-bit 16kHz target, no leftover take
    assert!(duration <= 1);
    let spec = hound::WavReader::open(&target).unwrap().spec();
    assert_eq!(spec.sample_rate, LOW_QUALITY_SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert!(!take_path.exists());
}

/// WHAT: Joining an audio thread lets other tasks on the runtime keep running
/// WHY: Stream threads are reaped from async code on error paths
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_thread_waiting_on_runtime_task_when_joining_then_task_still_runs() {
    // Given: A thread that only finishes early if a runtime task signals it
    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let worker = std::thread::spawn(move || rx.recv_timeout(Duration::from_secs(2)).is_ok());
    let signal = tokio::spawn(async move {
        let _ = tx.send(());
    });

    // When: Joining from the single-threaded test runtime
    let signalled = join_worker(worker).await.unwrap();

    // Then: The task ran while the join was pending
    signal.await.unwrap();
    assert!(signalled);
}

/// WHAT: A panicked audio thread surfaces as an adapter error
/// WHY: Callers report the failure instead of unwinding
#[tokio::test]
async fn given_panicking_thread_when_joining_then_failed_error() {
    // Given: A thread that panics
    let worker = std::thread::spawn(|| -> u32 { std::panic::panic_any("boom") });

    // When: Joining it
    let result = join_worker(worker).await;

    // Then: Failed, not a panic
    assert!(matches!(result, Err(AdapterError::Failed(_))));
}

/// WHAT: Desktop capture reports permission as granted up front
/// WHY: Hosts without a permission API decide when the stream opens
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_cpal_adapter_when_requesting_permission_then_granted() {
    // Given: A capture adapter
    let dir = tempfile::tempdir().unwrap();
    let adapter = CpalCaptureAdapter::new(dir.path());

    // When / Then
    assert_eq!(
        adapter.request_permission().await.unwrap(),
        PermissionStatus::Granted
    );
}

/// WHAT: Stopping a handle that was never started fails cleanly
/// WHY: A stale handle must not panic or write a file
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unknown_handle_when_stopping_then_unknown_handle_error() {
    // Given: A capture adapter with nothing running
    let dir = tempfile::tempdir().unwrap();
    let adapter = CpalCaptureAdapter::new(dir.path());

    // When: Stopping a made-up handle
    let result = adapter.stop(CaptureHandle(42)).await;

    // Then: UnknownHandle, no files written
    assert_eq!(result.unwrap_err(), AdapterError::UnknownHandle(42));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// WHAT: A real capture produces a WAV file in the recordings directory
/// WHY: End-to-end check against the machine's default microphone
#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
async fn given_default_microphone_when_capturing_then_wav_written() {
    // Given: A capture adapter writing into a temp dir
    let dir = tempfile::tempdir().unwrap();
    let adapter = CpalCaptureAdapter::new(dir.path());

    // When: Capturing for a little over one second
    let handle = adapter.start(crate::QualityPreset::Low).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    let captured = adapter.stop(handle).await.unwrap();

    // Then: The file exists and lasts at least a second
    assert!(std::path::Path::new(captured.resource.as_str()).exists());
    assert!(captured.duration_secs >= 1);
}
