use crate::{
    QualityPreset,
    audio::wav::{LOW_QUALITY_SAMPLE_RATE, downmix, read_clip, write_clip},
};

/// WHAT: High quality keeps the capture rate and float precision
/// WHY: The high preset must not degrade the captured audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_high_preset_when_writing_then_float_wav_at_capture_rate() {
    // Given: Two seconds of a quiet ramp at 44.1kHz
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high.wav");
    let samples: Vec<f32> = (0..88_200).map(|i| (i % 100) as f32 / 1000.0).collect();

    // When: Writing with the high preset
    let written = write_clip(&path, &samples, 44_100, QualityPreset::High).unwrap();

    // Then: Spec and samples are preserved exactly
    let spec = hound::WavReader::open(&path).unwrap().spec();
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(written.duration_secs(), 2);
    let read = read_clip(&path).unwrap();
    assert_eq!(read.samples, samples);
}

/// WHAT: Low quality writes 16-bit audio at 16kHz
/// WHY: The low preset trades fidelity for file size
#[test]
#[allow(clippy::unwrap_used)]
fn given_low_preset_when_writing_then_16bit_16khz_wav() {
    // Given: One second at 48kHz
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("low.wav");
    let samples = vec![0.25f32; 48_000];

    // When: Writing with the low preset
    let written = write_clip(&path, &samples, 48_000, QualityPreset::Low).unwrap();

    // Then: 16-bit integers at 16kHz, about one second long
    let spec = hound::WavReader::open(&path).unwrap().spec();
    assert_eq!(spec.sample_rate, LOW_QUALITY_SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    let read = read_clip(&path).unwrap();
    assert_eq!(read.sample_rate, LOW_QUALITY_SAMPLE_RATE);
    assert_eq!(read.samples.len(), written.samples.len());
    assert!(read.samples.iter().all(|s| s.abs() <= 1.0));
}

/// WHAT: Stereo files are decoded to mono by averaging channels
/// WHY: Playback works on mono clips regardless of the source file
#[test]
#[allow(clippy::unwrap_used)]
fn given_stereo_int_wav_when_reading_then_mono_average() {
    // Given: A stereo 16-bit file with left at half scale and right silent
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..8_000 {
        writer.write_sample(i16::MAX / 2 + 1).unwrap();
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    // When: Reading
    let clip = read_clip(&path).unwrap();

    // Then: One second of mono at a quarter scale
    assert_eq!(clip.sample_rate, 8_000);
    assert_eq!(clip.samples.len(), 8_000);
    assert_eq!(clip.duration_secs(), 1);
    assert!((clip.samples[0] - 0.25).abs() < 1e-3);
}

/// WHAT: Reading a missing file fails instead of panicking
/// WHY: A recording whose file was deleted must surface a load error
#[test]
fn given_missing_file_when_reading_then_error() {
    assert!(read_clip(std::path::Path::new("/definitely/not/here.wav")).is_err());
}

/// WHAT: Downmix leaves mono data untouched
/// WHY: Mono devices are the common case and must not be altered
#[test]
fn given_mono_data_when_downmixing_then_unchanged() {
    let data = [0.1f32, -0.2, 0.3];
    assert_eq!(downmix(&data, 1), data.to_vec());
}
