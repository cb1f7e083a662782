use crate::audio::Resampler;

const CAPTURE_RATE: u32 = 48_000;
const LOW_QUALITY_RATE: u32 = 16_000;
const LENGTH_TOLERANCE: u64 = 100;
const MAX_AMPLITUDE: f32 = 1.5;

/// WHAT: 48kHz audio is converted to about a third as many 16kHz samples
/// WHY: Low quality captures are stored at 16kHz
#[test]
#[allow(clippy::unwrap_used)]
fn given_48khz_audio_when_resampling_to_16khz_then_output_length_approximately_correct() {
    // Given: One second of constant signal at 48kHz
    let mut resampler = Resampler::new(CAPTURE_RATE, LOW_QUALITY_RATE).unwrap();
    let input = vec![0.5f32; CAPTURE_RATE as usize];

    // When: Resampling
    let output = resampler.resample(&input).unwrap();

    // Then: About one second at 16kHz, all finite
    assert!(
        (output.len() as i64 - LOW_QUALITY_RATE as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        LOW_QUALITY_RATE,
        output.len()
    );
    assert!(output.iter().all(|s| s.is_finite()));
}

/// WHAT: Upsampling a 16kHz clip for a 48kHz output device roughly triples its length
/// WHY: Playback converts clips to the device rate
#[test]
#[allow(clippy::unwrap_used)]
fn given_16khz_tone_when_resampling_to_48khz_then_length_tripled_and_bounded() {
    // Given: A quarter second tone at 16kHz
    let mut resampler = Resampler::new(LOW_QUALITY_RATE, CAPTURE_RATE).unwrap();
    let input: Vec<f32> = (0..4000).map(|i| (i as f32 * 0.05).sin()).collect();

    // When: Resampling
    let output = resampler.resample(&input).unwrap();

    // Then: Never longer than the expected length and close to it
    assert!(output.len() <= resampler.expected_len(input.len()));
    assert!((output.len() as i64 - 12_000).unsigned_abs() < LENGTH_TOLERANCE);
    assert!(output.iter().all(|s| s.is_finite() && s.abs() <= MAX_AMPLITUDE));
}

/// WHAT: Empty input yields empty output
/// WHY: A zero-length capture must not error inside the resampler
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_samples_when_resampling_then_empty_output() {
    // Given: A resampler and no samples
    let mut resampler = Resampler::new(CAPTURE_RATE, LOW_QUALITY_RATE).unwrap();

    // When / Then
    assert!(resampler.resample(&[]).unwrap().is_empty());
}
