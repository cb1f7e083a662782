use crate::{AdapterError, QualityPreset, audio::Resampler};

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, instrument};

/// Sample rate written for [`QualityPreset::Low`].
pub(crate) const LOW_QUALITY_SAMPLE_RATE: u32 = 16_000;

/// Mono PCM decoded from a WAV file.
#[derive(Debug, Clone)]
pub(crate) struct Clip {
    pub(crate) samples: Vec<f32>,
    pub(crate) sample_rate: u32,
}

impl Clip {
    /// Whole seconds of audio, rounded down.
    pub(crate) fn duration_secs(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 / u64::from(self.sample_rate)
    }
}

/// Encode mono samples captured at `sample_rate` according to `preset`.
///
/// `High` keeps the capture rate as 32-bit float. `Low` resamples to
/// [`LOW_QUALITY_SAMPLE_RATE`] and writes 16-bit integers.
#[instrument(skip(samples), fields(sample_count = samples.len()))]
pub(crate) fn write_clip(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    preset: QualityPreset,
) -> Result<Clip, AdapterError> {
    let clip = match preset {
        QualityPreset::High => Clip {
            samples: samples.to_vec(),
            sample_rate,
        },
        QualityPreset::Low if sample_rate == LOW_QUALITY_SAMPLE_RATE => Clip {
            samples: samples.to_vec(),
            sample_rate,
        },
        QualityPreset::Low => Clip {
            samples: Resampler::new(sample_rate, LOW_QUALITY_SAMPLE_RATE)?.resample(samples)?,
            sample_rate: LOW_QUALITY_SAMPLE_RATE,
        },
    };

    let spec = match preset {
        QualityPreset::High => WavSpec {
            channels: 1,
            sample_rate: clip.sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
        QualityPreset::Low => WavSpec {
            channels: 1,
            sample_rate: clip.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| wav_error("create", &e))?;

    for &sample in &clip.samples {
        let written = match spec.sample_format {
            SampleFormat::Float => writer.write_sample(sample),
            SampleFormat::Int => writer.write_sample(to_i16(sample)),
        };
        written.map_err(|e| wav_error("write", &e))?;
    }

    writer.finalize().map_err(|e| wav_error("finalize", &e))?;

    debug!(
        path = %path.display(),
        sample_rate = clip.sample_rate,
        bits_per_sample = spec.bits_per_sample,
        "WAV written"
    );

    Ok(clip)
}

/// Mono 32-bit float WAV written incrementally while a capture runs.
pub(crate) struct TakeWriter {
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
    sample_rate: u32,
    frames: u64,
}

impl TakeWriter {
    /// Create (or truncate) the file at `path`.
    pub(crate) fn create(path: &Path, sample_rate: u32) -> Result<Self, AdapterError> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec).map_err(|e| wav_error("create", &e))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            sample_rate,
            frames: 0,
        })
    }

    pub(crate) fn append(&mut self, samples: &[f32]) -> Result<(), AdapterError> {
        for &sample in samples {
            self.writer
                .write_sample(sample)
                .map_err(|e| wav_error("write", &e))?;
        }
        self.frames += samples.len() as u64;
        Ok(())
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames
    }

    /// Patch the header and close the file.
    pub(crate) fn finish(self) -> Result<Take, AdapterError> {
        self.writer
            .finalize()
            .map_err(|e| wav_error("finalize", &e))?;

        debug!(
            path = %self.path.display(),
            sample_rate = self.sample_rate,
            frames = self.frames,
            "Take written"
        );

        Ok(Take {
            path: self.path,
            sample_rate: self.sample_rate,
            frames: self.frames,
        })
    }
}

/// A finished capture file at the device rate.
#[derive(Debug, Clone)]
pub(crate) struct Take {
    pub(crate) path: PathBuf,
    pub(crate) sample_rate: u32,
    pub(crate) frames: u64,
}

impl Take {
    /// Whole seconds of audio, rounded down.
    pub(crate) fn duration_secs(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames / u64::from(self.sample_rate)
    }

    /// Produce the final recording file at `target` for `preset`.
    ///
    /// `High` keeps the take as written and renames it if needed. `Low`
    /// re-encodes through [`write_clip`] and removes the take. Returns the
    /// duration of the final file in whole seconds.
    #[instrument(skip(self), fields(take = %self.path.display()))]
    pub(crate) fn encode(self, target: &Path, preset: QualityPreset) -> Result<u64, AdapterError> {
        match preset {
            QualityPreset::High => {
                if self.path != target {
                    std::fs::rename(&self.path, target).map_err(|e| {
                        AdapterError::Failed(format!("Failed to move take into place: {}", e))
                    })?;
                }
                Ok(self.duration_secs())
            }
            QualityPreset::Low => {
                let raw = read_clip(&self.path)?;
                let clip = write_clip(target, &raw.samples, raw.sample_rate, preset)?;
                if self.path != target {
                    std::fs::remove_file(&self.path).map_err(|e| {
                        AdapterError::Failed(format!("Failed to remove take file: {}", e))
                    })?;
                }
                Ok(clip.duration_secs())
            }
        }
    }

    /// Delete the take file.
    pub(crate) fn discard(self) -> Result<(), AdapterError> {
        std::fs::remove_file(&self.path)
            .map_err(|e| AdapterError::Failed(format!("Failed to remove take file: {}", e)))
    }
}

/// Decode a WAV file to mono `f32`, averaging channels.
#[instrument]
pub(crate) fn read_clip(path: &Path) -> Result<Clip, AdapterError> {
    let mut reader = WavReader::open(path).map_err(|e| wav_error("open", &e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| wav_error("decode", &e))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| wav_error("decode", &e))?
        }
    };

    let samples = downmix(&interleaved, spec.channels);

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        frames = samples.len(),
        "WAV decoded"
    );

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved frames down to one channel.
pub(crate) fn downmix(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn wav_error(action: &str, source: &hound::Error) -> AdapterError {
    AdapterError::Failed(format!("WAV {action} failed: {source}"))
}
