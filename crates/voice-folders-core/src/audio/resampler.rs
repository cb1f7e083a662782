use crate::AdapterError;

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Mono sample-rate converter used when encoding low quality captures and
/// when matching a clip to the output device.
pub(crate) struct Resampler {
    inner: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl Resampler {
    #[instrument]
    pub(crate) fn new(input_rate: u32, output_rate: u32) -> Result<Self, AdapterError> {
        let inner = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_FRAMES,
            SUB_CHUNKS,
            1,
            FixedSync::Input,
        )
        .map_err(|e| AdapterError::Failed(format!("Failed to create resampler: {}", e)))?;

        Ok(Self {
            inner,
            input_rate,
            output_rate,
        })
    }

    /// Frames the converted clip should contain.
    pub(crate) fn expected_len(&self, input_len: usize) -> usize {
        (input_len as f64 * f64::from(self.output_rate) / f64::from(self.input_rate)) as usize
    }

    /// Convert a whole clip. The final partial chunk is zero padded and the
    /// result trimmed to [`Resampler::expected_len`].
    #[instrument(skip(self, samples), fields(input_len = samples.len()))]
    pub(crate) fn resample(&mut self, samples: &[f32]) -> Result<Vec<f32>, AdapterError> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let expected = self.expected_len(samples.len());
        let mut output = Vec::with_capacity(expected + self.inner.output_frames_max());
        let mut scratch = vec![0.0f32; self.inner.output_frames_max()];
        let mut padded = [0.0f32; CHUNK_FRAMES];

        for chunk in samples.chunks(CHUNK_FRAMES) {
            let input = if chunk.len() == CHUNK_FRAMES {
                chunk
            } else {
                padded[..chunk.len()].copy_from_slice(chunk);
                padded[chunk.len()..].fill(0.0);
                &padded[..]
            };

            let written = self.process_chunk(input, &mut scratch)?;
            output.extend_from_slice(&scratch[..written]);
        }

        output.truncate(expected);

        debug!(
            output_len = output.len(),
            input_rate = self.input_rate,
            output_rate = self.output_rate,
            "Clip resampled"
        );

        Ok(output)
    }

    fn process_chunk(&mut self, input: &[f32], out: &mut [f32]) -> Result<usize, AdapterError> {
        let out_frames = out.len();

        let input_adapter = InterleavedSlice::new(input, 1, CHUNK_FRAMES)
            .map_err(|e| AdapterError::Failed(format!("Resampler input rejected: {}", e)))?;
        let mut output_adapter = InterleavedSlice::new_mut(out, 1, out_frames)
            .map_err(|e| AdapterError::Failed(format!("Resampler output rejected: {}", e)))?;

        let (_consumed, written) = self
            .inner
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| AdapterError::Failed(format!("Resampling failed: {}", e)))?;

        Ok(written)
    }
}
