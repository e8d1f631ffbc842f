use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Sample rate the speech backend expects when nothing else is configured.
pub const DEFAULT_STT_SAMPLE_RATE: u32 = 16000;

/// Samples handed to the resampler per call.
pub const FRAME_CHUNK_SIZE: usize = 1024;

/// Creates a resampler to convert between audio sample rates.
pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Creates a new ring buffer on the heap for shared audio data.
pub fn shared_buffer(size: usize) -> HeapRb<f32> {
    HeapRb::new(size)
}

/// Averages interleaved channels down to mono.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels > 1 {
        data.chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        data.to_vec()
    }
}

/// Converts f32 samples to little-endian PCM16 bytes.
pub fn encode_pcm16(pcm32: &[f32]) -> Vec<u8> {
    pcm32.to_binary()
}

/// A trait for converting audio sample types to a binary representation (Vec<u8>).
pub trait ToBinary {
    fn to_binary(&self) -> Vec<u8>;
}

impl ToBinary for [f32] {
    fn to_binary(&self) -> Vec<u8> {
        self.iter()
            .flat_map(|&sample| {
                let v = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
                v.to_le_bytes().to_vec()
            })
            .collect()
    }
}

/// Turns microphone samples of arbitrary length into PCM16 frames at the target rate.
///
/// Samples are accumulated in a ring buffer and emitted in fixed chunks so the
/// resampler always sees the input size it was built for.
pub struct Pcm16Framer {
    buffer: HeapRb<f32>,
    chunk_size: usize,
    resampler: Option<FastFixedIn<f32>>,
}

impl Pcm16Framer {
    pub fn new(input_rate: u32, output_rate: u32) -> anyhow::Result<Self> {
        let resampler = if input_rate != output_rate {
            Some(create_resampler(
                input_rate as f64,
                output_rate as f64,
                FRAME_CHUNK_SIZE,
            )?)
        } else {
            None
        };
        Ok(Self {
            buffer: shared_buffer(input_rate as usize * 2),
            chunk_size: FRAME_CHUNK_SIZE,
            resampler,
        })
    }

    /// Buffers `samples` and returns the PCM16 bytes of every complete chunk.
    pub fn push(&mut self, samples: &[f32]) -> Vec<u8> {
        let pushed = self.buffer.push_slice(samples);
        if pushed < samples.len() {
            tracing::warn!("frame buffer full, dropped {} samples", samples.len() - pushed);
        }

        let mut out = Vec::new();
        let mut chunk = vec![0.0f32; self.chunk_size];
        while self.buffer.occupied_len() >= self.chunk_size {
            self.buffer.pop_slice(&mut chunk);
            match self.resampler.as_mut() {
                Some(resampler) => match resampler.process(&[chunk.as_slice()], None) {
                    Ok(resampled) => {
                        if let Some(mono) = resampled.first() {
                            out.extend(encode_pcm16(mono));
                        }
                    }
                    Err(e) => tracing::warn!("failed to resample audio chunk: {}", e),
                },
                None => out.extend(encode_pcm16(&chunk)),
            }
        }
        out
    }

    /// Number of samples waiting for a full chunk.
    pub fn pending(&self) -> usize {
        self.buffer.occupied_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_encoding_is_little_endian() {
        let bytes = encode_pcm16(&[0.0, -1.0, 1.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x00, 0x80, 0xff, 0x7f]);
    }

    #[test]
    fn downmix_averages_channels() {
        assert_eq!(downmix(&[0.5, 0.25, 1.0, 0.0], 2), vec![0.375, 0.5]);
        assert_eq!(downmix(&[0.1, 0.2], 1), vec![0.1, 0.2]);
    }

    #[test]
    fn framer_without_resampling_emits_whole_chunks() {
        let mut framer = Pcm16Framer::new(16000, 16000).unwrap();
        assert!(framer.push(&vec![0.0; FRAME_CHUNK_SIZE - 1]).is_empty());
        let bytes = framer.push(&[0.0; 10]);
        assert_eq!(bytes.len(), FRAME_CHUNK_SIZE * 2);
        assert_eq!(framer.pending(), 9);
    }
}
