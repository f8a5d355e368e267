use std::io::Cursor;

use tracing::{debug, info, warn};

use super::backend::AudioFrame;
use crate::error::{RecorderError, RecorderResult};

/// One binary block produced by the capture sink
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// Little-endian PCM16 bytes, interleaved
    pub data: Vec<u8>,
    /// Capture timestamp of the frame this chunk came from
    pub timestamp_ms: u64,
}

/// Capture sink
///
/// Encodes incoming frames into binary chunks as they arrive and, once the
/// recording stops, concatenates them into a single WAV container.
pub struct EncoderSink {
    chunks: Vec<EncodedChunk>,
    sample_rate: u32,
    channels: u16,
    format_locked: bool,
}

impl EncoderSink {
    /// `sample_rate`/`channels` are used until the first frame fixes the format.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            chunks: Vec::new(),
            sample_rate,
            channels,
            format_locked: false,
        }
    }

    /// Encode one frame into a chunk
    pub fn write_frame(&mut self, frame: &AudioFrame) {
        if !self.format_locked {
            self.sample_rate = frame.sample_rate;
            self.channels = frame.channels;
            self.format_locked = true;
        } else if frame.sample_rate != self.sample_rate || frame.channels != self.channels {
            warn!(
                "Dropping frame at {}ms: format {}Hz/{}ch does not match {}Hz/{}ch",
                frame.timestamp_ms,
                frame.sample_rate,
                frame.channels,
                self.sample_rate,
                self.channels
            );
            return;
        }

        let data: Vec<u8> = frame.samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.chunks.push(EncodedChunk {
            data,
            timestamp_ms: frame.timestamp_ms,
        });
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Capture timestamps of the first and last chunk
    pub fn timestamp_range(&self) -> Option<(u64, u64)> {
        let first = self.chunks.first()?;
        let last = self.chunks.last()?;
        Some((first.timestamp_ms, last.timestamp_ms))
    }

    /// Concatenate every chunk into one WAV container
    pub fn finish(self) -> RecorderResult<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels.max(1),
            sample_rate: self.sample_rate.max(1),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0usize;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
            for chunk in &self.chunks {
                for bytes in chunk.data.chunks_exact(2) {
                    writer
                        .write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))
                        .map_err(encode_error)?;
                    sample_count += 1;
                }
            }
            writer.finalize().map_err(encode_error)?;
        }

        let container = cursor.into_inner();
        match self.timestamp_range() {
            None => debug!("Encoder finished with no chunks"),
            Some((first_ms, last_ms)) => info!(
                "Encoded {} chunks captured {}..{}ms ({} samples, {} bytes)",
                self.chunks.len(),
                first_ms,
                last_ms,
                sample_count,
                container.len()
            ),
        }

        Ok(container)
    }
}

fn encode_error(e: hound::Error) -> RecorderError {
    RecorderError::Encode(format!("failed to build recording container: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<i16>, sample_rate: u32, timestamp_ms: u64) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate,
            channels: 1,
            timestamp_ms,
        }
    }

    #[test]
    fn chunks_are_little_endian_pcm() {
        let mut sink = EncoderSink::new(16000, 1);
        sink.write_frame(&frame(vec![1, -2], 16000, 100));

        assert_eq!(sink.chunk_count(), 1);
        assert_eq!(sink.chunks[0].data, vec![1, 0, 0xFE, 0xFF]);
    }

    #[test]
    fn first_frame_fixes_format() {
        let mut sink = EncoderSink::new(16000, 1);
        sink.write_frame(&frame(vec![0; 441], 44100, 10));
        sink.write_frame(&frame(vec![0; 160], 16000, 20));

        assert_eq!(sink.chunk_count(), 1);
        assert_eq!(sink.sample_rate, 44100);
    }

    #[test]
    fn timestamp_range_spans_kept_chunks() {
        let mut sink = EncoderSink::new(16000, 1);
        assert_eq!(sink.timestamp_range(), None);

        sink.write_frame(&frame(vec![0; 160], 16000, 100));
        sink.write_frame(&frame(vec![0; 441], 44100, 200));
        sink.write_frame(&frame(vec![0; 160], 16000, 300));

        assert_eq!(sink.timestamp_range(), Some((100, 300)));
    }

    #[test]
    fn writer_failures_are_encode_errors() {
        let err = encode_error(hound::Error::Unsupported);
        assert!(matches!(err, RecorderError::Encode(_)));
        assert!(err.to_string().starts_with("Encode error"));
    }

    #[test]
    fn container_is_a_readable_wav() {
        let mut sink = EncoderSink::new(16000, 1);
        sink.write_frame(&frame(vec![100; 1600], 16000, 100));
        sink.write_frame(&frame(vec![-100; 1600], 16000, 200));

        let container = sink.finish().unwrap();
        let reader = hound::WavReader::new(Cursor::new(container)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.len(), 3200);
    }

    #[test]
    fn empty_sink_still_produces_a_header() {
        let container = EncoderSink::new(16000, 1).finish().unwrap();
        assert!(container.len() >= 44);
    }
}
