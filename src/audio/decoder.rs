//! Recording decode via Symphonia.
//!
//! Turns the finished WAV container into an immutable, seekable f32 buffer.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::{RecorderError, RecorderResult};

/// Fully decoded recording, interleaved f32.
#[derive(Clone, Debug)]
pub struct DecodedBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl DecodedBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of sample frames (one sample per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a recording container into a playable buffer.
///
/// Empty or malformed containers are errors; there is no partial result.
pub fn decode_recording(container: Vec<u8>) -> RecorderResult<DecodedBuffer> {
    if container.is_empty() {
        return Err(RecorderError::Decode("recording container is empty".to_string()));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(container)), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| RecorderError::Decode(format!("unrecognised container: {e}")))?;

    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| RecorderError::Decode("no audio track".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| RecorderError::Decode("no sample rate in codec params".to_string()))?;
    let channels = codec_params
        .channels
        .map(|c| c.count() as u16)
        .ok_or_else(|| RecorderError::Decode("no channel info in codec params".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| RecorderError::Decode(format!("codec init failed: {e}")))?;

    let mut samples = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(RecorderError::Decode(format!("{e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                warn!(error = %msg, "Skipping corrupted audio packet");
                continue;
            }
            Err(e) => return Err(RecorderError::Decode(format!("{e}"))),
        };

        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if samples.is_empty() {
        return Err(RecorderError::Decode("recording is empty".to_string()));
    }

    let buffer = DecodedBuffer::new(samples, sample_rate, channels);
    debug!(
        sample_rate,
        channels,
        duration_secs = buffer.duration_secs(),
        "Decoded recording"
    );

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::encoder::EncoderSink;
    use crate::audio::AudioFrame;

    #[test]
    fn decodes_encoded_recording() {
        let mut sink = EncoderSink::new(16000, 1);
        for i in 0..5 {
            sink.write_frame(&AudioFrame {
                samples: vec![i16::MAX / 2; 1600],
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: (i + 1) * 100,
            });
        }

        let buffer = decode_recording(sink.finish().unwrap()).unwrap();
        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.frames(), 8000);
        assert!((buffer.duration_secs() - 0.5).abs() < 1e-9);
        assert!((buffer.samples()[0] - 0.5).abs() < 0.01);
    }

    #[test]
    fn empty_recording_fails() {
        let container = EncoderSink::new(16000, 1).finish().unwrap();
        assert!(matches!(
            decode_recording(container),
            Err(RecorderError::Decode(_))
        ));
    }

    #[test]
    fn garbage_fails() {
        assert!(matches!(
            decode_recording(vec![0xde, 0xad, 0xbe, 0xef]),
            Err(RecorderError::Decode(_))
        ));
        assert!(matches!(
            decode_recording(Vec::new()),
            Err(RecorderError::Decode(_))
        ));
    }

    #[test]
    fn stereo_duration_counts_frames() {
        let buffer = DecodedBuffer::new(vec![0.0; 32000], 16000, 2);
        assert_eq!(buffer.frames(), 16000);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
    }
}
