use std::path::PathBuf;

use tokio::sync::mpsc;

use super::file::FileCapture;
use super::tone::ToneCapture;
use crate::error::{RecorderError, RecorderResult};

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration covered by this frame in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Configuration for capture devices
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Frame size in milliseconds (how often the device delivers data)
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            frame_duration_ms: 100,
        }
    }
}

impl CaptureConfig {
    /// Interleaved samples in one frame
    pub fn samples_per_frame(&self) -> usize {
        (self.sample_rate as u64 * self.frame_duration_ms / 1000) as usize * self.channels as usize
    }
}

/// Audio capture device trait
///
/// Implementations:
/// - Tone: synthetic sine generator (demos and tests)
/// - File: streams a WAV file as if it were live input
#[async_trait::async_trait]
pub trait CaptureDevice: Send {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The channel
    /// closes once the device has fully stopped.
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> RecorderResult<()>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device for the given source
    ///
    /// An `Err` here is the "permission denied / no capture API" case; the
    /// engine accepts it directly and stays inert.
    pub fn create(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> RecorderResult<Box<dyn CaptureDevice>> {
        match source {
            CaptureSource::Tone {
                frequency_hz,
                amplitude,
            } => Ok(Box::new(ToneCapture::new(config, frequency_hz, amplitude))),

            CaptureSource::File(path) => {
                let device = FileCapture::open(&path, config.frame_duration_ms)?;
                Ok(Box::new(device))
            }

            CaptureSource::Microphone => Err(RecorderError::DeviceUnavailable(
                "no microphone backend in this build".to_string(),
            )),
        }
    }
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Microphone input
    Microphone,
    /// Synthetic sine tone
    Tone { frequency_hz: f32, amplitude: f32 },
    /// File input, paced in real time
    File(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_per_frame_mono_and_stereo() {
        let mono = CaptureConfig::default();
        assert_eq!(mono.samples_per_frame(), 1600);

        let stereo = CaptureConfig {
            sample_rate: 48000,
            channels: 2,
            frame_duration_ms: 50,
        };
        assert_eq!(stereo.samples_per_frame(), 4800);
    }

    #[test]
    fn frame_duration_from_sample_count() {
        let frame = AudioFrame {
            samples: vec![0; 3200],
            sample_rate: 16000,
            channels: 2,
            timestamp_ms: 0,
        };
        assert!((frame.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn microphone_source_is_unavailable() {
        let result = CaptureDeviceFactory::create(CaptureSource::Microphone, CaptureConfig::default());
        assert!(matches!(result, Err(RecorderError::DeviceUnavailable(_))));
    }
}
