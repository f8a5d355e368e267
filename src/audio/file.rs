use std::path::Path;
use std::sync::Arc;

use hound::WavReader;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{error, info};

use super::backend::{AudioFrame, CaptureDevice};
use crate::error::{RecorderError, RecorderResult};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> RecorderResult<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).map_err(|e| {
            RecorderError::DeviceUnavailable(format!("failed to open {}: {}", path.display(), e))
        })?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RecorderError::Capture(format!("failed to read samples: {}", e)))?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }
}

/// Capture device that replays a WAV file as live input
///
/// Frames are paced at `frame_duration_ms`; the channel closes when the file
/// runs out or the device is stopped, whichever comes first.
pub struct FileCapture {
    audio: Arc<AudioFile>,
    frame_duration_ms: u64,
    producer: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl FileCapture {
    pub fn open(path: impl AsRef<Path>, frame_duration_ms: u64) -> RecorderResult<Self> {
        let audio = AudioFile::open(path)?;
        if audio.sample_rate == 0 || audio.channels == 0 {
            return Err(RecorderError::DeviceUnavailable(format!(
                "{} has no audio",
                audio.path
            )));
        }

        Ok(Self {
            audio: Arc::new(audio),
            frame_duration_ms: frame_duration_ms.max(1),
            producer: None,
        })
    }

    pub fn audio(&self) -> &AudioFile {
        &self.audio
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FileCapture {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<AudioFrame>> {
        if self.producer.is_some() {
            return Err(RecorderError::Capture("Already capturing".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let audio = Arc::clone(&self.audio);
        let frame_duration_ms = self.frame_duration_ms;

        let producer = tokio::spawn(async move {
            let period = Duration::from_millis(frame_duration_ms);
            let mut ticker = interval_at(Instant::now() + period, period);
            let samples_per_frame = (audio.sample_rate as u64 * frame_duration_ms / 1000)
                as usize
                * audio.channels as usize;
            let mut chunks = audio.samples.chunks(samples_per_frame.max(1));
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let Some(chunk) = chunks.next() else {
                            info!("End of file reached: {}", audio.path);
                            break;
                        };

                        timestamp_ms += frame_duration_ms;
                        let frame = AudioFrame {
                            samples: chunk.to_vec(),
                            sample_rate: audio.sample_rate,
                            channels: audio.channels,
                            timestamp_ms,
                        };

                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        self.producer = Some((stop_tx, producer));
        info!("File capture started: {}", self.audio.path);

        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        let Some((stop_tx, producer)) = self.producer.take() else {
            return Ok(());
        };

        let _ = stop_tx.send(());
        if let Err(e) = producer.await {
            error!("File producer task failed: {}", e);
            return Err(RecorderError::Capture(e.to_string()));
        }

        info!("File capture stopped: {}", self.audio.path);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.producer.is_some()
    }

    fn name(&self) -> &str {
        "file"
    }
}
