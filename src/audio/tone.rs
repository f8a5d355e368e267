// Synthetic capture device: a sine tone delivered frame by frame in real time

use std::f32::consts::TAU;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};
use tracing::{error, info};

use super::backend::{AudioFrame, CaptureConfig, CaptureDevice};
use crate::error::{RecorderError, RecorderResult};

/// Sine generator standing in for a microphone
///
/// Emits one frame every `frame_duration_ms`, the first one a full frame
/// period after `start()`.
pub struct ToneCapture {
    config: CaptureConfig,
    frequency_hz: f32,
    amplitude: f32,
    producer: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl ToneCapture {
    pub fn new(config: CaptureConfig, frequency_hz: f32, amplitude: f32) -> Self {
        Self {
            config: CaptureConfig {
                frame_duration_ms: config.frame_duration_ms.max(1),
                ..config
            },
            frequency_hz,
            amplitude: amplitude.clamp(0.0, 1.0),
            producer: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for ToneCapture {
    async fn start(&mut self) -> RecorderResult<mpsc::Receiver<AudioFrame>> {
        if self.producer.is_some() {
            return Err(RecorderError::Capture("Already capturing".to_string()));
        }

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let config = self.config.clone();
        let frequency_hz = self.frequency_hz;
        let amplitude = self.amplitude;

        let producer = tokio::spawn(async move {
            let period = Duration::from_millis(config.frame_duration_ms);
            let mut ticker = interval_at(Instant::now() + period, period);
            let channels = config.channels.max(1) as usize;
            let frames_per_tick = config.samples_per_frame() / channels;
            let step = TAU * frequency_hz / config.sample_rate as f32;
            let mut phase = 0.0f32;
            let mut timestamp_ms = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let mut samples = Vec::with_capacity(frames_per_tick * channels);
                        for _ in 0..frames_per_tick {
                            let value = (phase.sin() * amplitude * i16::MAX as f32) as i16;
                            samples.extend(std::iter::repeat(value).take(channels));
                            phase = (phase + step) % TAU;
                        }

                        timestamp_ms += config.frame_duration_ms;
                        let frame = AudioFrame {
                            samples,
                            sample_rate: config.sample_rate,
                            channels: config.channels,
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

        info!(
            "Tone capture started ({:.0}Hz, {}Hz sample rate, {} channels)",
            self.frequency_hz, self.config.sample_rate, self.config.channels
        );

        Ok(rx)
    }

    async fn stop(&mut self) -> RecorderResult<()> {
        let Some((stop_tx, producer)) = self.producer.take() else {
            return Ok(());
        };

        let _ = stop_tx.send(());
        if let Err(e) = producer.await {
            error!("Tone producer task failed: {}", e);
            return Err(RecorderError::Capture(e.to_string()));
        }

        info!("Tone capture stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.producer.is_some()
    }

    fn name(&self) -> &str {
        "tone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delivers_one_frame_per_period() {
        let mut device = ToneCapture::new(CaptureConfig::default(), 440.0, 0.5);
        let mut rx = device.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        device.stop().await.unwrap();

        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].timestamp_ms, 100);
        assert_eq!(frames[2].timestamp_ms, 300);
        assert!(frames.iter().all(|f| f.samples.len() == 1600));
        assert!(!device.is_capturing());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_frame_duration_is_raised_to_one_ms() {
        let config = CaptureConfig {
            frame_duration_ms: 0,
            ..CaptureConfig::default()
        };
        let mut device = ToneCapture::new(config, 440.0, 0.5);
        let mut rx = device.start().await.unwrap();

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.timestamp_ms, 1);
        assert_eq!(frame.samples.len(), 16);
        device.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let mut device = ToneCapture::new(CaptureConfig::default(), 440.0, 0.5);
        let _rx = device.start().await.unwrap();
        assert!(matches!(device.start().await, Err(RecorderError::Capture(_))));
        device.stop().await.unwrap();
    }
}
