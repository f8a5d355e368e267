// Tests for capture devices and the encode/decode pipeline
//
// WAV fixtures are written into a temp dir with hound.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use recording_box::audio::{decode_recording, EncoderSink, FileCapture};
use recording_box::{
    AudioFrame, Callbacks, CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureSource,
    ClockOutput, Recorder, RecorderError, RecorderState, SessionConfig,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::time::{sleep, Duration};

fn write_wav(dir: &Path, name: &str, seconds: f64, sample_rate: u32) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec)?;
    let total = (seconds * sample_rate as f64) as usize;
    for i in 0..total {
        let sample = if i % 2 == 0 { 8000i16 } else { -8000i16 };
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(path)
}

#[test]
fn test_audio_frame_duration() {
    let frame = AudioFrame {
        samples: vec![0; 3200],
        sample_rate: 16000,
        channels: 2,
        timestamp_ms: 100,
    };

    assert!((frame.duration_secs() - 0.1).abs() < 1e-9);
}

#[test]
fn test_capture_config_default() {
    let config = CaptureConfig::default();

    assert_eq!(config.sample_rate, 16000, "Default should be 16kHz");
    assert_eq!(config.channels, 1, "Default should be mono");
    assert_eq!(config.frame_duration_ms, 100, "Default frame should be 100ms");
}

#[test]
fn test_microphone_is_unavailable() {
    let result = CaptureDeviceFactory::create(CaptureSource::Microphone, CaptureConfig::default());
    assert!(matches!(result, Err(RecorderError::DeviceUnavailable(_))));
}

#[test]
fn test_missing_file_is_unavailable() {
    let result = CaptureDeviceFactory::create(
        CaptureSource::File(PathBuf::from("/nonexistent/take.wav")),
        CaptureConfig::default(),
    );
    assert!(matches!(result, Err(RecorderError::DeviceUnavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn test_file_capture_paces_frames_until_eof() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "take.wav", 0.5, 16000)?;

    let mut device = FileCapture::open(&path, 100)?;
    assert_eq!(device.audio().samples.len(), 8000);

    let mut frames = device.start().await?;
    assert!(device.is_capturing());

    let mut received = Vec::new();
    while let Some(frame) = frames.recv().await {
        received.push(frame);
    }

    assert_eq!(received.len(), 5);
    assert!(received.iter().all(|f| f.samples.len() == 1600));
    assert_eq!(received[4].timestamp_ms, 500);

    device.stop().await?;
    assert!(!device.is_capturing());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_file_capture_stops_early() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "long.wav", 5.0, 16000)?;

    let mut device = FileCapture::open(&path, 100)?;
    let mut frames = device.start().await?;

    sleep(Duration::from_millis(250)).await;
    device.stop().await?;

    let mut count = 0;
    while frames.recv().await.is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
    Ok(())
}

#[test]
fn test_encoded_take_decodes_to_same_length() -> Result<()> {
    let mut encoder = EncoderSink::new(16000, 1);
    for i in 0..4u64 {
        encoder.write_frame(&AudioFrame {
            samples: vec![16384; 1600],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: (i + 1) * 100,
        });
    }
    assert_eq!(encoder.chunk_count(), 4);

    let buffer = decode_recording(encoder.finish()?)?;
    assert_eq!(buffer.frames(), 6400);
    assert!((buffer.duration_secs() - 0.4).abs() < 1e-9);
    assert!(buffer.samples().iter().all(|s| (*s - 0.5).abs() < 1e-3));
    Ok(())
}

#[test]
fn test_garbage_container_fails_to_decode() {
    let result = decode_recording(b"definitely not a wav file".to_vec());
    assert!(matches!(result, Err(RecorderError::Decode(_))));
}

#[tokio::test(start_paused = true)]
async fn test_recording_from_file_source() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_wav(dir.path(), "take.wav", 0.5, 16000)?;

    let capture = CaptureDeviceFactory::create(CaptureSource::File(path), CaptureConfig::default());
    let recorder = Recorder::spawn(
        SessionConfig::default(),
        capture,
        Box::new(ClockOutput::new()),
        Callbacks::new(),
    );

    recorder.record().await?;
    // The file runs out well before we stop.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(recorder.stop_record().await?, RecorderState::Recorded);
    assert!(recorder.wait_until_settled().await?);

    let stats = recorder.stats().await?;
    assert_eq!(stats.chunks_count, 5);
    assert!((stats.duration_secs - 0.5).abs() < 1e-6);

    recorder.shutdown().await?;
    Ok(())
}
