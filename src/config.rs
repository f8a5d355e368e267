use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::audio::CaptureConfig;
use crate::session::SessionConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub state_poll_interval_ms: u64,
    pub volume_interval_ms: u64,
    pub completion_threshold_secs: f64,
    pub analysis_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_poll_interval_ms: 200,
            volume_interval_ms: 50,
            completion_threshold_secs: 0.1,
            analysis_window: 2048,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_duration_ms: u64,
    pub tone_frequency_hz: f32,
    pub tone_amplitude: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            frame_duration_ms: 100,
            tone_frequency_hz: 440.0,
            tone_amplitude: 0.5,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            state_poll_interval: Duration::from_millis(self.engine.state_poll_interval_ms.max(1)),
            volume_interval: Duration::from_millis(self.engine.volume_interval_ms.max(1)),
            completion_threshold_secs: self.engine.completion_threshold_secs,
            analysis_window: self.engine.analysis_window,
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            ..SessionConfig::default()
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            frame_duration_ms: self.audio.frame_duration_ms.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_widget_timings() {
        let session = Config::default().session_config();
        assert_eq!(session.state_poll_interval, Duration::from_millis(200));
        assert_eq!(session.volume_interval, Duration::from_millis(50));
        assert_eq!(session.completion_threshold_secs, 0.1);
        assert!(session.session_id.starts_with("recording-"));
    }

    #[test]
    fn loads_partial_toml() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("recorder.toml");
        fs::write(
            &path,
            "[engine]\nvolume_interval_ms = 25\n\n[audio]\nsample_rate = 48000\nchannels = 2\n",
        )?;

        let cfg = Config::load(path.to_str().unwrap())?;
        assert_eq!(cfg.engine.volume_interval_ms, 25);
        assert_eq!(cfg.engine.state_poll_interval_ms, 200);

        let capture = cfg.capture_config();
        assert_eq!(capture.sample_rate, 48000);
        assert_eq!(capture.channels, 2);
        assert_eq!(capture.frame_duration_ms, 100);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/nonexistent/recorder").is_err());
    }
}
