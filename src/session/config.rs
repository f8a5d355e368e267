use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a recorder session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier, used in logs and stats
    pub session_id: String,

    /// How often the current state is re-announced to the state observer
    /// Default: 200ms
    pub state_poll_interval: Duration,

    /// How often the volume level is sampled while recording
    /// Default: 50ms
    pub volume_interval: Duration,

    /// Remaining playback below this many seconds counts as fully played
    /// Default: 0.1
    pub completion_threshold_secs: f64,

    /// Samples in the volume analysis window
    pub analysis_window: usize,

    /// Encoder format used until the first captured frame fixes it
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("recording-{}", uuid::Uuid::new_v4()),
            state_poll_interval: Duration::from_millis(200),
            volume_interval: Duration::from_millis(50),
            completion_threshold_secs: 0.1,
            analysis_window: 2048,
            sample_rate: 16000,
            channels: 1,
        }
    }
}
